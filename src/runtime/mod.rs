//! Stage scheduling.

pub mod clock;
pub mod pipeline;
pub mod stage;
