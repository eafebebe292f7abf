//! Time/date stamping of raw artifacts.

pub mod processor;
pub mod stamp;
