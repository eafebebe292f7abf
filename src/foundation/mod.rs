/// Crate-wide error type.
pub mod error;
