//! The shared cache directory and its file naming protocol.

/// Artifact file names.
pub mod naming;
/// Listing and atomic writes.
pub mod store;
