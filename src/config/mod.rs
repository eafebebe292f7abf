//! Configuration document model and loading.

/// Typed view of the JSON configuration document.
pub mod model;
/// File-backed config snapshots.
pub mod source;
