//! Page capture.

/// Page-to-raster collaborators.
pub mod renderer;
/// Per-slot capture loop.
pub mod worker;
