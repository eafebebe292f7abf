//! Raster primitives used by capture and overlay.

pub mod composite;
pub mod text;
pub mod transform;
