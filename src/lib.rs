//! kindledash turns a list of web pages into a rotating slideshow image.
//!
//! Independent stages cooperate only through a shared cache directory:
//!
//! - capture workers render each slide on its own interval into raw artifacts
//! - the overlay processor stamps time/date onto raw artifacts and writes processed ones
//! - the rotator publishes the newest processed artifact of each slide in turn as the current image
//! - the collector deletes expired artifacts
//! - the health monitor infers liveness of all of the above from file ages
#![forbid(unsafe_code)]

mod artifact;
mod capture;
mod collect;
mod config;
mod draw;
mod foundation;
mod health;
mod overlay;
mod rotate;
mod runtime;

pub use crate::artifact::naming::{ArtifactKind, ArtifactName, PROCESSED_PREFIX, artifact_key};
pub use crate::artifact::store::{ArtifactEntry, ArtifactStore, publish_copy, write_atomic};
pub use crate::capture::renderer::{ChromiumRenderer, DEFAULT_BROWSER, PageRenderer};
pub use crate::capture::worker::{CaptureOutcome, CaptureWorker};
pub use crate::collect::collector::{CollectReport, Collector};
pub use crate::config::model::{
    Align, FontSize, GlobalConfig, GlobalTransforms, OverlayConfig, PipelineConfig, Position,
    Resolution, SlideSpec, StampZone,
};
pub use crate::config::source::ConfigSource;
pub use crate::draw::composite::{PixelRect, draw_box};
pub use crate::draw::text::{Font, TextExtent, TextRenderer};
pub use crate::draw::transform::{boost_contrast, invert, to_black_white, to_grayscale};
pub use crate::foundation::error::{DashError, DashResult};
pub use crate::health::monitor::{HealthMonitor, HealthReport, HealthWarning};
pub use crate::overlay::processor::{OverlayProcessor, SweepStats};
pub use crate::rotate::rotator::{Rotation, Rotator};
pub use crate::runtime::clock::{Clock, SystemClock};
pub use crate::runtime::pipeline::{
    DEFAULT_CAPTURE_SLOTS, Pipeline, PipelinePaths, RendererFactory, Timings,
};
pub use crate::runtime::stage::{Stage, run_stage, spawn_stage};
