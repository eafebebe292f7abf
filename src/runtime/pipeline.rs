use std::{
    path::{Path, PathBuf},
    sync::Arc,
    thread::JoinHandle,
    time::Duration,
};

use anyhow::Context as _;

use crate::{
    artifact::store::ArtifactStore,
    capture::{renderer::PageRenderer, worker::CaptureWorker},
    collect::collector::Collector,
    config::source::ConfigSource,
    draw::text::TextRenderer,
    foundation::error::DashResult,
    health::monitor::HealthMonitor,
    overlay::processor::OverlayProcessor,
    rotate::rotator::Rotator,
    runtime::{
        clock::Clock,
        stage::{Stage, spawn_stage},
    },
};

/// Capture slots started when none are configured.
pub const DEFAULT_CAPTURE_SLOTS: usize = 4;

#[derive(Clone, Debug, PartialEq, Eq)]
/// Filesystem locations shared by all stages.
pub struct PipelinePaths {
    /// Flat directory holding raw and processed artifacts.
    pub cache_dir: PathBuf,
    /// The canonical current image.
    pub current_image: PathBuf,
    /// The JSON configuration document.
    pub config_file: PathBuf,
}

impl PipelinePaths {
    /// Standard layout below `base`.
    pub fn from_base(base: &Path) -> Self {
        Self {
            cache_dir: base.join("image_cache"),
            current_image: base.join("current_image").join("currentimage.png"),
            config_file: base.join("current_config").join("slides_config.json"),
        }
    }

    /// Create the cache directory and the current image's directory.
    ///
    /// This is the only failure the pipeline treats as fatal.
    pub fn ensure_dirs(&self) -> DashResult<()> {
        self.store().ensure_dir()?;
        if let Some(parent) = self.current_image.parent() {
            std::fs::create_dir_all(parent)
                .with_context(|| format!("create current image directory '{}'", parent.display()))?;
        }
        Ok(())
    }

    pub fn store(&self) -> ArtifactStore {
        ArtifactStore::new(&self.cache_dir)
    }

    pub fn config(&self) -> ConfigSource {
        ConfigSource::new(&self.config_file)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
/// Fixed stage cadences and thresholds.
pub struct Timings {
    pub overlay_interval: Duration,
    pub capture_backoff: Duration,
    pub rotator_backoff: Duration,
    pub collector_startup_delay: Duration,
    pub collector_interval: Duration,
    pub retention: Duration,
    pub health_interval: Duration,
    pub overlay_stall: Duration,
    pub collector_stall: Duration,
}

impl Default for Timings {
    fn default() -> Self {
        Self {
            overlay_interval: crate::overlay::processor::DEFAULT_SWEEP_INTERVAL,
            capture_backoff: crate::capture::worker::DEFAULT_CAPTURE_BACKOFF,
            rotator_backoff: crate::rotate::rotator::DEFAULT_ROTATOR_BACKOFF,
            collector_startup_delay: crate::collect::collector::DEFAULT_COLLECTOR_STARTUP_DELAY,
            collector_interval: crate::collect::collector::DEFAULT_COLLECTOR_INTERVAL,
            retention: crate::collect::collector::DEFAULT_RETENTION,
            health_interval: crate::health::monitor::DEFAULT_HEALTH_INTERVAL,
            overlay_stall: crate::health::monitor::DEFAULT_OVERLAY_STALL,
            collector_stall: crate::health::monitor::DEFAULT_COLLECTOR_STALL,
        }
    }
}

/// Builds a fresh renderer for a capture slot.
pub type RendererFactory = Arc<dyn Fn(usize) -> Box<dyn PageRenderer> + Send + Sync>;

/// All pipeline stages wired to one set of paths.
pub struct Pipeline {
    paths: PipelinePaths,
    timings: Timings,
    capture_slots: usize,
    renderers: RendererFactory,
    text: TextRenderer,
}

impl Pipeline {
    pub fn new(paths: PipelinePaths, renderers: RendererFactory, text: TextRenderer) -> Self {
        Self {
            paths,
            timings: Timings::default(),
            capture_slots: DEFAULT_CAPTURE_SLOTS,
            renderers,
            text,
        }
    }

    pub fn with_timings(mut self, timings: Timings) -> Self {
        self.timings = timings;
        self
    }

    pub fn with_capture_slots(mut self, slots: usize) -> Self {
        self.capture_slots = slots;
        self
    }

    pub fn paths(&self) -> &PipelinePaths {
        &self.paths
    }

    pub fn capture_worker(&self, slot: usize) -> CaptureWorker {
        CaptureWorker::new(
            slot,
            self.paths.store(),
            self.paths.config(),
            (self.renderers)(slot),
        )
        .with_backoff(self.timings.capture_backoff)
    }

    pub fn overlay(&self) -> OverlayProcessor {
        OverlayProcessor::new(self.paths.store(), self.paths.config(), self.text.clone())
            .with_interval(self.timings.overlay_interval)
    }

    pub fn rotator(&self) -> Rotator {
        Rotator::new(
            self.paths.store(),
            self.paths.config(),
            &self.paths.current_image,
        )
        .with_backoff(self.timings.rotator_backoff)
    }

    pub fn collector(&self) -> Collector {
        Collector::new(
            self.paths.store(),
            self.paths.config(),
            &self.paths.current_image,
        )
        .with_retention(self.timings.retention)
        .with_schedule(
            self.timings.collector_startup_delay,
            self.timings.collector_interval,
        )
    }

    pub fn health(&self) -> HealthMonitor {
        HealthMonitor::new(
            self.paths.store(),
            self.paths.config(),
            &self.paths.current_image,
        )
        .with_interval(self.timings.health_interval)
        .with_thresholds(self.timings.overlay_stall, self.timings.collector_stall)
        .with_retention(self.timings.retention)
    }

    /// Every stage: capture slots first, then overlay, rotator, collector and health.
    pub fn stages(&self) -> Vec<Box<dyn Stage>> {
        let mut stages: Vec<Box<dyn Stage>> = (0..self.capture_slots)
            .map(|slot| Box::new(self.capture_worker(slot)) as Box<dyn Stage>)
            .collect();
        stages.push(Box::new(self.overlay()));
        stages.push(Box::new(self.rotator()));
        stages.push(Box::new(self.collector()));
        stages.push(Box::new(self.health()));
        stages
    }

    /// Create the directories and start every stage on its own thread.
    pub fn spawn(&self, clock: Arc<dyn Clock>) -> DashResult<Vec<JoinHandle<()>>> {
        self.paths.ensure_dirs()?;
        tracing::info!(
            cache = %self.paths.cache_dir.display(),
            current = %self.paths.current_image.display(),
            config = %self.paths.config_file.display(),
            capture_slots = self.capture_slots,
            "starting pipeline"
        );
        self.stages()
            .into_iter()
            .map(|stage| spawn_stage(stage, clock.clone()))
            .collect()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/runtime/pipeline.rs"]
mod tests;
