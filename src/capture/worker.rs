use std::time::{Duration, SystemTime};

use crate::{
    artifact::{naming::ArtifactName, store::ArtifactStore},
    capture::renderer::PageRenderer,
    config::{
        model::{PipelineConfig, SlideSpec},
        source::ConfigSource,
    },
    draw::transform,
    foundation::error::DashResult,
    runtime::stage::Stage,
};

/// Wait used when the slot has no enabled slide.
pub const DEFAULT_CAPTURE_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Clone, Debug, PartialEq, Eq)]
/// What one capture cycle did.
pub enum CaptureOutcome {
    /// A new raw artifact was written.
    Captured {
        artifact: ArtifactName,
        attempts: u32,
    },
    /// Every attempt failed; the cycle was given up.
    Failed { slide: String, attempts: u32 },
    /// The slide has no URL configured.
    NoUrl { slide: String },
    /// The slot index is beyond the configured slides.
    SlotEmpty,
    /// The slot's slide is disabled.
    Disabled { slide: String },
}

/// Captures the slide at one fixed config slot on that slide's own interval.
///
/// The slot is re-resolved against a fresh config every cycle, so slides may be added,
/// removed or reordered while the worker runs.
pub struct CaptureWorker {
    name: String,
    slot: usize,
    store: ArtifactStore,
    config: ConfigSource,
    renderer: Box<dyn PageRenderer>,
    backoff: Duration,
}

impl CaptureWorker {
    pub fn new(
        slot: usize,
        store: ArtifactStore,
        config: ConfigSource,
        renderer: Box<dyn PageRenderer>,
    ) -> Self {
        Self {
            name: format!("capture-{slot}"),
            slot,
            store,
            config,
            renderer,
            backoff: DEFAULT_CAPTURE_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    pub fn slot(&self) -> usize {
        self.slot
    }

    /// Run one cycle and return its outcome plus the wait before the next one.
    pub fn capture_once(&mut self, now: SystemTime) -> (CaptureOutcome, Duration) {
        let cfg = self.config.load();
        let Some(slide) = cfg.slides.get(self.slot) else {
            tracing::debug!(slot = self.slot, "no slide at this slot");
            return (CaptureOutcome::SlotEmpty, self.backoff);
        };
        if !slide.is_enabled() {
            tracing::debug!(slot = self.slot, slide = %slide.name, "slide disabled");
            return (
                CaptureOutcome::Disabled {
                    slide: slide.name.clone(),
                },
                self.backoff,
            );
        }

        let interval = slide.interval(&cfg.global);
        let url = slide.url.trim();
        if url.is_empty() {
            tracing::warn!(slide = %slide.name, "slide has no URL, skipping");
            return (
                CaptureOutcome::NoUrl {
                    slide: slide.name.clone(),
                },
                interval,
            );
        }

        let max_attempts = cfg.global.max_retries().saturating_add(1);
        for attempt in 1..=max_attempts {
            match self.attempt(&cfg, slide, url, now) {
                Ok(artifact) => {
                    tracing::info!(slide = %slide.name, artifact = %artifact, attempt, "captured slide");
                    return (
                        CaptureOutcome::Captured {
                            artifact,
                            attempts: attempt,
                        },
                        interval,
                    );
                }
                Err(err) if attempt < max_attempts => {
                    tracing::warn!(slide = %slide.name, attempt, error = %err, "capture failed, retrying");
                }
                Err(err) => {
                    tracing::error!(slide = %slide.name, attempt, error = %err, "capture failed, giving up this cycle");
                }
            }
        }

        (
            CaptureOutcome::Failed {
                slide: slide.name.clone(),
                attempts: max_attempts,
            },
            interval,
        )
    }

    fn attempt(
        &mut self,
        cfg: &PipelineConfig,
        slide: &SlideSpec,
        url: &str,
        now: SystemTime,
    ) -> DashResult<ArtifactName> {
        let res = slide.resolution(&cfg.global);
        let mut img = self.renderer.render(url, res.width, res.height)?;

        let mut transforms = cfg.global.transforms();
        transforms.invert |= slide.invert.unwrap_or(false);
        transform::apply(&mut img, transforms);

        self.store.write_raw(&slide.name, now, &img)
    }
}

impl Stage for CaptureWorker {
    fn name(&self) -> &str {
        &self.name
    }

    fn tick(&mut self, now: SystemTime) -> Duration {
        self.capture_once(now).1
    }
}
