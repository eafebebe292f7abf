use std::time::{Duration, SystemTime};

use crate::{
    artifact::{
        naming::ArtifactName,
        store::{ArtifactEntry, ArtifactStore, load_image},
    },
    config::{model::PipelineConfig, source::ConfigSource},
    draw::{composite::draw_box, text::TextRenderer, transform},
    foundation::error::{DashError, DashResult},
    overlay::stamp::{layout_stamp, stamp_text},
    runtime::stage::Stage,
};

/// Period between overlay sweeps.
pub const DEFAULT_SWEEP_INTERVAL: Duration = Duration::from_secs(30);

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// Counters for one sweep.
pub struct SweepStats {
    /// Processed artifacts written.
    pub processed: usize,
    /// Pending artifacts that could not be processed.
    pub failed: usize,
}

/// Turns pending raw artifacts into stamped, processed artifacts.
pub struct OverlayProcessor {
    store: ArtifactStore,
    config: ConfigSource,
    text: TextRenderer,
    interval: Duration,
}

impl OverlayProcessor {
    pub fn new(store: ArtifactStore, config: ConfigSource, text: TextRenderer) -> Self {
        Self {
            store,
            config,
            text,
            interval: DEFAULT_SWEEP_INTERVAL,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Process every pending artifact once. Failures are counted, never propagated.
    pub fn sweep(&self, now: SystemTime) -> SweepStats {
        let mut stats = SweepStats::default();
        let pending = match self.store.pending() {
            Ok(p) => p,
            Err(err) => {
                tracing::error!(error = %err, "cannot list pending artifacts");
                return stats;
            }
        };
        if pending.is_empty() {
            tracing::debug!("nothing to overlay");
            return stats;
        }

        let cfg = self.config.load();
        for entry in &pending {
            match self.process(&cfg, entry, now) {
                Ok(name) => {
                    tracing::info!(artifact = %name, "overlay written");
                    stats.processed += 1;
                }
                Err(err) => {
                    tracing::warn!(artifact = %entry.file_name, error = %err, "overlay failed, skipping");
                    stats.failed += 1;
                }
            }
        }
        stats
    }

    fn process(
        &self,
        cfg: &PipelineConfig,
        entry: &ArtifactEntry,
        now: SystemTime,
    ) -> DashResult<ArtifactName> {
        let raw = entry
            .name
            .as_ref()
            .ok_or_else(|| DashError::validation("not an artifact"))?;
        let mut img = load_image(&entry.path)?;

        let transforms = cfg.global.transforms();
        if transforms.invert {
            transform::invert(&mut img);
        }

        self.stamp(cfg, raw, &mut img, now)?;

        transform::apply_tonal(&mut img, transforms);
        self.store.write_processed(raw, now, &img)
    }

    fn stamp(
        &self,
        cfg: &PipelineConfig,
        raw: &ArtifactName,
        img: &mut image::RgbaImage,
        now: SystemTime,
    ) -> DashResult<()> {
        let overlay = &cfg.overlay;
        // A slide missing from the current config gets no stamp.
        let Some(slide) = cfg.slide(raw.slide()) else {
            tracing::debug!(slide = raw.slide(), "slide not in config, no stamp");
            return Ok(());
        };
        let show_time = slide.show_time.or(overlay.show_time).unwrap_or(false);
        let show_date = slide.show_date.or(overlay.show_date).unwrap_or(false);
        let Some(text) = stamp_text(now, cfg.global.timezone(), show_time, show_date) else {
            return Ok(());
        };

        let position = slide.position.clone().unwrap_or_else(|| overlay.position());
        let font = self.text.load_font(
            overlay.font_size().pixels_for(img.width()),
            overlay.font_family.as_deref(),
        );
        let extent = self.text.measure_text(&text, &font);
        let Some(layout) = layout_stamp(
            img.width(),
            img.height(),
            extent,
            &position,
            overlay.align(),
            cfg.global.transforms().invert,
        ) else {
            return Ok(());
        };

        draw_box(img, layout.box_rect, layout.box_color);
        self.text
            .draw_text(img, layout.text_origin, &text, &font, layout.text_color)
    }
}

impl Stage for OverlayProcessor {
    fn name(&self) -> &str {
        "overlay"
    }

    fn tick(&mut self, now: SystemTime) -> Duration {
        let stats = self.sweep(now);
        if stats.processed > 0 || stats.failed > 0 {
            tracing::info!(processed = stats.processed, failed = stats.failed, "overlay sweep done");
        }
        self.interval
    }
}
