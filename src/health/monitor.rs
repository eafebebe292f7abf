//! Liveness watchdog.
//!
//! No stage reports its own health. Each one is judged from the files it produces: capture by
//! its newest raw artifact, overlay by the pending backlog, the rotator by the current image
//! and the collector by files it should have removed. Warnings are advisory only and nothing
//! here ever writes to the pipeline directories.

use std::{
    fmt,
    path::PathBuf,
    time::{Duration, SystemTime},
};

use crate::{
    artifact::store::ArtifactStore,
    collect::collector::DEFAULT_RETENTION,
    config::source::ConfigSource,
    runtime::stage::Stage,
};

/// Period between health checks.
pub const DEFAULT_HEALTH_INTERVAL: Duration = Duration::from_secs(30);
/// Age of the oldest pending artifact after which overlay counts as stalled.
pub const DEFAULT_OVERLAY_STALL: Duration = Duration::from_secs(300);
/// Minimum age of leftover cache files that flags the collector.
pub const DEFAULT_COLLECTOR_STALL: Duration = Duration::from_secs(3_600);

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HealthWarning {
    /// The cache holds no raw artifact at all.
    NoCapturedImages,
    /// The newest raw artifact is older than the capture interval.
    CaptureStalled { age: Duration, threshold: Duration },
    /// More than one artifact waits for overlay and the oldest has waited too long.
    OverlayStalled { pending: usize, oldest_age: Duration },
    /// The current image does not exist.
    NoCurrentImage,
    /// The current image has not been replaced within one rotation period.
    RotationStalled { age: Duration, threshold: Duration },
    /// Cache files exist well past the retention threshold.
    CollectorStalled { files: usize, threshold: Duration },
}

impl fmt::Display for HealthWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NoCapturedImages => write!(f, "no captured images in cache, capture may not be running"),
            Self::CaptureStalled { age, threshold } => write!(
                f,
                "capture may have stalled: newest raw artifact is {}s old (expected within {}s)",
                age.as_secs(),
                threshold.as_secs()
            ),
            Self::OverlayStalled { pending, oldest_age } => write!(
                f,
                "overlay may not be running: {pending} pending artifacts, oldest {}s old",
                oldest_age.as_secs()
            ),
            Self::NoCurrentImage => write!(f, "no current image has been published"),
            Self::RotationStalled { age, threshold } => write!(
                f,
                "rotation may have stalled: current image is {}s old (period {}s)",
                age.as_secs(),
                threshold.as_secs()
            ),
            Self::CollectorStalled { files, threshold } => write!(
                f,
                "collector may not be running: {files} files older than {}s",
                threshold.as_secs()
            ),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
/// Outcome of one health check.
pub struct HealthReport {
    pub checked_at: SystemTime,
    pub warnings: Vec<HealthWarning>,
}

impl HealthReport {
    pub fn is_healthy(&self) -> bool {
        self.warnings.is_empty()
    }
}

pub struct HealthMonitor {
    store: ArtifactStore,
    config: ConfigSource,
    current_path: PathBuf,
    interval: Duration,
    overlay_stall: Duration,
    collector_stall: Duration,
    retention: Duration,
}

impl HealthMonitor {
    pub fn new(store: ArtifactStore, config: ConfigSource, current_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            config,
            current_path: current_path.into(),
            interval: DEFAULT_HEALTH_INTERVAL,
            overlay_stall: DEFAULT_OVERLAY_STALL,
            collector_stall: DEFAULT_COLLECTOR_STALL,
            retention: DEFAULT_RETENTION,
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_thresholds(mut self, overlay_stall: Duration, collector_stall: Duration) -> Self {
        self.overlay_stall = overlay_stall;
        self.collector_stall = collector_stall;
        self
    }

    /// Collector retention used when the config has no `cacheDuration`.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    /// Inspect the pipeline directories at `now`.
    pub fn check(&self, now: SystemTime) -> HealthReport {
        let cfg = self.config.load();
        let mut warnings = Vec::new();

        let entries = match self.store.entries() {
            Ok(e) => e,
            Err(err) => {
                tracing::warn!(error = %err, "cannot list cache directory");
                Vec::new()
            }
        };

        // Capture: a slide with a longer own interval must not trip the default threshold.
        let capture_threshold = cfg
            .slides
            .iter()
            .filter(|s| s.is_enabled())
            .map(|s| s.interval(&cfg.global))
            .min()
            .map_or(cfg.global.default_interval(), |shortest| {
                shortest.max(cfg.global.default_interval())
            });
        let newest_raw = entries
            .iter()
            .filter(|e| e.name.as_ref().is_some_and(|n| !n.is_processed()))
            .map(|e| e.age(now))
            .min();
        match newest_raw {
            None => warnings.push(HealthWarning::NoCapturedImages),
            Some(age) if age > capture_threshold => warnings.push(HealthWarning::CaptureStalled {
                age,
                threshold: capture_threshold,
            }),
            Some(_) => {}
        }

        // Overlay.
        match self.store.pending() {
            Ok(pending) => {
                let oldest = pending.iter().map(|e| e.age(now)).max();
                if let Some(oldest_age) = oldest
                    && pending.len() > 1
                    && oldest_age > self.overlay_stall
                {
                    warnings.push(HealthWarning::OverlayStalled {
                        pending: pending.len(),
                        oldest_age,
                    });
                }
            }
            Err(err) => tracing::warn!(error = %err, "cannot list pending artifacts"),
        }

        // Rotator.
        let rotation_threshold = cfg.global.slide_frequency();
        match std::fs::metadata(&self.current_path).and_then(|m| m.modified()) {
            Ok(modified) => {
                let age = now.duration_since(modified).unwrap_or_default();
                if age > rotation_threshold {
                    warnings.push(HealthWarning::RotationStalled {
                        age,
                        threshold: rotation_threshold,
                    });
                }
            }
            Err(_) => warnings.push(HealthWarning::NoCurrentImage),
        }

        // Collector: give it two full retention periods before complaining.
        let retention = cfg.global.cache_duration().unwrap_or(self.retention);
        let collector_threshold = self.collector_stall.max(retention.saturating_mul(2));
        let leftovers = entries
            .iter()
            .filter(|e| e.age(now) > collector_threshold)
            .count();
        if leftovers > 0 {
            warnings.push(HealthWarning::CollectorStalled {
                files: leftovers,
                threshold: collector_threshold,
            });
        }

        HealthReport {
            checked_at: now,
            warnings,
        }
    }
}

impl Stage for HealthMonitor {
    fn name(&self) -> &str {
        "health"
    }

    fn tick(&mut self, now: SystemTime) -> Duration {
        let report = self.check(now);
        if report.is_healthy() {
            tracing::debug!("pipeline ok");
        }
        for warning in &report.warnings {
            tracing::warn!(%warning, "health check");
        }
        self.interval
    }
}
