use std::{
    path::PathBuf,
    time::{Duration, SystemTime},
};

use crate::{
    artifact::store::{ArtifactStore, publish_copy},
    config::source::ConfigSource,
    runtime::stage::Stage,
};

/// Wait used when no slide is enabled.
pub const DEFAULT_ROTATOR_BACKOFF: Duration = Duration::from_secs(60);

#[derive(Clone, Debug, PartialEq, Eq)]
/// What one rotation cycle did.
pub enum Rotation {
    /// `artifact` was copied over the current image.
    Published { slide: String, artifact: String },
    /// The slide has no processed artifact yet; the current image is unchanged.
    NoArtifact { slide: String },
    /// Publishing failed; the current image is unchanged.
    Failed { slide: String },
    /// No slide is enabled.
    NoSlides,
}

/// Round-robins over the enabled slides and publishes each one's newest processed artifact.
///
/// The cursor lives only in memory, so a restart begins again at the first enabled slide.
pub struct Rotator {
    store: ArtifactStore,
    config: ConfigSource,
    current_path: PathBuf,
    cursor: usize,
    backoff: Duration,
}

impl Rotator {
    pub fn new(store: ArtifactStore, config: ConfigSource, current_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            config,
            current_path: current_path.into(),
            cursor: 0,
            backoff: DEFAULT_ROTATOR_BACKOFF,
        }
    }

    pub fn with_backoff(mut self, backoff: Duration) -> Self {
        self.backoff = backoff;
        self
    }

    /// Index of the slide whose turn is next, before wrapping to the current list.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Run one cycle and return its outcome plus the wait before the next one.
    pub fn rotate_once(&mut self, now: SystemTime) -> (Rotation, Duration) {
        let cfg = self.config.load();
        let names = cfg.enabled_slide_names();
        if names.is_empty() {
            tracing::debug!("no enabled slides");
            return (Rotation::NoSlides, self.backoff);
        }
        let wait = cfg.global.slide_frequency();

        // Slides may have been removed since the last cycle.
        let idx = self.cursor % names.len();
        let slide = names[idx].clone();
        self.cursor = (idx + 1) % names.len();

        let newest = match self.store.newest_processed(&slide) {
            Ok(n) => n,
            Err(err) => {
                tracing::error!(slide = %slide, error = %err, "cannot scan cache");
                return (Rotation::Failed { slide }, wait);
            }
        };
        let Some(entry) = newest else {
            tracing::debug!(slide = %slide, "no processed artifact yet");
            return (Rotation::NoArtifact { slide }, wait);
        };

        match publish_copy(&entry.path, &self.current_path, now) {
            Ok(()) => {
                tracing::info!(slide = %slide, artifact = %entry.file_name, "published current image");
                (
                    Rotation::Published {
                        slide,
                        artifact: entry.file_name,
                    },
                    wait,
                )
            }
            Err(err) => {
                tracing::error!(slide = %slide, artifact = %entry.file_name, error = %err, "publish failed");
                (Rotation::Failed { slide }, wait)
            }
        }
    }
}

impl Stage for Rotator {
    fn name(&self) -> &str {
        "rotator"
    }

    fn tick(&mut self, now: SystemTime) -> Duration {
        self.rotate_once(now).1
    }
}
