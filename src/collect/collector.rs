use std::{
    path::PathBuf,
    time::{Duration, SystemTime},
};

use crate::{artifact::store::ArtifactStore, config::source::ConfigSource, runtime::stage::Stage};

/// Wait before the first sweep after start.
pub const DEFAULT_COLLECTOR_STARTUP_DELAY: Duration = Duration::from_secs(30);
/// Period between sweeps.
pub const DEFAULT_COLLECTOR_INTERVAL: Duration = Duration::from_secs(5 * 60);
/// Files older than this are deleted unless `cacheDuration` says otherwise.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(30 * 60);

#[derive(Clone, Debug, Default, PartialEq, Eq)]
/// Result of one collector sweep.
pub struct CollectReport {
    /// File names removed.
    pub deleted: Vec<String>,
    /// File names that were due but could not be removed.
    pub failed: Vec<String>,
}

/// Deletes cache files older than the retention threshold.
pub struct Collector {
    store: ArtifactStore,
    config: ConfigSource,
    current_path: PathBuf,
    retention: Duration,
    startup_delay: Duration,
    interval: Duration,
}

impl Collector {
    pub fn new(store: ArtifactStore, config: ConfigSource, current_path: impl Into<PathBuf>) -> Self {
        Self {
            store,
            config,
            current_path: current_path.into(),
            retention: DEFAULT_RETENTION,
            startup_delay: DEFAULT_COLLECTOR_STARTUP_DELAY,
            interval: DEFAULT_COLLECTOR_INTERVAL,
        }
    }

    /// Retention used when the config has no `cacheDuration`.
    pub fn with_retention(mut self, retention: Duration) -> Self {
        self.retention = retention;
        self
    }

    pub fn with_schedule(mut self, startup_delay: Duration, interval: Duration) -> Self {
        self.startup_delay = startup_delay;
        self.interval = interval;
        self
    }

    /// Effective retention: `cacheDuration` from the config, else the configured default.
    pub fn retention(&self) -> Duration {
        self.config
            .load()
            .global
            .cache_duration()
            .unwrap_or(self.retention)
    }

    /// Delete every file in the cache whose age exceeds the retention.
    pub fn sweep(&self, now: SystemTime) -> CollectReport {
        let retention = self.retention();
        let mut report = CollectReport::default();

        let entries = match self.store.entries() {
            Ok(e) => e,
            Err(err) => {
                tracing::error!(error = %err, "cannot list cache directory");
                return report;
            }
        };

        for entry in entries {
            if entry.path == self.current_path {
                continue;
            }
            let age = entry.age(now);
            if age <= retention {
                continue;
            }
            match std::fs::remove_file(&entry.path) {
                Ok(()) => {
                    tracing::info!(file = %entry.file_name, age_s = age.as_secs(), "deleted stale cache file");
                    report.deleted.push(entry.file_name);
                }
                Err(err) if err.kind() == std::io::ErrorKind::NotFound => {
                    tracing::debug!(file = %entry.file_name, "already gone");
                }
                Err(err) => {
                    tracing::error!(file = %entry.file_name, error = %err, "failed to delete cache file");
                    report.failed.push(entry.file_name);
                }
            }
        }

        if report.deleted.is_empty() && report.failed.is_empty() {
            tracing::debug!(retention_s = retention.as_secs(), "no stale cache files");
        }
        report
    }
}

impl Stage for Collector {
    fn name(&self) -> &str {
        "collector"
    }

    fn startup_delay(&self) -> Duration {
        self.startup_delay
    }

    fn tick(&mut self, now: SystemTime) -> Duration {
        self.sweep(now);
        self.interval
    }
}
