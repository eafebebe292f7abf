use std::path::{Path, PathBuf};

use anyhow::Context as _;

use crate::{config::model::PipelineConfig, foundation::error::DashResult};

/// Location of the configuration document; every stage reloads it on its own schedule.
#[derive(Clone, Debug)]
pub struct ConfigSource {
    path: PathBuf,
}

impl ConfigSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Read and parse the document, reporting any failure.
    pub fn try_load(&self) -> DashResult<PipelineConfig> {
        let text = std::fs::read_to_string(&self.path)
            .with_context(|| format!("read config '{}'", self.path.display()))?;
        PipelineConfig::from_json_str(&text)
    }

    /// Take a fresh snapshot. A missing or unparseable file yields an empty config.
    pub fn load(&self) -> PipelineConfig {
        if !self.path.exists() {
            tracing::debug!(path = %self.path.display(), "config file missing, using empty config");
            return PipelineConfig::default();
        }
        match self.try_load() {
            Ok(cfg) => cfg,
            Err(err) => {
                tracing::warn!(path = %self.path.display(), error = %err, "config unreadable, using empty config");
                PipelineConfig::default()
            }
        }
    }
}
