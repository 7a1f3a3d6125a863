use crate::error::{MqError, Result};
use crate::queue::spool::DEFAULT_POLL_INTERVAL;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

const CONFIG_FILENAME: &str = "config.json";

/// Settings for the spool queue backend, stored in `<config dir>/config.json`.
#[derive(Debug, Clone, Deserialize, PartialEq, Eq)]
pub struct MqConfig {
    /// Root of the spool directory tree. Falls back to the platform data directory.
    #[serde(default)]
    pub spool_dir: Option<PathBuf>,

    /// How often an empty queue is re-checked while waiting for a message.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

fn default_poll_interval_ms() -> u64 {
    DEFAULT_POLL_INTERVAL.as_millis() as u64
}

impl Default for MqConfig {
    fn default() -> Self {
        Self {
            spool_dir: None,
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl MqConfig {
    /// Load config from the given directory, or return defaults if not found
    pub fn load<P: AsRef<Path>>(config_dir: P) -> Result<Self> {
        let config_path = config_dir.as_ref().join(CONFIG_FILENAME);

        if !config_path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(&config_path).map_err(MqError::Io)?;
        let config: MqConfig = serde_json::from_str(&content).map_err(|e| {
            MqError::Config(format!("{}: {}", config_path.display(), e))
        })?;
        Ok(config)
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }

    /// Spool root: `override_dir` if given, else the configured one, else `default_dir`.
    pub fn spool_root(&self, override_dir: Option<PathBuf>, default_dir: &Path) -> PathBuf {
        override_dir
            .or_else(|| self.spool_dir.clone())
            .unwrap_or_else(|| default_dir.to_path_buf())
    }
}
