//! Hot-deployment configuration.
//!
//! Describes the two directories a deployment node watches: the runtime
//! directory holding platform artifacts and the application directory
//! holding user artifacts.

use std::path::{Path, PathBuf};
use std::time::Duration;

use hotdeploy_directory_watcher::{PollingInterval, WatchedDirectory};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::ConfigError;

/// Default polling period of monitored directories.
pub const DEFAULT_MONITORING_PERIOD: Duration = Duration::from_millis(2000);

/// Configuration of the watched directories.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HotDeployConfig {
    /// Directory of runtime artifacts.
    #[serde(rename = "runtime")]
    pub runtime_dir: Option<PathBuf>,

    /// Directory of application artifacts.
    #[serde(rename = "application")]
    pub application_dir: Option<PathBuf>,

    /// Whether the runtime directory is polled after startup.
    #[serde(default)]
    pub monitor_runtime: bool,

    /// Whether the application directory is polled after startup.
    #[serde(default = "default_true")]
    pub monitor_application: bool,

    /// Polling period used for monitored directories.
    #[serde(default = "default_period")]
    pub monitoring_period: PollingInterval,
}

impl HotDeployConfig {
    /// Create a configuration with default monitoring settings.
    pub fn new(runtime_dir: impl Into<PathBuf>, application_dir: impl Into<PathBuf>) -> Self {
        Self {
            runtime_dir: Some(runtime_dir.into()),
            application_dir: Some(application_dir.into()),
            monitor_runtime: false,
            monitor_application: true,
            monitoring_period: default_period(),
        }
    }

    /// Enable or disable polling of the runtime directory.
    pub fn with_runtime_monitoring(mut self, enabled: bool) -> Self {
        self.monitor_runtime = enabled;
        self
    }

    /// Enable or disable polling of the application directory.
    pub fn with_application_monitoring(mut self, enabled: bool) -> Self {
        self.monitor_application = enabled;
        self
    }

    /// Set the polling period.
    pub fn with_period(mut self, period: PollingInterval) -> Self {
        self.monitoring_period = period;
        self
    }

    /// Parse and validate a TOML document.
    pub fn from_toml_str(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load a TOML file. Relative directories are resolved against the
    /// file's own directory.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::from_toml_str(&content)?;

        if let Some(base) = path.parent() {
            config.runtime_dir = config.runtime_dir.map(|d| base.join(d));
            config.application_dir = config.application_dir.map(|d| base.join(d));
        }
        debug!("Loaded hot-deployment configuration from {}", path.display());
        Ok(config)
    }

    /// Check that both directories are set.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.runtime_dir.is_none() {
            return Err(ConfigError::MissingDirectory("runtime"));
        }
        if self.application_dir.is_none() {
            return Err(ConfigError::MissingDirectory("application"));
        }
        Ok(())
    }

    /// The directories to monitor, runtime first.
    ///
    /// Unmonitored directories are still listed, with polling disabled, so
    /// their content is deployed at startup.
    pub fn watched_directories(&self) -> Vec<WatchedDirectory> {
        let polling_for = |enabled: bool| {
            if enabled {
                self.monitoring_period
            } else {
                PollingInterval::Disabled
            }
        };

        [
            (&self.runtime_dir, self.monitor_runtime),
            (&self.application_dir, self.monitor_application),
        ]
        .into_iter()
        .filter_map(|(dir, enabled)| {
            dir.as_ref()
                .map(|d| WatchedDirectory::new(d, polling_for(enabled)))
        })
        .collect()
    }
}

fn default_true() -> bool {
    true
}

fn default_period() -> PollingInterval {
    PollingInterval::Every(DEFAULT_MONITORING_PERIOD)
}
