//! Configuration types for watched directories.

use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use path_absolutize::Absolutize;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::error::{Result, WatcherError};

/// How often a watched directory is rescanned.
///
/// In configuration files the period is an integer number of milliseconds,
/// with `-1` meaning "no polling".
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "i64", into = "i64")]
pub enum PollingInterval {
    /// No background polling. Only the initial inventory is taken.
    #[default]
    Disabled,

    /// Rescan at the given period.
    Every(Duration),
}

impl PollingInterval {
    /// Integer value standing for [`PollingInterval::Disabled`].
    pub const DISABLED: i64 = -1;

    /// Poll every `millis` milliseconds. Zero disables polling.
    pub fn from_millis(millis: u64) -> Self {
        if millis == 0 {
            Self::Disabled
        } else {
            Self::Every(Duration::from_millis(millis))
        }
    }

    /// The polling period, if polling is enabled.
    pub fn period(self) -> Option<Duration> {
        match self {
            Self::Disabled => None,
            Self::Every(period) => Some(period),
        }
    }

    /// Whether a poller loop should run.
    pub fn is_enabled(self) -> bool {
        matches!(self, Self::Every(_))
    }
}

impl TryFrom<i64> for PollingInterval {
    type Error = WatcherError;

    fn try_from(value: i64) -> Result<Self> {
        match value {
            Self::DISABLED => Ok(Self::Disabled),
            millis if millis > 0 => Ok(Self::Every(Duration::from_millis(millis as u64))),
            other => Err(WatcherError::InvalidPolling(other)),
        }
    }
}

impl From<PollingInterval> for i64 {
    fn from(value: PollingInterval) -> Self {
        match value {
            PollingInterval::Disabled => PollingInterval::DISABLED,
            PollingInterval::Every(period) => {
                i64::try_from(period.as_millis()).unwrap_or(i64::MAX)
            }
        }
    }
}

impl fmt::Display for PollingInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Disabled => f.write_str("disabled"),
            Self::Every(period) => write!(f, "{} ms", period.as_millis()),
        }
    }
}

/// A directory observed by a monitor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct WatchedDirectory {
    /// Absolute path to the directory.
    pub path: PathBuf,

    /// How the directory is polled.
    pub polling: PollingInterval,
}

impl WatchedDirectory {
    /// Create a watched directory, creating it on disk when missing.
    ///
    /// A directory that cannot be created is logged and kept: it simply
    /// yields no files until it appears.
    pub fn new(path: impl AsRef<Path>, polling: PollingInterval) -> Self {
        let path = absolute(path.as_ref());
        let directory = Self { path, polling };

        if let Err(e) = directory.ensure_exists() {
            warn!(
                directory = %directory.path.display(),
                "Monitored directory unavailable, continuing without it: {e}"
            );
        }

        directory
    }

    /// Create a watched directory without polling.
    pub fn unpolled(path: impl AsRef<Path>) -> Self {
        Self::new(path, PollingInterval::Disabled)
    }

    /// Short name used to tell monitors apart in logs.
    pub fn name(&self) -> String {
        self.path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| self.path.display().to_string())
    }

    /// Create the directory if it does not exist yet.
    pub fn ensure_exists(&self) -> Result<()> {
        if self.path.is_dir() {
            return Ok(());
        }

        info!(
            "Monitored directory {} not existing - creating directory",
            self.path.display()
        );
        std::fs::create_dir_all(&self.path).map_err(|source| WatcherError::CreateDirectory {
            path: self.path.display().to_string(),
            source,
        })
    }
}

fn absolute(path: &Path) -> PathBuf {
    match path.absolutize() {
        Ok(abs) => abs.into_owned(),
        Err(_) => path.to_path_buf(),
    }
}
