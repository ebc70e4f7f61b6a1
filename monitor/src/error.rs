//! Error types for the directory monitor.

use std::path::PathBuf;

use thiserror::Error;

/// Result type alias for monitor operations.
pub type Result<T> = std::result::Result<T, MonitorError>;

/// Errors that can occur while running a directory monitor.
#[derive(Error, Debug)]
pub enum MonitorError {
    /// Monitor started twice.
    #[error("monitor for {0} already started")]
    AlreadyStarted(PathBuf),

    /// Monitor was stopped and cannot be started again.
    #[error("monitor for {0} already stopped")]
    AlreadyStopped(PathBuf),

    /// Configuration error.
    #[error("configuration error: {0}")]
    Config(#[from] ConfigError),
}

/// Errors raised by a deployer while handling files.
#[derive(Error, Debug)]
pub enum DeployError {
    /// Handling a file failed.
    #[error("{deployer} failed for {path}: {reason}")]
    Failed {
        deployer: String,
        path: PathBuf,
        reason: String,
    },
}

/// Errors in the hot-deployment configuration.
///
/// These are the only errors that abort construction.
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A required directory entry is missing.
    #[error("the {0} property is missing in the configuration")]
    MissingDirectory(&'static str),

    /// The configuration file could not be read.
    #[error("cannot read configuration file {path}: {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },

    /// The configuration file is not valid TOML.
    #[error("invalid configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
