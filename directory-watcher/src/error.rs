//! Error types for the directory watcher.

use thiserror::Error;

/// Result type alias for watcher operations.
pub type Result<T> = std::result::Result<T, WatcherError>;

/// Errors that can occur in the directory watcher.
#[derive(Error, Debug)]
pub enum WatcherError {
    /// Directory could not be created.
    #[error("cannot create directory {path}: {source}")]
    CreateDirectory {
        path: String,
        source: std::io::Error,
    },

    /// Watcher already running.
    #[error("watcher already running for: {0}")]
    AlreadyWatching(String),

    /// Watcher was stopped and cannot be restarted.
    #[error("watcher already stopped for: {0}")]
    AlreadyStopped(String),

    /// Invalid polling period.
    #[error("invalid polling period: {0} (expected -1 or a positive number of milliseconds)")]
    InvalidPolling(i64),

    /// Notify error.
    #[error("notify error: {0}")]
    Notify(#[from] notify::Error),
}
