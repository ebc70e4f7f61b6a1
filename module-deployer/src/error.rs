//! Error types for the module deployer.

use thiserror::Error;

use crate::runtime::ModuleId;

/// Errors reported by the host module runtime.
#[derive(Error, Debug)]
pub enum RuntimeError {
    /// Installing an artifact failed.
    #[error("cannot install {location}: {reason}")]
    Install { location: String, reason: String },

    /// Updating a module in place failed.
    #[error("cannot update module {module}: {reason}")]
    Update { module: ModuleId, reason: String },

    /// Starting a module failed, typically because it cannot be resolved yet.
    #[error("cannot start module {module}: {reason}")]
    Start { module: ModuleId, reason: String },

    /// Uninstalling a module failed.
    #[error("cannot uninstall module {module}: {reason}")]
    Uninstall { module: ModuleId, reason: String },

    /// The runtime does not know the module.
    #[error("unknown module {0}")]
    UnknownModule(ModuleId),
}

/// Errors while inspecting a module archive.
#[derive(Error, Debug)]
pub enum ArchiveError {
    /// IO error.
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// The file is not a readable zip archive.
    #[error("invalid archive: {0}")]
    Zip(#[from] zip::result::ZipError),
}
