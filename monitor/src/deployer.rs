//! Deployer capability.

use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::error::DeployError;

/// A pluggable capability turning files of some extensions into
/// deployments.
///
/// Deployers are announced by a [`DeployerSource`](crate::DeployerSource)
/// and may come and go while monitors are running. All callbacks can be
/// invoked concurrently from different threads.
pub trait Deployer: Send + Sync {
    /// Name used in logs.
    fn name(&self) -> &str;

    /// File extensions (without the leading dot) this deployer handles.
    fn extensions(&self) -> &[String];

    /// Initial batch of files present when the deployer meets a directory.
    fn open(&self, files: &[PathBuf]) -> Result<(), DeployError>;

    /// A file appeared.
    fn on_file_create(&self, file: &Path) -> Result<(), DeployError>;

    /// A file changed. Handled like a creation unless overridden.
    fn on_file_change(&self, file: &Path) -> Result<(), DeployError> {
        self.on_file_create(file)
    }

    /// A file disappeared.
    fn on_file_delete(&self, file: &Path) -> Result<(), DeployError>;

    /// The monitor is shutting down.
    fn close(&self) -> Result<(), DeployError> {
        Ok(())
    }
}

/// Shared handle on a deployer.
pub type DeployerRef = Arc<dyn Deployer>;

/// Identity comparison of two deployer handles.
///
/// Compares the data pointers only, vtables may differ between codegen
/// units for the same object.
pub fn same_deployer(a: &DeployerRef, b: &DeployerRef) -> bool {
    std::ptr::addr_eq(Arc::as_ptr(a), Arc::as_ptr(b))
}

impl fmt::Debug for dyn Deployer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Deployer")
            .field("name", &self.name())
            .field("extensions", &self.extensions())
            .finish()
    }
}
