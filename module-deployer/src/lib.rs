//! # Module Deployer
//!
//! A [`Deployer`](hotdeploy_monitor::Deployer) that keeps a module runtime in
//! sync with the archives of a watched directory.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                        Module Deployer                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  DirectoryMonitor ──► ModuleDeployer ──► ModuleRuntime          │
//! │                            │                                    │
//! │                 archive (MANIFEST.MF) + path → module map       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Example
//!
//! ```ignore
//! use hotdeploy_module_deployer::ModuleDeployer;
//!
//! let deployer = Arc::new(ModuleDeployer::new(runtime));
//! catalog.register(deployer);
//! ```

pub mod archive;
pub mod deployer;
pub mod error;
pub mod runtime;

pub use archive::{Manifest, is_module_archive};
pub use deployer::{DEFAULT_EXTENSION, ModuleDeployer};
pub use error::{ArchiveError, RuntimeError};
pub use runtime::{ModuleId, ModuleRuntime};
