//! # Directory Monitor
//!
//! Routes file events from watched directories to pluggable deployers.
//!
//! Deployers claim file extensions and come and go at any time through a
//! [`DeployerSource`]. A [`DirectoryMonitor`] keeps the extension index up
//! to date, hands each new deployer the files already present, and delivers
//! every later creation, change or deletion to the deployers registered for
//! the file's extension.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                      Directory Monitor                          │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  DeployerSource ──► DeployerRegistry ◄── ReentrantRwLock        │
//! │                            │                                    │
//! │  FileSystemWatcher ──► dispatch ──► Deployer::on_file_*         │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod deployer;
pub mod error;
pub mod lock;
pub mod monitor;
pub mod registry;
pub mod tracker;

pub use config::{DEFAULT_MONITORING_PERIOD, HotDeployConfig};
pub use deployer::{Deployer, DeployerRef, same_deployer};
pub use error::{ConfigError, DeployError, MonitorError, Result};
pub use lock::{ReadGuard, ReentrantRwLock, WriteGuard};
pub use monitor::DirectoryMonitor;
pub use registry::DeployerRegistry;
pub use tracker::{DeployerCatalog, DeployerListener, DeployerSource, SubscriptionId};
