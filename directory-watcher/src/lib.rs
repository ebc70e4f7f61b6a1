//! # Directory Watcher
//!
//! This crate observes one directory tree and reports file creations,
//! modifications and deletions to the hot-deployment monitor.
//!
//! ## Features
//!
//! - **Polling**: Periodic rescans through `notify`'s poll watcher
//! - **Disabled mode**: No background loop, inventory listing only
//! - **Bounded shutdown**: Stopping never blocks on a slow scan
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────┐
//! │                    Directory Watcher                            │
//! ├─────────────────────────────────────────────────────────────────┤
//! │  WatchedDirectory ──► FileSystemWatcher ──► FileEvent           │
//! │       │                     │                   │               │
//! │       ▼                     ▼                   ▼               │
//! │  PollingInterval       FileIndexer       FileEventHandler       │
//! └─────────────────────────────────────────────────────────────────┘
//! ```

pub mod config;
pub mod error;
pub mod event;
pub mod indexer;
pub mod watcher;

pub use config::{PollingInterval, WatchedDirectory};
pub use error::{Result, WatcherError};
pub use event::{FileEvent, FileEventKind};
pub use indexer::FileIndexer;
pub use watcher::{DEFAULT_STOP_TIMEOUT, FileEventHandler, FileSystemWatcher};
