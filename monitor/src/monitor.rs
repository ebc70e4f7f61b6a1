//! Directory monitor.
//!
//! Composes a [`FileSystemWatcher`] with a [`DeployerRegistry`] fed by a
//! [`DeployerSource`]. On start it hands the files already present to the
//! deployers in bulk, then routes every file event to the deployers
//! currently registered for the file's extension.

use std::any::Any;
use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use hotdeploy_directory_watcher::{
    DEFAULT_STOP_TIMEOUT, FileEvent, FileEventHandler, FileEventKind, FileIndexer,
    FileSystemWatcher, WatchedDirectory,
};
use parking_lot::Mutex;
use tracing::{debug, error, info, warn};

use crate::config::HotDeployConfig;
use crate::deployer::DeployerRef;
use crate::error::{DeployError, MonitorError, Result};
use crate::lock::ReentrantRwLock;
use crate::registry::DeployerRegistry;
use crate::tracker::{DeployerListener, DeployerSource, SubscriptionId};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Lifecycle {
    Idle,
    Running(Option<SubscriptionId>),
    Stopped,
}

/// State shared between the monitor, the poller thread and the deployer
/// source.
struct MonitorInner {
    directory: WatchedDirectory,

    /// Lists the files handed to deployers when they are opened.
    indexer: FileIndexer,

    /// Directory name, for logs.
    name: String,

    /// Orders registry mutations, startup and shutdown against dispatch.
    lock: ReentrantRwLock,

    /// Only held for the duration of a single registry call.
    registry: Mutex<DeployerRegistry>,
}

/// Monitors a directory and delegates its file events to the deployers
/// registered for each file extension.
pub struct DirectoryMonitor {
    inner: Arc<MonitorInner>,
    source: Arc<dyn DeployerSource>,
    watcher: Mutex<FileSystemWatcher>,
    lifecycle: Mutex<Lifecycle>,
    stop_timeout: Duration,
}

impl DirectoryMonitor {
    /// Create a monitor for `directory`, discovering deployers from `source`.
    pub fn new(directory: WatchedDirectory, source: Arc<dyn DeployerSource>) -> Self {
        let inner = Arc::new(MonitorInner {
            name: directory.name(),
            indexer: FileIndexer::new(&directory.path),
            directory: directory.clone(),
            lock: ReentrantRwLock::new(),
            registry: Mutex::new(DeployerRegistry::new()),
        });

        Self {
            inner,
            source,
            watcher: Mutex::new(FileSystemWatcher::new(directory)),
            lifecycle: Mutex::new(Lifecycle::Idle),
            stop_timeout: DEFAULT_STOP_TIMEOUT,
        }
    }

    /// Build the runtime and application monitors described by `config`.
    ///
    /// Fails when a required directory is missing from the configuration.
    pub fn from_config(
        config: &HotDeployConfig,
        source: Arc<dyn DeployerSource>,
    ) -> Result<Vec<Self>> {
        config.validate()?;
        Ok(config
            .watched_directories()
            .into_iter()
            .map(|directory| Self::new(directory, source.clone()))
            .collect())
    }

    /// Set how long [`stop`](Self::stop) waits for the poller.
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// The monitored directory.
    pub fn directory(&self) -> &WatchedDirectory {
        &self.inner.directory
    }

    /// Whether the monitor has been started and not stopped.
    pub fn is_running(&self) -> bool {
        matches!(*self.lifecycle.lock(), Lifecycle::Running(_))
    }

    /// Extensions that currently have at least one deployer.
    pub fn extensions(&self) -> Vec<String> {
        let _read = self.inner.lock.read();
        self.inner.registry.lock().extensions()
    }

    /// Point-in-time list of the deployers for `extension`, in dispatch
    /// order.
    pub fn deployers_for(&self, extension: &str) -> Vec<DeployerRef> {
        self.inner.snapshot(extension)
    }

    /// Start discovering deployers, start polling, then open every
    /// deployer with the files already present.
    pub fn start(&self) -> Result<()> {
        {
            let mut lifecycle = self.lifecycle.lock();
            match *lifecycle {
                Lifecycle::Idle => *lifecycle = Lifecycle::Running(None),
                Lifecycle::Running(_) => {
                    return Err(MonitorError::AlreadyStarted(self.inner.directory.path.clone()));
                }
                Lifecycle::Stopped => {
                    return Err(MonitorError::AlreadyStopped(self.inner.directory.path.clone()));
                }
            }
        }

        info!(
            monitor = %self.inner.name,
            "Starting installing artifacts from {}",
            self.inner.directory.path.display()
        );

        {
            // Arrivals announced meanwhile block until the write lock is
            // released, unless they come from this very thread.
            let _write = self.inner.lock.write();

            let id = self.source.subscribe(self.inner.clone());
            *self.lifecycle.lock() = Lifecycle::Running(Some(id));

            if let Err(e) = self.watcher.lock().start(self.inner.clone()) {
                warn!(
                    monitor = %self.inner.name,
                    "File monitoring unavailable, continuing without it: {e}"
                );
            }
        }

        let _read = self.inner.lock.read();
        let extensions = self.inner.registry.lock().extensions();
        for extension in extensions {
            let files = self.inner.inventory(&extension);
            let deployers = self.inner.registry.lock().deployers_for(&extension);
            for deployer in &deployers {
                self.inner.open_deployer(deployer, &files);
            }
        }

        Ok(())
    }

    /// Stop discovery and polling, then close every known deployer once.
    pub fn stop(&self) {
        let subscription = {
            let mut lifecycle = self.lifecycle.lock();
            let previous = std::mem::replace(&mut *lifecycle, Lifecycle::Stopped);
            match previous {
                Lifecycle::Running(id) => id,
                Lifecycle::Idle => None,
                Lifecycle::Stopped => return,
            }
        };

        {
            let _write = self.inner.lock.write();
            if let Some(id) = subscription {
                self.source.unsubscribe(id);
            }
            self.watcher.lock().stop(self.stop_timeout);
        }

        let deployers = self.inner.registry.lock().distinct_deployers();
        for deployer in deployers {
            debug!(monitor = %self.inner.name, "Closing deployer {}", deployer.name());
            self.inner.guarded(&deployer, "close", None, || deployer.close());
        }

        info!(
            monitor = %self.inner.name,
            "Stopped monitoring {}",
            self.inner.directory.path.display()
        );
    }
}

impl Drop for DirectoryMonitor {
    fn drop(&mut self) {
        if self.is_running() {
            self.stop();
        }
    }
}

impl MonitorInner {
    fn snapshot(&self, extension: &str) -> Vec<DeployerRef> {
        let _read = self.lock.read();
        self.registry.lock().deployers_for(extension)
    }

    fn inventory(&self, extension: &str) -> Vec<PathBuf> {
        self.indexer.list_files(extension)
    }

    fn open_deployer(&self, deployer: &DeployerRef, files: &[PathBuf]) {
        debug!(
            monitor = %self.name,
            "Opening deployer {} with {} files",
            deployer.name(),
            files.len()
        );
        self.guarded(deployer, "open", None, || deployer.open(files));
    }

    /// Route one file event. The registry is only read under the lock;
    /// deployers are called after it has been released.
    fn dispatch(&self, event: &FileEvent) {
        let path = &event.path;
        info!(
            monitor = %self.name,
            "File {} {} in {}",
            path.display(),
            event.kind.as_str(),
            self.directory.path.display()
        );

        let Some(extension) = event.extension() else {
            return;
        };
        let deployers = self.snapshot(extension);

        for deployer in &deployers {
            let action = event.kind.as_str();
            self.guarded(deployer, action, Some(path.as_path()), || match event.kind {
                FileEventKind::Created => deployer.on_file_create(path),
                FileEventKind::Changed => deployer.on_file_change(path),
                FileEventKind::Deleted => deployer.on_file_delete(path),
            });
        }
    }

    /// Run a deployer callback, logging its failure or panic.
    fn guarded<F>(&self, deployer: &DeployerRef, action: &str, path: Option<&Path>, f: F)
    where
        F: FnOnce() -> std::result::Result<(), DeployError>,
    {
        let target = path
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| self.directory.path.display().to_string());

        match catch_unwind(AssertUnwindSafe(f)) {
            Ok(Ok(())) => {}
            Ok(Err(e)) => error!(
                monitor = %self.name,
                "Error during the management of {target} ({action}) by {}: {e}",
                deployer.name()
            ),
            Err(panic) => error!(
                monitor = %self.name,
                "Error during the management of {target} ({action}) by {}: panicked: {}",
                deployer.name(),
                panic_message(panic.as_ref())
            ),
        }
    }
}

impl DeployerListener for MonitorInner {
    fn deployer_added(&self, deployer: DeployerRef) {
        let _write = self.lock.write();
        for extension in deployer.extensions() {
            let inserted = self.registry.lock().add(extension, deployer.clone());
            if inserted {
                let files = self.inventory(extension);
                self.open_deployer(&deployer, &files);
            }
        }
    }

    fn deployer_removed(&self, deployer: &DeployerRef) {
        let _write = self.lock.write();
        self.registry.lock().remove(deployer);
    }
}

impl FileEventHandler for MonitorInner {
    fn on_event(&self, event: &FileEvent) {
        self.dispatch(event);
    }
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic".to_string()
    }
}
