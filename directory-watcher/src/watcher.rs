//! Polling file system watcher.
//!
//! Polling is delegated to a [`notify::PollWatcher`] configured with the
//! directory's period. Its first scan is the silent baseline; every later
//! scan reports the files created, modified or removed since.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, Sender};
use notify::{Config, Event, PollWatcher, RecursiveMode, Watcher};
use tracing::{debug, info, warn};

use crate::config::WatchedDirectory;
use crate::error::{Result, WatcherError};
use crate::event::{FileEvent, FileEventKind};

/// How long [`FileSystemWatcher::stop`] waits for the poller by default.
pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_millis(5);

/// Receives the events detected by a [`FileSystemWatcher`].
///
/// Called on the poller thread.
pub trait FileEventHandler: Send + Sync {
    fn on_event(&self, event: &FileEvent);
}

impl<F> FileEventHandler for F
where
    F: Fn(&FileEvent) + Send + Sync,
{
    fn on_event(&self, event: &FileEvent) {
        self(event)
    }
}

enum State {
    Idle,
    /// Started. `None` when polling is disabled.
    Running(Option<Poller>),
    Stopped,
}

struct Poller {
    /// Dropping the watcher asks its poll thread to exit.
    watcher: PollWatcher,

    /// Set on stop so that a scan in progress reports nothing more.
    stopped: Arc<AtomicBool>,

    /// Disconnects once the poll thread has released its handler.
    done_rx: Receiver<()>,
}

/// Forwards notify events to a [`FileEventHandler`]. Owned by the poll
/// thread.
struct Delivery {
    directory: String,
    handler: Arc<dyn FileEventHandler>,
    stopped: Arc<AtomicBool>,
    _done_tx: Sender<()>,
}

impl Delivery {
    fn deliver(&self, result: notify::Result<Event>) {
        let event = match result {
            Ok(event) => event,
            Err(e) => {
                warn!("Error while polling {}: {e}", self.directory);
                return;
            }
        };
        let Some(kind) = FileEventKind::from_notify(event.kind) else {
            return;
        };

        for path in event.paths {
            if self.stopped.load(Ordering::Acquire) {
                return;
            }
            if kind != FileEventKind::Deleted && path.is_dir() {
                continue;
            }
            self.handler.on_event(&FileEvent::new(kind, path));
        }
    }
}

/// Watches one directory tree by polling it.
///
/// Files present when the watcher starts form the baseline and are not
/// reported. A watcher can be started once; after [`stop`](Self::stop) it
/// stays stopped.
pub struct FileSystemWatcher {
    directory: WatchedDirectory,
    state: State,
}

impl FileSystemWatcher {
    /// Create a watcher for `directory`. Nothing runs until [`start`](Self::start).
    pub fn new(directory: WatchedDirectory) -> Self {
        Self {
            directory,
            state: State::Idle,
        }
    }

    /// The watched directory.
    pub fn directory(&self) -> &WatchedDirectory {
        &self.directory
    }

    /// Start polling, delivering events to `handler`.
    ///
    /// With polling disabled this only marks the watcher as started.
    pub fn start(&mut self, handler: Arc<dyn FileEventHandler>) -> Result<()> {
        match self.state {
            State::Idle => {}
            State::Running(_) => {
                return Err(WatcherError::AlreadyWatching(
                    self.directory.path.display().to_string(),
                ));
            }
            State::Stopped => {
                return Err(WatcherError::AlreadyStopped(
                    self.directory.path.display().to_string(),
                ));
            }
        }

        let Some(period) = self.directory.polling.period() else {
            debug!("No file monitoring for {}", self.directory.path.display());
            self.state = State::Running(None);
            return Ok(());
        };

        let stopped = Arc::new(AtomicBool::new(false));
        let (done_tx, done_rx) = crossbeam_channel::bounded::<()>(0);
        let delivery = Delivery {
            directory: self.directory.path.display().to_string(),
            handler,
            stopped: stopped.clone(),
            _done_tx: done_tx,
        };

        let config = Config::default()
            .with_poll_interval(period)
            .with_compare_contents(false);
        let mut watcher = PollWatcher::new(
            move |result: notify::Result<Event>| delivery.deliver(result),
            config,
        )?;
        watcher.watch(&self.directory.path, RecursiveMode::Recursive)?;

        info!(
            "Starting file monitoring for {} - polling : {} ms",
            self.directory.name(),
            period.as_millis()
        );
        self.state = State::Running(Some(Poller {
            watcher,
            stopped,
            done_rx,
        }));
        Ok(())
    }

    /// Stop polling, waiting at most `timeout` for the poll thread.
    ///
    /// Returns `false` when the poll thread did not exit in time; it is then
    /// left to finish on its own and reports nothing more.
    pub fn stop(&mut self, timeout: Duration) -> bool {
        let state = std::mem::replace(&mut self.state, State::Stopped);
        let Poller {
            watcher,
            stopped,
            done_rx,
        } = match state {
            State::Running(Some(poller)) => poller,
            State::Running(None) | State::Idle | State::Stopped => return true,
        };

        debug!("Stopping file monitoring of {}", self.directory.path.display());
        stopped.store(true, Ordering::Release);
        drop(watcher);

        match done_rx.recv_timeout(timeout) {
            Err(RecvTimeoutError::Timeout) => {
                warn!(
                    "File monitoring of {} did not stop within {:?}, continuing shutdown",
                    self.directory.path.display(),
                    timeout
                );
                false
            }
            Ok(()) | Err(RecvTimeoutError::Disconnected) => true,
        }
    }

    /// Whether the watcher has been started and not stopped.
    pub fn is_running(&self) -> bool {
        matches!(self.state, State::Running(_))
    }

    /// Whether a poll thread is active.
    pub fn is_polling(&self) -> bool {
        matches!(self.state, State::Running(Some(_)))
    }
}

impl Drop for FileSystemWatcher {
    fn drop(&mut self) {
        self.stop(DEFAULT_STOP_TIMEOUT);
    }
}
