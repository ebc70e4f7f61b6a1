//! Reader-writer lock with per-thread reentrancy.
//!
//! The lock carries no data. It orders registry mutations, startup and
//! shutdown against event dispatch, and a thread that already holds it
//! (for instance while a deployer registers during startup) can ask again
//! without deadlocking.

use std::collections::HashSet;
use std::thread::{self, ThreadId};

use parking_lot::{Condvar, Mutex};

#[derive(Debug, Default)]
struct LockState {
    writer: Option<ThreadId>,
    readers: HashSet<ThreadId>,
}

impl LockState {
    fn has_other_readers(&self, me: ThreadId) -> bool {
        self.readers.iter().any(|id| *id != me)
    }
}

/// Reentrant reader-writer lock.
///
/// Writers are exclusive, readers shared. The write holder may also take
/// the read lock. Upgrading a read hold to a write hold only succeeds once
/// every other reader has left.
#[derive(Debug, Default)]
pub struct ReentrantRwLock {
    state: Mutex<LockState>,
    released: Condvar,
}

impl ReentrantRwLock {
    pub fn new() -> Self {
        Self::default()
    }

    /// Acquire the write lock unless the current thread already holds it.
    ///
    /// Returns `true` if the lock was acquired by this call.
    pub fn acquire_write_if_not_held(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.writer == Some(me) {
            return false;
        }
        while state.writer.is_some() || state.has_other_readers(me) {
            self.released.wait(&mut state);
        }
        state.writer = Some(me);
        true
    }

    /// Release the write lock if the current thread holds it.
    ///
    /// Returns `true` if no thread holds the write lock afterwards.
    pub fn release_write_if_held(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.writer == Some(me) {
            state.writer = None;
            self.released.notify_all();
        }
        state.writer.is_none()
    }

    /// Acquire the read lock unless the current thread already holds it.
    ///
    /// Returns `true` if the lock was acquired by this call.
    pub fn acquire_read_if_not_held(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.readers.contains(&me) {
            return false;
        }
        while state.writer.is_some_and(|w| w != me) {
            self.released.wait(&mut state);
        }
        state.readers.insert(me);
        true
    }

    /// Release the read lock if the current thread holds it.
    ///
    /// Returns `true` if the current thread no longer holds the read lock.
    pub fn release_read_if_held(&self) -> bool {
        let me = thread::current().id();
        let mut state = self.state.lock();
        if state.readers.remove(&me) {
            self.released.notify_all();
        }
        !state.readers.contains(&me)
    }

    /// Whether the current thread holds the write lock.
    pub fn is_write_held_by_current_thread(&self) -> bool {
        self.state.lock().writer == Some(thread::current().id())
    }

    /// Whether the current thread holds the read lock.
    pub fn is_read_held_by_current_thread(&self) -> bool {
        self.state
            .lock()
            .readers
            .contains(&thread::current().id())
    }

    /// Take the write lock for the guard's lifetime.
    ///
    /// A nested guard on a thread already holding the lock leaves the outer
    /// hold untouched when dropped.
    pub fn write(&self) -> WriteGuard<'_> {
        WriteGuard {
            lock: self,
            acquired: self.acquire_write_if_not_held(),
        }
    }

    /// Take the read lock for the guard's lifetime.
    pub fn read(&self) -> ReadGuard<'_> {
        ReadGuard {
            lock: self,
            acquired: self.acquire_read_if_not_held(),
        }
    }
}

/// Exclusive hold on a [`ReentrantRwLock`].
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct WriteGuard<'a> {
    lock: &'a ReentrantRwLock,
    acquired: bool,
}

impl WriteGuard<'_> {
    /// Whether this guard took the lock, as opposed to reusing a hold.
    pub fn acquired(&self) -> bool {
        self.acquired
    }
}

impl Drop for WriteGuard<'_> {
    fn drop(&mut self) {
        if self.acquired {
            self.lock.release_write_if_held();
        }
    }
}

/// Shared hold on a [`ReentrantRwLock`].
#[must_use = "the lock is released as soon as the guard is dropped"]
pub struct ReadGuard<'a> {
    lock: &'a ReentrantRwLock,
    acquired: bool,
}

impl ReadGuard<'_> {
    /// Whether this guard took the lock, as opposed to reusing a hold.
    pub fn acquired(&self) -> bool {
        self.acquired
    }
}

impl Drop for ReadGuard<'_> {
    fn drop(&mut self) {
        if self.acquired {
            self.lock.release_read_if_held();
        }
    }
}
