//! Single-item latest-wins handoff between pipeline stages.
//!
//! Each slot holds at most one pending item. Publishing replaces whatever is
//! pending, so a consumer always takes the most recent item and never works
//! through a backlog. This is the pipeline's backpressure policy: stages run
//! at different, data-dependent rates, and freshness wins over completeness.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use parking_lot::{Condvar, Mutex};

/// Waiters re-check the shutdown flag at least this often, so a missed
/// wakeup delays exit by at most one poll interval.
pub(crate) const SHUTDOWN_POLL: Duration = Duration::from_millis(100);

pub struct HandoffSlot<T> {
    pending: Mutex<Option<T>>,
    available: Condvar,
    shutdown: Arc<AtomicBool>,
}

impl<T> HandoffSlot<T> {
    /// The flag is shared with every other slot of the pipeline; once it is
    /// set, all blocked takes return `None`.
    pub fn new(shutdown: Arc<AtomicBool>) -> Self {
        Self {
            pending: Mutex::new(None),
            available: Condvar::new(),
            shutdown,
        }
    }

    /// Replace any pending item and wake one waiting consumer. Never blocks
    /// beyond the internal lock. Returns true when an unconsumed item was
    /// overwritten.
    pub fn publish(&self, item: T) -> bool {
        let replaced = {
            let mut pending = self.pending.lock();
            pending.replace(item).is_some()
        };
        self.available.notify_one();
        replaced
    }

    /// Block until an item is available or shutdown is requested. `None`
    /// means shutdown; the slot never returns `None` for any other reason.
    ///
    /// The wait predicate (item present or shutdown) is re-evaluated after
    /// every wake, so spurious wakeups are harmless.
    pub fn take_blocking(&self) -> Option<T> {
        let mut pending = self.pending.lock();
        loop {
            if let Some(item) = pending.take() {
                return Some(item);
            }
            if self.shutdown.load(Ordering::SeqCst) {
                return None;
            }
            self.available.wait_for(&mut pending, SHUTDOWN_POLL);
        }
    }

    /// Like [`take_blocking`](Self::take_blocking), but gives up after
    /// `timeout`. `None` means either shutdown or timeout; callers that need
    /// to distinguish check the shutdown flag themselves.
    pub fn take_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut pending = self.pending.lock();
        loop {
            if let Some(item) = pending.take() {
                return Some(item);
            }
            if self.shutdown.load(Ordering::SeqCst) {
                return None;
            }
            let now = Instant::now();
            if now >= deadline {
                return None;
            }
            let wait = (deadline - now).min(SHUTDOWN_POLL);
            self.available.wait_for(&mut pending, wait);
        }
    }

    /// Non-blocking take.
    pub fn try_take(&self) -> Option<T> {
        self.pending.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.lock().is_none()
    }

    /// Wake every waiter so a freshly set shutdown flag is observed without
    /// waiting out the poll interval.
    pub(crate) fn wake_all(&self) {
        self.available.notify_all();
    }
}
