use std::sync::{Condvar, Mutex, MutexGuard, PoisonError};
use std::time::{Duration, Instant};

/// One-slot channel: `send` overwrites, `receive` blocks until a value is present.
///
/// Only the latest value is delivered. Anything sent while no receiver was
/// waiting is replaced by the next `send`. Concurrent receivers race for the
/// slot and each `send` wakes at most one of them.
pub struct PhaseChannel<T> {
    slot: Mutex<Option<T>>,
    ready: Condvar,
}

impl<T> PhaseChannel<T> {
    pub const fn new() -> Self {
        Self {
            slot: Mutex::new(None),
            ready: Condvar::new(),
        }
    }

    // The slot has no invariant a panicking holder could break.
    fn lock(&self) -> MutexGuard<'_, Option<T>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn send(&self, value: T) {
        *self.lock() = Some(value);
        self.ready.notify_one();
    }

    /// Blocks until a value is available and takes it.
    ///
    /// Never returns if nothing is ever sent.
    pub fn receive(&self) -> T {
        let mut slot = self.lock();
        loop {
            if let Some(value) = slot.take() {
                return value;
            }
            slot = self.ready.wait(slot).unwrap_or_else(PoisonError::into_inner);
        }
    }

    /// Like `receive`, but gives up once `timeout` has passed.
    pub fn receive_timeout(&self, timeout: Duration) -> Option<T> {
        let deadline = Instant::now() + timeout;
        let mut slot = self.lock();
        loop {
            if let Some(value) = slot.take() {
                return Some(value);
            }
            let remaining = deadline.saturating_duration_since(Instant::now());
            if remaining.is_zero() {
                return None;
            }
            slot = self
                .ready
                .wait_timeout(slot, remaining)
                .unwrap_or_else(PoisonError::into_inner)
                .0;
        }
    }

    pub fn try_receive(&self) -> Option<T> {
        self.lock().take()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }
}

impl<T> Default for PhaseChannel<T> {
    fn default() -> Self {
        Self::new()
    }
}
