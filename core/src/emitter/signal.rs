//! Cross-thread signals used by the emitter
//!
//! Both signals pair a boolean latch with a condition variable. The latch is
//! set under the mutex before notifying, so a signal raised before anyone
//! waits is still observed by the next waiter.

use parking_lot::{Condvar, Mutex};
use std::time::{Duration, Instant};

/// Wake-up latch shared between the throttler and whoever stops the loop
#[derive(Debug, Default)]
pub struct WakeSignal {
    woken: Mutex<bool>,
    cond: Condvar,
}

impl WakeSignal {
    /// Create an unset signal
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the latch and release every waiter. Idempotent.
    pub fn wake(&self) {
        let mut woken = self.woken.lock();
        *woken = true;
        self.cond.notify_all();
    }

    /// Whether a wake-up is pending
    pub fn is_set(&self) -> bool {
        *self.woken.lock()
    }

    /// Block until woken, then clear the latch
    pub fn wait(&self) {
        let mut woken = self.woken.lock();
        while !*woken {
            self.cond.wait(&mut woken);
        }
        *woken = false;
    }

    /// Block until woken or `deadline` passes.
    ///
    /// Returns `true` if the wait ended because of a wake-up, clearing the latch.
    pub fn wait_until(&self, deadline: Instant) -> bool {
        let mut woken = self.woken.lock();
        while !*woken {
            if self.cond.wait_until(&mut woken, deadline).timed_out() {
                break;
            }
        }
        std::mem::replace(&mut *woken, false)
    }
}

/// Single-fire latch released once the loop has fully exited
#[derive(Debug, Default)]
pub struct TerminationLatch {
    released: Mutex<bool>,
    cond: Condvar,
}

impl TerminationLatch {
    /// Create a closed latch
    pub fn new() -> Self {
        Self::default()
    }

    /// Open the latch. Returns `false` if it was already open.
    pub fn release(&self) -> bool {
        let mut released = self.released.lock();
        if *released {
            return false;
        }
        *released = true;
        self.cond.notify_all();
        true
    }

    /// Whether the latch is open
    pub fn is_released(&self) -> bool {
        *self.released.lock()
    }

    /// Wait up to `timeout` for the latch to open. Returns whether it did.
    pub fn wait_timeout(&self, timeout: Duration) -> bool {
        let deadline = Instant::now().checked_add(timeout);
        let mut released = self.released.lock();
        while !*released {
            match deadline {
                Some(deadline) => {
                    if self.cond.wait_until(&mut released, deadline).timed_out() {
                        return *released;
                    }
                }
                None => self.cond.wait(&mut released),
            }
        }
        true
    }
}
