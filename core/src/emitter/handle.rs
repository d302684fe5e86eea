//! Thread-safe control over a running emitter

use super::signal::{TerminationLatch, WakeSignal};

use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::Arc;
use std::time::Duration;

/// Lifecycle of an emitter: `Idle → Running → Stopping → Stopped`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum EmitterState {
    /// Built, not yet running
    Idle = 0,
    /// Inside the loop
    Running = 1,
    /// Stop requested, loop still draining
    Stopping = 2,
    /// Loop exited and cleaned up
    Stopped = 3,
}

impl EmitterState {
    fn from_u8(value: u8) -> Self {
        match value {
            0 => Self::Idle,
            1 => Self::Running,
            2 => Self::Stopping,
            _ => Self::Stopped,
        }
    }
}

impl std::fmt::Display for EmitterState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            EmitterState::Idle => write!(f, "idle"),
            EmitterState::Running => write!(f, "running"),
            EmitterState::Stopping => write!(f, "stopping"),
            EmitterState::Stopped => write!(f, "stopped"),
        }
    }
}

/// Result of a blocking stop
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopOutcome {
    /// The loop confirmed termination within the timeout
    Confirmed,
    /// The loop had not terminated when the timeout elapsed; it may still stop later
    TimedOut,
    /// The emitter never started; the next `run` returns immediately
    NotStarted,
    /// Another caller already requested the stop
    AlreadyRequested,
}

/// State shared between the loop thread and its handles
#[derive(Debug)]
pub(crate) struct Shared {
    pub(crate) name: String,
    pub(crate) wake: Arc<WakeSignal>,
    pub(crate) terminated: TerminationLatch,
    stop_timeout: Duration,
    shutdown: AtomicBool,
    state: AtomicU8,
}

impl Shared {
    pub(crate) fn new(name: String, stop_timeout: Duration) -> Self {
        Self {
            name,
            wake: Arc::new(WakeSignal::new()),
            terminated: TerminationLatch::new(),
            stop_timeout,
            shutdown: AtomicBool::new(false),
            state: AtomicU8::new(EmitterState::Idle as u8),
        }
    }

    /// Raise the shutdown flag. Returns `false` if it was already raised.
    pub(crate) fn request_shutdown(&self) -> bool {
        self.shutdown
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn is_shutdown_requested(&self) -> bool {
        self.shutdown.load(Ordering::SeqCst)
    }

    pub(crate) fn state(&self) -> EmitterState {
        EmitterState::from_u8(self.state.load(Ordering::SeqCst))
    }

    pub(crate) fn transition(&self, from: EmitterState, to: EmitterState) -> bool {
        self.state
            .compare_exchange(from as u8, to as u8, Ordering::SeqCst, Ordering::SeqCst)
            .is_ok()
    }

    pub(crate) fn set_state(&self, state: EmitterState) {
        self.state.store(state as u8, Ordering::SeqCst);
    }
}

/// Cloneable handle used to stop an emitter from another thread
///
/// Obtained from [`EmitterLoop::handle`](super::EmitterLoop::handle) before
/// the loop is moved onto its thread.
#[derive(Debug, Clone)]
pub struct EmitterHandle {
    pub(crate) shared: Arc<Shared>,
}

impl EmitterHandle {
    /// Request termination without waiting for it
    ///
    /// Returns `true` if this call raised the shutdown flag, `false` if it was
    /// already raised.
    pub fn request_stop(&self) -> bool {
        if !self.shared.request_shutdown() {
            return false;
        }
        self.shared
            .transition(EmitterState::Running, EmitterState::Stopping);
        self.shared.wake.wake();
        tracing::debug!(emitter = %self.shared.name, "Stop requested");
        true
    }

    /// Request termination and wait up to the configured stop timeout for it
    ///
    /// A timeout is reported as a warning, not an error: the loop may still
    /// finish its current iteration and stop afterwards.
    pub fn stop(&self) -> StopOutcome {
        if !self.request_stop() {
            return StopOutcome::AlreadyRequested;
        }
        if self.shared.state() == EmitterState::Idle {
            return StopOutcome::NotStarted;
        }

        if self.wait_for_termination(self.shared.stop_timeout) {
            StopOutcome::Confirmed
        } else {
            tracing::warn!(
                emitter = %self.shared.name,
                timeout_ms = self.shared.stop_timeout.as_millis() as u64,
                "Timeout reached before emitter being stopped"
            );
            StopOutcome::TimedOut
        }
    }

    /// Block until the loop has exited or `timeout` elapses. Returns whether it exited.
    pub fn wait_for_termination(&self, timeout: Duration) -> bool {
        self.shared.terminated.wait_timeout(timeout)
    }

    /// Current lifecycle state
    pub fn state(&self) -> EmitterState {
        self.shared.state()
    }

    /// Whether a stop has been requested (or the run aborted)
    pub fn is_shutdown_requested(&self) -> bool {
        self.shared.is_shutdown_requested()
    }

    /// Whether the loop has exited
    pub fn is_terminated(&self) -> bool {
        self.shared.terminated.is_released()
    }

    /// Emitter name
    pub fn name(&self) -> &str {
        &self.shared.name
    }
}
