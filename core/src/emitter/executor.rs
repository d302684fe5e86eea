//! Emitter execution loop

use crate::config::EmitterOptions;
use crate::error::{EmitError, EmitResult};
use crate::metrics::StatsSummary;
use crate::traits::{Consumer, Emitted, Producer};

use super::handle::{EmitterHandle, EmitterState, Shared};
use super::stats::StatsRecorder;
use super::throttler::RateThrottler;

use std::sync::Arc;
use std::time::Instant;

/// EmitterLoop runs the cycle: produce -> consume -> record -> pace -> repeat
///
/// The loop runs on whichever thread calls [`run`](Self::run) and is stopped
/// from elsewhere through an [`EmitterHandle`]. Items are produced and
/// delivered strictly one at a time, in order.
pub struct EmitterLoop<T> {
    /// Run configuration
    options: EmitterOptions,

    /// Pull side
    producer: Box<dyn Producer<T>>,

    /// Push side
    consumer: Box<dyn Consumer<T>>,

    /// Flags and latches shared with handles
    shared: Arc<Shared>,
}

impl<T: Emitted> EmitterLoop<T> {
    /// Create a new emitter
    ///
    /// `name` tags every log line of the run.
    pub fn new(
        name: impl Into<String>,
        options: EmitterOptions,
        producer: impl Producer<T> + 'static,
        consumer: impl Consumer<T> + 'static,
    ) -> Self {
        Self::from_boxed(name.into(), options, Box::new(producer), Box::new(consumer))
    }

    pub(crate) fn from_boxed(
        name: String,
        options: EmitterOptions,
        producer: Box<dyn Producer<T>>,
        consumer: Box<dyn Consumer<T>>,
    ) -> Self {
        let shared = Arc::new(Shared::new(name, options.stop_timeout));
        Self {
            options,
            producer,
            consumer,
            shared,
        }
    }

    /// Get a handle for stopping this emitter from another thread
    pub fn handle(&self) -> EmitterHandle {
        EmitterHandle {
            shared: Arc::clone(&self.shared),
        }
    }

    /// Get the emitter configuration
    pub fn options(&self) -> &EmitterOptions {
        &self.options
    }

    /// Run the loop until the iteration limit is reached or a stop is requested
    ///
    /// Returns the final statistics on normal completion. A producer failure
    /// aborts the run and is returned as an error. Either way the termination
    /// latch is released before this returns, so waiting handles wake up.
    pub fn run(mut self) -> EmitResult<StatsSummary> {
        let shared = Arc::clone(&self.shared);
        let span = tracing::info_span!("emitter", name = %shared.name);
        let _enter = span.enter();

        let _terminate = TerminationGuard(Arc::clone(&shared));
        if !shared.transition(EmitterState::Idle, EmitterState::Running) {
            shared.request_shutdown();
            return Err(EmitError::internal(format!(
                "emitter started from state {}",
                shared.state()
            )));
        }

        tracing::info!(
            iteration_limit = ?self.options.iteration_limit,
            target_rate = self.options.target_rate,
            reporting_interval_ms = self.options.reporting_interval.as_millis() as u64,
            "Starting emitter"
        );

        match self.emit() {
            Ok(summary) => Ok(summary),
            Err(e) => {
                tracing::error!(error = %e, "Error while emitting generated data. Stopping.");
                shared.request_shutdown();
                Err(e)
            }
        }
    }

    fn emit(&mut self) -> EmitResult<StatsSummary> {
        let start = Instant::now();
        let mut throttler =
            RateThrottler::new(self.options.target_rate, start, Arc::clone(&self.shared.wake));
        let mut stats = StatsRecorder::with_start(
            self.options.iteration_limit,
            self.options.reporting_interval,
            start,
        );

        let mut iteration: u64 = 0;
        loop {
            // Shutdown is silent; reaching the limit is logged
            if self.shared.is_shutdown_requested() {
                break;
            }
            if let Some(limit) = self.options.iteration_limit {
                if iteration >= limit {
                    tracing::info!(limit, "Reached maximum number of data generation {}", limit);
                    break;
                }
            }

            let sent_at = Instant::now();
            let item = self.producer.produce()?;
            let bytes = item.byte_size();

            match self.consumer.accept(item) {
                Ok(()) => {
                    let now = Instant::now();
                    stats.record(iteration, now.duration_since(sent_at), bytes, now);
                }
                Err(e) => {
                    tracing::warn!(
                        iteration,
                        error = %e,
                        "Unexpected error while emitting generated data"
                    );
                }
            }

            if throttler.should_throttle(iteration + 1, sent_at) {
                throttler.throttle();
            }

            iteration += 1;
        }

        tracing::debug!(iterations = iteration, "Emitter loop exited");
        Ok(stats.print_total())
    }
}

impl<T> std::fmt::Debug for EmitterLoop<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EmitterLoop")
            .field("name", &self.shared.name)
            .field("options", &self.options)
            .field("state", &self.shared.state())
            .finish()
    }
}

/// Marks the emitter stopped and opens the termination latch on every exit path
struct TerminationGuard(Arc<Shared>);

impl Drop for TerminationGuard {
    fn drop(&mut self) {
        self.0.set_state(EmitterState::Stopped);
        if self.0.terminated.release() {
            tracing::info!("Emitter has been stopped");
        }
    }
}
