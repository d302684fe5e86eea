//! Throughput and latency statistics for an emission run

use crate::metrics::{micros_to_ms, LatencyPercentiles, StatsSummary, WindowReport};

use std::time::{Duration, Instant};

/// Upper bound on retained latency samples
const MAX_SAMPLES: u64 = 500_000;

/// Iteration horizon assumed for sampling when the run has no limit
const UNBOUNDED_SAMPLING_HORIZON: u64 = 500_000_000;

/// Statistics recorded by the emission loop
///
/// Keeps global counters for the whole run and window counters that are
/// flushed to the log every `reporting_interval`. Latencies of every
/// `sampling`-th iteration are kept in a preallocated buffer for the final
/// percentiles, so memory stays bounded however long the run is.
///
/// Single-writer: only the loop thread touches a recorder.
#[derive(Debug)]
pub struct StatsRecorder {
    start: Instant,
    reporting_interval: Duration,
    sampling: u64,
    latencies: Vec<u64>,
    capacity: usize,

    // Global stats (latencies in microseconds)
    count: u64,
    total_bytes: u64,
    total_latency: u128,
    max_latency: u64,

    // Window stats
    window_start: Instant,
    window_count: u64,
    window_bytes: u64,
    window_total_latency: u128,
    window_max_latency: u64,
    windows_reported: u64,
}

impl StatsRecorder {
    /// Create a recorder starting now
    pub fn new(iteration_limit: Option<u64>, reporting_interval: Duration) -> Self {
        Self::with_start(iteration_limit, reporting_interval, Instant::now())
    }

    /// Create a recorder with an explicit start instant
    pub fn with_start(
        iteration_limit: Option<u64>,
        reporting_interval: Duration,
        start: Instant,
    ) -> Self {
        let (sampling, capacity) = sample_plan(iteration_limit);

        Self {
            start,
            reporting_interval,
            sampling,
            latencies: Vec::with_capacity(capacity),
            capacity,
            count: 0,
            total_bytes: 0,
            total_latency: 0,
            max_latency: 0,
            window_start: start,
            window_count: 0,
            window_bytes: 0,
            window_total_latency: 0,
            window_max_latency: 0,
            windows_reported: 0,
        }
    }

    /// Record one completed iteration
    ///
    /// Returns the flushed window when this call closed a reporting window.
    pub fn record(
        &mut self,
        iteration: u64,
        latency: Duration,
        bytes: u64,
        now: Instant,
    ) -> Option<WindowReport> {
        let micros = latency.as_micros().min(u64::MAX as u128) as u64;

        self.count += 1;
        self.total_bytes += bytes;
        self.total_latency += micros as u128;
        self.max_latency = self.max_latency.max(micros);

        self.window_count += 1;
        self.window_bytes += bytes;
        self.window_total_latency += micros as u128;
        self.window_max_latency = self.window_max_latency.max(micros);

        if iteration % self.sampling == 0 && self.latencies.len() < self.capacity {
            self.latencies.push(micros);
        }

        if !self.reporting_interval.is_zero()
            && now.saturating_duration_since(self.window_start) >= self.reporting_interval
        {
            let report = self.flush_window(now);
            if report.is_some() {
                self.windows_reported += 1;
            }
            self.new_window(now);
            return report;
        }

        None
    }

    /// Log the current window. Returns `None` ("no data") for an empty window.
    pub fn flush_window(&self, now: Instant) -> Option<WindowReport> {
        let elapsed = now.saturating_duration_since(self.window_start);
        if elapsed.is_zero() || self.window_count == 0 {
            tracing::info!("No data to report yet.");
            return None;
        }

        let (records_per_second, mb_per_second) =
            StatsSummary::throughput(self.window_count, self.window_bytes, elapsed);
        let report = WindowReport {
            count: self.window_count,
            elapsed,
            records_per_second,
            mb_per_second,
            avg_latency_ms: mean_ms(self.window_total_latency, self.window_count),
            max_latency_ms: micros_to_ms(self.window_max_latency),
        };

        tracing::info!(
            count = report.count,
            records_per_second = report.records_per_second,
            mb_per_second = report.mb_per_second,
            "{}",
            report
        );
        Some(report)
    }

    /// Start a fresh window at `now`
    pub fn new_window(&mut self, now: Instant) {
        self.window_start = now;
        self.window_count = 0;
        self.window_bytes = 0;
        self.window_total_latency = 0;
        self.window_max_latency = 0;
    }

    /// Compute the run summary as of `now` without logging
    pub fn summary(&self, now: Instant) -> StatsSummary {
        let mut samples = self.latencies.clone();
        self.summarize(&mut samples, now)
    }

    /// Log and return the final summary. Called once, at the end of a run.
    pub fn print_total(&mut self) -> StatsSummary {
        let mut samples = std::mem::take(&mut self.latencies);
        let summary = self.summarize(&mut samples, Instant::now());
        self.latencies = samples;

        if summary.is_empty() {
            tracing::info!("No data generated.");
        } else {
            tracing::info!(
                count = summary.count,
                total_bytes = summary.total_bytes,
                elapsed_secs = summary.elapsed.as_secs_f64(),
                "{}",
                summary
            );
        }
        summary
    }

    fn summarize(&self, samples: &mut [u64], now: Instant) -> StatsSummary {
        let elapsed = now.saturating_duration_since(self.start);
        let (records_per_second, mb_per_second) =
            StatsSummary::throughput(self.count, self.total_bytes, elapsed);

        StatsSummary {
            count: self.count,
            total_bytes: self.total_bytes,
            elapsed,
            records_per_second,
            mb_per_second,
            avg_latency_ms: mean_ms(self.total_latency, self.count),
            max_latency_ms: micros_to_ms(self.max_latency),
            percentiles: LatencyPercentiles::from_samples(samples),
            windows_reported: self.windows_reported,
        }
    }

    /// Iterations recorded
    pub fn count(&self) -> u64 {
        self.count
    }

    /// Bytes recorded
    pub fn total_bytes(&self) -> u64 {
        self.total_bytes
    }

    /// Iterations recorded in the current window
    pub fn window_count(&self) -> u64 {
        self.window_count
    }

    /// Window reports logged so far
    pub fn windows_reported(&self) -> u64 {
        self.windows_reported
    }

    /// Every how many iterations a latency sample is kept
    pub fn sampling(&self) -> u64 {
        self.sampling
    }

    /// Latency samples kept so far
    pub fn sample_count(&self) -> usize {
        self.latencies.len()
    }

    /// Preallocated sample slots
    pub fn sample_capacity(&self) -> usize {
        self.capacity
    }
}

/// Sampling stride and buffer size for a run of `limit` iterations
fn sample_plan(limit: Option<u64>) -> (u64, usize) {
    let horizon = limit.unwrap_or(UNBOUNDED_SAMPLING_HORIZON);
    let sampling = (horizon / horizon.min(MAX_SAMPLES).max(1)).max(1);
    let capacity = (horizon / sampling + 1) as usize;
    (sampling, capacity)
}

fn mean_ms(total_micros: u128, count: u64) -> f64 {
    if count == 0 {
        0.0
    } else {
        total_micros as f64 / count as f64 / 1000.0
    }
}
