//! Statistics snapshots and percentile calculation

use serde::{Deserialize, Serialize};
use std::time::Duration;

const BYTES_PER_MB: f64 = 1024.0 * 1024.0;

/// Latency percentiles (all values in milliseconds)
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, Default)]
pub struct LatencyPercentiles {
    /// 50th percentile (median)
    pub p50: f64,
    /// 95th percentile
    pub p95: f64,
    /// 99th percentile
    pub p99: f64,
    /// 99.9th percentile
    pub p999: f64,
}

impl LatencyPercentiles {
    /// Compute percentiles from latency samples in microseconds.
    ///
    /// Sorts the slice in place. Empty input yields all zeros.
    pub fn from_samples(samples: &mut [u64]) -> Self {
        if samples.is_empty() {
            return Self::default();
        }
        samples.sort_unstable();

        Self {
            p50: micros_to_ms(percentile(samples, 0.50)),
            p95: micros_to_ms(percentile(samples, 0.95)),
            p99: micros_to_ms(percentile(samples, 0.99)),
            p999: micros_to_ms(percentile(samples, 0.999)),
        }
    }
}

/// Nearest-rank percentile over sorted values: `sorted[floor(p * len)]`
pub fn percentile(sorted: &[u64], p: f64) -> u64 {
    if sorted.is_empty() {
        return 0;
    }
    let idx = (p * sorted.len() as f64).floor() as usize;
    sorted[idx.min(sorted.len() - 1)]
}

pub(crate) fn micros_to_ms(micros: u64) -> f64 {
    micros as f64 / 1000.0
}

pub(crate) fn per_second(amount: f64, elapsed: Duration) -> f64 {
    let secs = elapsed.as_secs_f64();
    if secs > 0.0 {
        amount / secs
    } else {
        0.0
    }
}

/// Metrics for one reporting window
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WindowReport {
    /// Items recorded in the window
    pub count: u64,
    /// Window length
    pub elapsed: Duration,
    /// Items per second
    pub records_per_second: f64,
    /// Throughput in MiB per second
    pub mb_per_second: f64,
    /// Mean latency (ms)
    pub avg_latency_ms: f64,
    /// Worst latency (ms)
    pub max_latency_ms: f64,
}

impl std::fmt::Display for WindowReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records generated, {:.1} records/sec ({:.2} MB/sec), {:.1} ms avg latency, {:.1} ms max latency.",
            self.count,
            self.records_per_second,
            self.mb_per_second,
            self.avg_latency_ms,
            self.max_latency_ms
        )
    }
}

/// Final statistics for a completed run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct StatsSummary {
    /// Items recorded
    pub count: u64,
    /// Bytes recorded
    pub total_bytes: u64,
    /// Time from recorder creation to summary
    pub elapsed: Duration,
    /// Items per second
    pub records_per_second: f64,
    /// Throughput in MiB per second
    pub mb_per_second: f64,
    /// Mean latency (ms)
    pub avg_latency_ms: f64,
    /// Worst latency (ms)
    pub max_latency_ms: f64,
    /// Latency percentiles over the sampled iterations
    pub percentiles: LatencyPercentiles,
    /// Window reports logged during the run
    #[serde(default)]
    pub windows_reported: u64,
}

impl StatsSummary {
    /// Whether anything was recorded
    pub fn is_empty(&self) -> bool {
        self.count == 0
    }

    pub(crate) fn throughput(count: u64, bytes: u64, elapsed: Duration) -> (f64, f64) {
        (
            per_second(count as f64, elapsed),
            per_second(bytes as f64 / BYTES_PER_MB, elapsed),
        )
    }
}

impl std::fmt::Display for StatsSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{} records generated, {:.1} records/sec ({:.2} MB/sec), {:.2} ms avg latency, {:.2} ms max latency, \
             {:.2} ms 50th, {:.2} ms 95th, {:.2} ms 99th, {:.2} ms 99.9th.",
            self.count,
            self.records_per_second,
            self.mb_per_second,
            self.avg_latency_ms,
            self.max_latency_ms,
            self.percentiles.p50,
            self.percentiles.p95,
            self.percentiles.p99,
            self.percentiles.p999
        )
    }
}
