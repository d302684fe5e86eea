//! Emitter configuration types

use crate::error::{EmitError, EmitResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Emitter configuration
///
/// Defines how long an emission run lasts, how fast it goes and how often it
/// reports. Built once before the loop starts and never mutated afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EmitterOptions {
    /// Maximum number of iterations; `None` runs until stopped
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iteration_limit: Option<u64>,

    /// Target rate in items per second.
    ///
    /// `> 0` paces the loop, `0` blocks after the first item until woken,
    /// `< 0` disables throttling.
    pub target_rate: i64,

    /// Interval between window reports; zero disables them
    #[serde(with = "duration_ms")]
    pub reporting_interval: Duration,

    /// How long a blocking stop waits for the loop to confirm termination
    #[serde(with = "duration_ms")]
    pub stop_timeout: Duration,
}

impl EmitterOptions {
    /// Target rate value that disables throttling
    pub const NO_THROUGHPUT: i64 = -1;

    /// Default wait applied by a blocking stop
    pub const DEFAULT_STOP_TIMEOUT: Duration = Duration::from_secs(5);

    /// Create options with the three core knobs and the default stop timeout
    pub fn new(iteration_limit: Option<u64>, target_rate: i64, reporting_interval: Duration) -> Self {
        Self {
            iteration_limit,
            target_rate,
            reporting_interval,
            stop_timeout: Self::DEFAULT_STOP_TIMEOUT,
        }
    }

    /// Set the iteration limit
    pub fn with_iteration_limit(mut self, limit: u64) -> Self {
        self.iteration_limit = Some(limit);
        self
    }

    /// Run until stopped
    pub fn unbounded(mut self) -> Self {
        self.iteration_limit = None;
        self
    }

    /// Set the target rate
    pub fn with_target_rate(mut self, rate: i64) -> Self {
        self.target_rate = rate;
        self
    }

    /// Disable throttling
    pub fn without_throttling(self) -> Self {
        self.with_target_rate(Self::NO_THROUGHPUT)
    }

    /// Set the reporting interval
    pub fn with_reporting_interval(mut self, interval: Duration) -> Self {
        self.reporting_interval = interval;
        self
    }

    /// Set the stop timeout
    pub fn with_stop_timeout(mut self, timeout: Duration) -> Self {
        self.stop_timeout = timeout;
        self
    }

    /// Whether the loop paces itself at all
    pub fn is_throttled(&self) -> bool {
        self.target_rate >= 0
    }

    /// Whether periodic window reports are enabled
    pub fn reports_windows(&self) -> bool {
        !self.reporting_interval.is_zero()
    }

    /// Load options from a JSON file. Missing fields take their defaults.
    pub fn from_json_file(path: impl AsRef<Path>) -> EmitResult<Self> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)?;
        serde_json::from_str(&raw)
            .map_err(|e| EmitError::config(format!("{}: {}", path.display(), e)))
    }
}

impl Default for EmitterOptions {
    fn default() -> Self {
        Self {
            iteration_limit: None,
            target_rate: 1,
            reporting_interval: Duration::from_secs(15),
            stop_timeout: Self::DEFAULT_STOP_TIMEOUT,
        }
    }
}

/// Durations as integer milliseconds on the wire
mod duration_ms {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(value.as_millis().min(u64::MAX as u128) as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_default_options() {
        let options = EmitterOptions::default();
        assert!(options.iteration_limit.is_none());
        assert_eq!(options.target_rate, 1);
        assert_eq!(options.reporting_interval, Duration::from_secs(15));
        assert_eq!(options.stop_timeout, Duration::from_secs(5));
    }

    #[test]
    fn test_options_builder_pattern() {
        let options = EmitterOptions::default()
            .with_iteration_limit(10)
            .without_throttling()
            .with_reporting_interval(Duration::ZERO)
            .with_stop_timeout(Duration::from_millis(250));

        assert_eq!(options.iteration_limit, Some(10));
        assert_eq!(options.target_rate, EmitterOptions::NO_THROUGHPUT);
        assert!(!options.is_throttled());
        assert!(!options.reports_windows());
        assert_eq!(options.stop_timeout, Duration::from_millis(250));
    }

    #[test]
    fn test_zero_rate_is_throttled() {
        let options = EmitterOptions::new(None, 0, Duration::from_secs(1));
        assert!(options.is_throttled());
        assert!(options.reports_windows());
    }

    #[test]
    fn test_options_json_format() {
        let options = EmitterOptions::new(Some(100), 50, Duration::from_secs(2));
        let json = serde_json::to_string(&options).unwrap();

        assert!(json.contains("\"iteration_limit\":100"));
        assert!(json.contains("\"target_rate\":50"));
        assert!(json.contains("\"reporting_interval\":2000"));
        assert!(json.contains("\"stop_timeout\":5000"));
    }

    #[test]
    fn test_unbounded_limit_is_omitted() {
        let options = EmitterOptions::default().unbounded();
        let json = serde_json::to_string(&options).unwrap();
        assert!(!json.contains("iteration_limit"));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let options: EmitterOptions = serde_json::from_str(r#"{"target_rate": -1}"#).unwrap();
        assert_eq!(options.target_rate, -1);
        assert!(options.iteration_limit.is_none());
        assert_eq!(options.reporting_interval, Duration::from_secs(15));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"{{"iteration_limit": 5, "target_rate": 10, "reporting_interval": 0}}"#
        )
        .unwrap();

        let options = EmitterOptions::from_json_file(file.path()).unwrap();
        assert_eq!(options.iteration_limit, Some(5));
        assert_eq!(options.target_rate, 10);
        assert!(options.reporting_interval.is_zero());
    }

    #[test]
    fn test_from_json_file_invalid() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let err = EmitterOptions::from_json_file(file.path()).unwrap_err();
        assert!(matches!(err, EmitError::Config(_)));
    }

    #[test]
    fn test_from_json_file_missing() {
        let err = EmitterOptions::from_json_file("/definitely/not/here.json").unwrap_err();
        assert!(matches!(err, EmitError::Io(_)));
    }
}
