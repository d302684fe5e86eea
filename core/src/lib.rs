//! datagen-core: Core engine for real-time data emission
//!
//! This crate provides the pieces a data generator needs to push items
//! downstream at a controlled pace, including:
//!
//! - The emission loop and its stop handle
//! - Rate throttling with interruptible sleeps
//! - Windowed and final throughput/latency statistics
//! - Core traits (Producer, Consumer, Emitted)
//! - Error handling

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod config;
pub mod emitter;
pub mod error;
pub mod metrics;
pub mod record;
pub mod traits;

pub use config::EmitterOptions;
pub use emitter::{
    EmitterBuilder, EmitterHandle, EmitterLoop, EmitterState, RateThrottler, StatsRecorder,
    StopOutcome, ThrottleOutcome,
};
pub use error::*;
pub use metrics::*;
pub use record::*;
pub use traits::*;

#[cfg(test)]
mod integration_tests {
    use super::*;
    use serde_json::json;
    use std::time::Duration;

    // =========================================================================
    // Round-trip serialization tests
    // =========================================================================

    #[test]
    fn test_options_roundtrip() {
        let options = EmitterOptions::default()
            .with_iteration_limit(1_000)
            .with_target_rate(250)
            .with_reporting_interval(Duration::from_secs(2));
        let json = serde_json::to_string(&options).unwrap();
        let deserialized: EmitterOptions = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, options);
    }

    #[test]
    fn test_record_roundtrip() {
        let record = Record::new(7, json!({"user": "ada", "score": 42}));
        let json = serde_json::to_string(&record).unwrap();
        let deserialized: Record = serde_json::from_str(&json).unwrap();

        assert_eq!(deserialized, record);
    }

    // =========================================================================
    // JSON format tests
    // =========================================================================

    #[test]
    fn test_options_json_format() {
        let json = serde_json::to_string(&EmitterOptions::default()).unwrap();

        // Unbounded runs omit the limit; durations are milliseconds
        assert!(!json.contains("iteration_limit"));
        assert!(json.contains("\"target_rate\":1"));
        assert!(json.contains("\"reporting_interval\":15000"));
        assert!(json.contains("\"stop_timeout\":5000"));
    }

    #[test]
    fn test_options_partial_json_uses_defaults() {
        let options: EmitterOptions =
            serde_json::from_str(r#"{"iteration_limit": 10, "target_rate": -1}"#).unwrap();

        assert_eq!(options.iteration_limit, Some(10));
        assert!(!options.is_throttled());
        assert_eq!(options.reporting_interval, Duration::from_secs(15));
        assert_eq!(options.stop_timeout, EmitterOptions::DEFAULT_STOP_TIMEOUT);
    }

    #[test]
    fn test_sequence_serializes_as_number() {
        let record = Record::new(3, json!(null));
        let json = serde_json::to_string(&record).unwrap();

        assert!(json.contains("\"seq\":3"));
        assert!(json.contains("\"size\":0"));
    }

    // =========================================================================
    // End-to-end
    // =========================================================================

    #[test]
    fn test_records_through_builder() {
        let mut seq = 0u64;
        let emitter = EmitterBuilder::new("integration")
            .options(
                EmitterOptions::default()
                    .with_iteration_limit(4)
                    .without_throttling(),
            )
            .producer(move || {
                seq += 1;
                Ok::<_, ProducerError>(Record::new(seq, json!("ab")))
            })
            .consumer(|_record: Record| Ok::<_, ConsumerError>(()))
            .build()
            .unwrap();

        let summary = emitter.run().unwrap();

        // "ab" encodes as 4 bytes including quotes
        assert_eq!(summary.count, 4);
        assert_eq!(summary.total_bytes, 16);
    }
}
