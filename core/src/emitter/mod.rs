//! Emitter module for generating data at a controlled rate
//!
//! The emitter is the core execution unit in datagen, responsible for the
//! simple loop: **produce -> consume -> record -> pace -> repeat**.
//!
//! An [`EmitterLoop`] owns one producer and one consumer and runs on a
//! dedicated thread until either its iteration limit is reached or a stop is
//! requested through an [`EmitterHandle`]. Each iteration:
//!
//! 1. Pulls the next item from the producer
//! 2. Hands it to the consumer and measures the delivery latency
//! 3. Records count, size and latency in a [`StatsRecorder`]
//! 4. Paces itself with a [`RateThrottler`]
//!
//! A stop request wakes a throttled loop immediately, so shutdown never waits
//! out a pacing sleep.
//!
//! # Example
//!
//! ```
//! use datagen_core::emitter::{EmitterBuilder, StopOutcome};
//! use datagen_core::{ConsumerError, EmitterOptions, ProducerError};
//!
//! let emitter = EmitterBuilder::new("datagen")
//!     .options(EmitterOptions::default().unbounded().with_target_rate(100))
//!     .producer(|| Ok::<_, ProducerError>("value".to_string()))
//!     .consumer(|_item: String| Ok::<_, ConsumerError>(()))
//!     .build()?;
//!
//! let handle = emitter.handle();
//! let worker = std::thread::spawn(move || emitter.run());
//! std::thread::sleep(std::time::Duration::from_millis(20));
//!
//! assert_eq!(handle.stop(), StopOutcome::Confirmed);
//! let summary = worker.join().expect("emitter thread panicked")?;
//! println!("Emitted: {}", summary.count);
//! # Ok::<(), datagen_core::EmitError>(())
//! ```

mod builder;
mod executor;
mod handle;
mod signal;
mod stats;
mod throttler;

pub use builder::EmitterBuilder;
pub use executor::EmitterLoop;
pub use handle::{EmitterHandle, EmitterState, StopOutcome};
pub use signal::{TerminationLatch, WakeSignal};
pub use stats::StatsRecorder;
pub use throttler::{RateThrottler, ThrottleOutcome};
