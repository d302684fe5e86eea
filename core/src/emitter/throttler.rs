//! Throughput throttling for the emission loop

use super::signal::WakeSignal;

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Smallest accumulated deficit worth an actual sleep
const MIN_SLEEP: Duration = Duration::from_millis(2);

/// What a call to [`RateThrottler::throttle`] did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThrottleOutcome {
    /// Throttling is disabled
    Skipped,
    /// Deficit grew but stayed under the sleep threshold
    Accumulated,
    /// Slept off the whole deficit
    Slept,
    /// A wake-up cut the wait short
    Woken,
}

/// Paces a caller to a target rate of units per second
///
/// Works in one of three regimes picked by the sign of the target rate:
/// negative disables throttling, zero blocks on every throttle call until
/// [`wakeup`](Self::wakeup), positive sleeps on average `1 / rate` seconds
/// per call. Sleeps are batched: the per-call interval accrues as a deficit
/// and is only slept off once it reaches a couple of milliseconds.
pub struct RateThrottler {
    target_rate: i64,
    start: Instant,
    sleep_interval: Duration,
    sleep_deficit: Duration,
    signal: Arc<WakeSignal>,
}

impl RateThrottler {
    /// Create a throttler woken through `signal`
    ///
    /// # Arguments
    /// * `target_rate` - Units per second. `0` blocks until woken, negative disables.
    /// * `start` - Reference point for observed-rate calculations.
    /// * `signal` - Shared wake-up latch.
    pub fn new(target_rate: i64, start: Instant, signal: Arc<WakeSignal>) -> Self {
        let sleep_interval = if target_rate > 0 {
            Duration::from_nanos(1_000_000_000 / target_rate as u64)
        } else {
            Duration::MAX
        };

        Self {
            target_rate,
            start,
            sleep_interval,
            sleep_deficit: Duration::ZERO,
            signal,
        }
    }

    /// Create a throttler with its own private wake signal
    pub fn standalone(target_rate: i64, start: Instant) -> Self {
        Self::new(target_rate, start, Arc::new(WakeSignal::new()))
    }

    /// Create a throttler that never throttles
    pub fn disabled() -> Self {
        Self::standalone(-1, Instant::now())
    }

    /// Whether the observed rate since `start` exceeds the target
    ///
    /// Always `false` when throttling is disabled or no time has elapsed.
    pub fn should_throttle(&self, total_sent: u64, now: Instant) -> bool {
        if self.target_rate < 0 {
            return false;
        }

        let elapsed = now.saturating_duration_since(self.start).as_secs_f64();
        elapsed > 0.0 && (total_sent as f64 / elapsed) > self.target_rate as f64
    }

    /// Apply throttling for one unit
    ///
    /// A wake-up that interrupts a sleep only pays down the time actually
    /// slept; the rest of the deficit carries over to the next call.
    pub fn throttle(&mut self) -> ThrottleOutcome {
        if self.target_rate < 0 {
            return ThrottleOutcome::Skipped;
        }

        if self.target_rate == 0 {
            self.signal.wait();
            return ThrottleOutcome::Woken;
        }

        self.sleep_deficit = self.sleep_deficit.saturating_add(self.sleep_interval);
        if self.sleep_deficit < MIN_SLEEP {
            return ThrottleOutcome::Accumulated;
        }

        let sleep_start = Instant::now();
        let woken = match sleep_start.checked_add(self.sleep_deficit) {
            Some(deadline) => self.signal.wait_until(deadline),
            None => {
                self.signal.wait();
                true
            }
        };

        if woken {
            self.sleep_deficit = self.sleep_deficit.saturating_sub(sleep_start.elapsed());
            ThrottleOutcome::Woken
        } else {
            self.sleep_deficit = Duration::ZERO;
            ThrottleOutcome::Slept
        }
    }

    /// Release a thread blocked in [`throttle`](Self::throttle). Callable from any thread.
    pub fn wakeup(&self) {
        self.signal.wake();
    }

    /// Shared wake signal
    pub fn signal(&self) -> &Arc<WakeSignal> {
        &self.signal
    }

    /// Check if throttling is enabled
    pub fn is_enabled(&self) -> bool {
        self.target_rate >= 0
    }

    /// Configured target rate
    pub fn target_rate(&self) -> i64 {
        self.target_rate
    }

    /// Time owed per throttled unit (`Duration::MAX` unless the rate is positive)
    pub fn sleep_interval(&self) -> Duration {
        self.sleep_interval
    }

    /// Accumulated sleep not yet taken
    pub fn sleep_deficit(&self) -> Duration {
        self.sleep_deficit
    }
}

impl std::fmt::Debug for RateThrottler {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RateThrottler")
            .field("target_rate", &self.target_rate)
            .field("enabled", &self.is_enabled())
            .field("sleep_deficit", &self.sleep_deficit)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicBool, Ordering};
    use std::thread;

    #[test]
    fn test_throttler_disabled() {
        let mut throttler = RateThrottler::disabled();
        assert!(!throttler.is_enabled());

        let start = Instant::now();
        for _ in 0..10_000 {
            assert_eq!(throttler.throttle(), ThrottleOutcome::Skipped);
        }
        assert!(start.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_should_throttle_disabled() {
        let start = Instant::now();
        let throttler = RateThrottler::standalone(-10, start);
        assert!(!throttler.should_throttle(u64::MAX, start + Duration::from_secs(1)));
    }

    #[test]
    fn test_should_throttle_above_rate() {
        let start = Instant::now();
        let throttler = RateThrottler::standalone(10, start);
        let now = start + Duration::from_secs(1);

        assert!(throttler.should_throttle(20, now));
        assert!(!throttler.should_throttle(10, now));
        assert!(!throttler.should_throttle(5, now));
    }

    #[test]
    fn test_should_throttle_no_elapsed_time() {
        let start = Instant::now();
        let throttler = RateThrottler::standalone(10, start + Duration::from_secs(5));
        assert!(!throttler.should_throttle(1_000, start));
        assert!(!throttler.should_throttle(1_000, start + Duration::from_secs(5)));
    }

    #[test]
    fn test_sleep_interval() {
        let throttler = RateThrottler::standalone(100, Instant::now());
        assert_eq!(throttler.sleep_interval(), Duration::from_millis(10));
        assert!(throttler.is_enabled());
    }

    #[test]
    fn test_small_deficit_accumulates() {
        let mut throttler = RateThrottler::standalone(1_000, Instant::now());

        assert_eq!(throttler.throttle(), ThrottleOutcome::Accumulated);
        assert_eq!(throttler.sleep_deficit(), Duration::from_millis(1));

        assert_eq!(throttler.throttle(), ThrottleOutcome::Slept);
        assert_eq!(throttler.sleep_deficit(), Duration::ZERO);
    }

    #[test]
    fn test_positive_rate_paces_caller() {
        let mut throttler = RateThrottler::standalone(1_000, Instant::now());
        let start = Instant::now();
        for _ in 0..200 {
            throttler.throttle();
        }
        let elapsed = start.elapsed();

        // 200 units at 1000/s is 200ms
        assert!(elapsed >= Duration::from_millis(190), "too fast: {:?}", elapsed);
        assert!(elapsed < Duration::from_millis(800), "too slow: {:?}", elapsed);
    }

    #[test]
    fn test_zero_rate_blocks_until_wakeup() {
        let signal = Arc::new(WakeSignal::new());
        let mut throttler = RateThrottler::new(0, Instant::now(), Arc::clone(&signal));
        let done = Arc::new(AtomicBool::new(false));

        let handle = {
            let done = Arc::clone(&done);
            thread::spawn(move || {
                let outcome = throttler.throttle();
                done.store(true, Ordering::SeqCst);
                outcome
            })
        };

        thread::sleep(Duration::from_millis(50));
        assert!(!done.load(Ordering::SeqCst));

        let woke_at = Instant::now();
        signal.wake();
        assert_eq!(handle.join().unwrap(), ThrottleOutcome::Woken);
        assert!(woke_at.elapsed() < Duration::from_secs(1));
    }

    #[test]
    fn test_wakeup_before_throttle_is_not_lost() {
        let mut throttler = RateThrottler::standalone(0, Instant::now());
        throttler.wakeup();
        assert_eq!(throttler.throttle(), ThrottleOutcome::Woken);
    }

    #[test]
    fn test_interrupted_sleep_keeps_remaining_deficit() {
        let signal = Arc::new(WakeSignal::new());
        // One unit owes a full second
        let mut throttler = RateThrottler::new(1, Instant::now(), Arc::clone(&signal));

        let handle = thread::spawn(move || {
            let outcome = throttler.throttle();
            (outcome, throttler.sleep_deficit())
        });

        thread::sleep(Duration::from_millis(50));
        signal.wake();

        let (outcome, deficit) = handle.join().unwrap();
        assert_eq!(outcome, ThrottleOutcome::Woken);
        assert!(deficit < Duration::from_millis(960), "deficit {:?}", deficit);
        assert!(deficit > Duration::from_millis(500), "deficit {:?}", deficit);
    }

    #[test]
    fn test_throttler_debug() {
        let throttler = RateThrottler::standalone(100, Instant::now());
        let debug = format!("{:?}", throttler);
        assert!(debug.contains("RateThrottler"));
        assert!(debug.contains("100"));
        assert!(debug.contains("true"));
    }
}
