use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

/// Monotonic time source. All frame deltas and loop clocks read from one of these.
pub trait TimeSource {
    /// Time elapsed since an arbitrary, fixed origin.
    fn now(&self) -> Duration;
}

/// Wall-clock monotonic time backed by [`Instant`].
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    origin: Instant,
}

impl MonotonicClock {
    pub fn new() -> Self {
        Self {
            origin: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl TimeSource for MonotonicClock {
    fn now(&self) -> Duration {
        self.origin.elapsed()
    }
}

/// Hand-advanced clock for deterministic runs and tests.
///
/// Clones share the same underlying time, so a test can keep one handle and
/// give another to the world.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<Duration>>,
}

impl ManualClock {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn advance(&self, by: Duration) {
        self.now.set(self.now.get() + by);
    }

    pub fn advance_ms(&self, ms: u64) {
        self.advance(Duration::from_millis(ms));
    }

    pub fn set(&self, to: Duration) {
        self.now.set(to);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> Duration {
        self.now.get()
    }
}

/// Delta tracker over a [`TimeSource`]: each call to [`Stopwatch::delta`]
/// returns the time since the previous call (zero on the first call after a reset).
#[derive(Debug, Clone, Copy, Default)]
pub struct Stopwatch {
    started: Option<Duration>,
    last: Option<Duration>,
}

impl Stopwatch {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start (or restart) measuring from `now`.
    pub fn reset(&mut self, now: Duration) {
        self.started = Some(now);
        self.last = Some(now);
    }

    /// Seconds since the previous call.
    pub fn delta(&mut self, now: Duration) -> f64 {
        let last = self.last.unwrap_or(now);
        if self.started.is_none() {
            self.started = Some(now);
        }
        self.last = Some(now);
        now.saturating_sub(last).as_secs_f64()
    }

    /// Seconds since the last reset (or first delta).
    pub fn elapsed(&self, now: Duration) -> f64 {
        self.started
            .map(|s| now.saturating_sub(s).as_secs_f64())
            .unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_clones_share_time() {
        let a = ManualClock::new();
        let b = a.clone();
        a.advance_ms(16);
        assert_eq!(b.now(), Duration::from_millis(16));
        b.set(Duration::from_secs(2));
        assert_eq!(a.now(), Duration::from_secs(2));
    }

    #[test]
    fn stopwatch_first_delta_is_zero() {
        let clock = ManualClock::new();
        clock.advance_ms(500);
        let mut sw = Stopwatch::new();
        assert_eq!(sw.delta(clock.now()), 0.0);
        clock.advance_ms(250);
        assert_eq!(sw.delta(clock.now()), 0.25);
        assert_eq!(sw.elapsed(clock.now()), 0.25);
    }

    #[test]
    fn stopwatch_reset_restarts_elapsed() {
        let clock = ManualClock::new();
        let mut sw = Stopwatch::new();
        sw.delta(clock.now());
        clock.advance_ms(1000);
        sw.reset(clock.now());
        clock.advance_ms(100);
        assert!((sw.elapsed(clock.now()) - 0.1).abs() < 1e-9);
        assert!((sw.delta(clock.now()) - 0.1).abs() < 1e-9);
    }

    #[test]
    fn monotonic_clock_does_not_go_backwards() {
        let c = MonotonicClock::new();
        let a = c.now();
        let b = c.now();
        assert!(b >= a);
    }
}
