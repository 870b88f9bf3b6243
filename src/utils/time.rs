use std::sync::atomic::{AtomicU64, Ordering};

#[cfg(not(target_arch = "wasm32"))]
use std::time::{Duration, Instant};

#[cfg(target_arch = "wasm32")]
use web_time::{Duration, Instant};

/// A monotonic time source shared (read-only) by animation managers.
pub trait Clock: Send + Sync {
    /// Current time in seconds.
    fn now_seconds(&self) -> f64;
}

/// Wall-clock timer for tracking frame timing and elapsed time.
///
/// As a [`Clock`] it reports the live time since creation, independent of
/// when [`tick`](Self::tick) was last called.
pub struct Timer {
    start_time: Instant,
    last_update: Instant,
    /// Time since last tick
    pub delta: Duration,
    /// Total elapsed time at the last tick
    pub elapsed: Duration,
    /// Total number of ticks
    pub frame_count: u64,
}

impl Default for Timer {
    fn default() -> Self {
        Self::new()
    }
}

impl Timer {
    /// Creates a new timer starting from now.
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start_time: now,
            last_update: now,
            delta: Duration::ZERO,
            elapsed: Duration::ZERO,
            frame_count: 0,
        }
    }

    /// Advances the frame statistics.
    pub fn tick(&mut self) {
        let now = Instant::now();
        self.delta = now - self.last_update;
        self.elapsed = now - self.start_time;
        self.last_update = now;
        self.frame_count += 1;
    }

    #[must_use]
    pub fn dt_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }
}

impl Clock for Timer {
    fn now_seconds(&self) -> f64 {
        self.start_time.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to.
///
/// Used for fixed-step simulation, offline baking and tests.
#[derive(Debug, Default)]
pub struct ManualClock {
    bits: AtomicU64,
}

impl ManualClock {
    #[must_use]
    pub fn new(seconds: f64) -> Self {
        Self {
            bits: AtomicU64::new(seconds.to_bits()),
        }
    }

    pub fn set(&self, seconds: f64) {
        self.bits.store(seconds.to_bits(), Ordering::Relaxed);
    }

    pub fn advance(&self, dt: f64) {
        self.set(self.now_seconds() + dt);
    }
}

impl Clock for ManualClock {
    fn now_seconds(&self) -> f64 {
        f64::from_bits(self.bits.load(Ordering::Relaxed))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_steps() {
        let clock = ManualClock::new(1.5);
        assert_eq!(clock.now_seconds(), 1.5);
        clock.advance(0.25);
        assert_eq!(clock.now_seconds(), 1.75);
        clock.set(0.0);
        assert_eq!(clock.now_seconds(), 0.0);
    }

    #[test]
    fn timer_is_monotonic() {
        let mut timer = Timer::new();
        let a = timer.now_seconds();
        timer.tick();
        let b = timer.now_seconds();
        assert!(b >= a);
        assert_eq!(timer.frame_count, 1);
    }
}
