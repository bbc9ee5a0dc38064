//! Frame time sources
//!
//! The per-tick update takes its `dt` from an explicit [`Clock`] instead of a
//! process-wide timer, so tests can drive it with a fixed step.

use std::time::{Duration, Instant};

/// Yields the time elapsed since the previous tick
pub trait Clock {
    fn delta(&mut self) -> Duration;
}

/// Wall-clock time between successive calls
#[derive(Debug)]
pub struct SystemClock {
    last: Instant,
}

impl SystemClock {
    pub fn new() -> Self {
        Self {
            last: Instant::now(),
        }
    }
}

impl Default for SystemClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for SystemClock {
    fn delta(&mut self) -> Duration {
        let now = Instant::now();
        let dt = now.saturating_duration_since(self.last);
        self.last = now;
        dt
    }
}

/// Deterministic clock: every tick is exactly `step` long
#[cfg(test)]
#[derive(Debug, Clone)]
pub struct FixedStepClock {
    step: Duration,
    ticks: u64,
}

#[cfg(test)]
impl FixedStepClock {
    pub fn new(step: Duration) -> Self {
        Self { step, ticks: 0 }
    }

    pub fn from_secs_f32(secs: f32) -> Self {
        Self::new(Duration::from_secs_f32(secs))
    }

    /// Number of ticks handed out so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }
}

#[cfg(test)]
impl Clock for FixedStepClock {
    fn delta(&mut self) -> Duration {
        self.ticks += 1;
        self.step
    }
}
