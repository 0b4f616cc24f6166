//! Timers and randomized delays
//!
//! All time is wall-clock milliseconds supplied by the host. Nothing here reads
//! a clock or an OS random source, so a session replays identically from a seed.

use std::fmt;

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

/// Source of the randomized danger-cue delay
pub trait DelaySource: fmt::Debug {
    /// Next delay in `[min_ms, max_ms)`
    fn next_delay_ms(&mut self, min_ms: f64, max_ms: f64) -> f64;
}

/// Uniform delays from a seeded PCG stream
#[derive(Debug, Clone)]
pub struct SeededDelays {
    seed: u64,
    rng: Pcg32,
}

impl SeededDelays {
    pub fn new(seed: u64) -> Self {
        Self {
            seed,
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn seed(&self) -> u64 {
        self.seed
    }
}

impl DelaySource for SeededDelays {
    fn next_delay_ms(&mut self, min_ms: f64, max_ms: f64) -> f64 {
        if max_ms <= min_ms {
            return min_ms;
        }
        self.rng.random_range(min_ms..max_ms)
    }
}

/// Scripted delays, cycled in order. Ignores the range.
#[derive(Debug, Clone)]
pub struct FixedDelays {
    delays: Vec<f64>,
    next: usize,
}

impl FixedDelays {
    pub fn new(delays: Vec<f64>) -> Self {
        Self {
            delays,
            next: 0,
        }
    }
}

impl DelaySource for FixedDelays {
    fn next_delay_ms(&mut self, min_ms: f64, _max_ms: f64) -> f64 {
        if self.delays.is_empty() {
            return min_ms;
        }
        let delay = self.delays[self.next % self.delays.len()];
        self.next = self.next.wrapping_add(1);
        delay
    }
}

/// Fixed-rate repeating task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Interval {
    period_ms: f64,
    next_due: f64,
}

impl Interval {
    /// First firing one period after `now`
    pub fn starting_at(period_ms: f64, now: f64) -> Self {
        Self {
            period_ms,
            next_due: now + period_ms,
        }
    }

    pub fn next_due(&self) -> f64 {
        self.next_due
    }

    pub fn is_due(&self, now: f64) -> bool {
        self.next_due <= now
    }

    /// Consume one firing; returns the time it was due
    pub fn fire(&mut self) -> f64 {
        let at = self.next_due;
        self.next_due += self.period_ms;
        at
    }

    /// Drop every firing due at or before `now`, keeping the phase
    pub fn skip_to(&mut self, now: f64) {
        if self.next_due <= now {
            let missed = ((now - self.next_due) / self.period_ms).floor() + 1.0;
            self.next_due += missed * self.period_ms;
        }
    }
}

impl fmt::Display for Interval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "every {}ms (next at {})", self.period_ms, self.next_due)
    }
}
