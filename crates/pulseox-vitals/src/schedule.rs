//! Interval gates decoupling sample ingestion from computation.
//!
//! Timestamps are `u32` milliseconds from a free-running counter. All
//! comparisons subtract with wrapping arithmetic, so a gate keeps working
//! when the counter rolls over (about every 49.7 days).

/// Estimator cadence.
pub const CALCULATION_INTERVAL_MS: u32 = 1_000;
/// Auto-gain cadence.
pub const GAIN_ADJUSTMENT_INTERVAL_MS: u32 = 800;

/// Whether at least `interval` ms have passed since `last_fired`.
#[inline]
pub fn due_to_fire(now: u32, last_fired: u32, interval: u32) -> bool {
    now.wrapping_sub(last_fired) >= interval
}

/// A last-fire timestamp plus a fixed period.
///
/// Being due does not arm anything: the owner calls [`mark_fired`] only when
/// it actually acts, so a skipped gate stays due on every later poll.
///
/// [`mark_fired`]: IntervalGate::mark_fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IntervalGate {
    period_ms: u32,
    last_fired_ms: u32,
}

impl IntervalGate {
    /// Create a gate whose first period starts at `start_ms`.
    pub const fn new(period_ms: u32, start_ms: u32) -> Self {
        Self {
            period_ms,
            last_fired_ms: start_ms,
        }
    }

    pub fn is_due(&self, now_ms: u32) -> bool {
        due_to_fire(now_ms, self.last_fired_ms, self.period_ms)
    }

    pub fn mark_fired(&mut self, now_ms: u32) {
        self.last_fired_ms = now_ms;
    }

    pub fn period_ms(&self) -> u32 {
        self.period_ms
    }

    pub fn last_fired_ms(&self) -> u32 {
        self.last_fired_ms
    }
}
