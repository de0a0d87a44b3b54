//! Millisecond time sources for the session.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// A free-running millisecond counter.
///
/// Readings may wrap; consumers compare them with wrapping subtraction.
pub trait Clock {
    fn now_ms(&self) -> u32;
}

/// Wall-clock time since construction, truncated to `u32` milliseconds.
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

impl Clock for MonotonicClock {
    #[allow(clippy::cast_possible_truncation)]
    fn now_ms(&self) -> u32 {
        // Truncation is the wraparound.
        self.origin.elapsed().as_millis() as u32
    }
}

/// Hand-driven clock for tests and capture replay.
///
/// Clones share the same counter, so a handle kept outside the session can
/// move time forward after the session has taken ownership of its copy.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    now: Rc<Cell<u32>>,
}

impl ManualClock {
    pub fn new(start_ms: u32) -> Self {
        Self {
            now: Rc::new(Cell::new(start_ms)),
        }
    }

    pub fn set(&self, now_ms: u32) {
        self.now.set(now_ms);
    }

    /// Move forward by `delta_ms`, wrapping like a hardware counter.
    pub fn advance(&self, delta_ms: u32) {
        self.now.set(self.now.get().wrapping_add(delta_ms));
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u32 {
        self.now.get()
    }
}

impl<C: Clock + ?Sized> Clock for &C {
    fn now_ms(&self) -> u32 {
        (**self).now_ms()
    }
}
