//! Fixed-capacity rolling window of PPG sample pairs.
//!
//! Infrared and red readings are kept in two parallel arrays, the layout
//! estimators expect. The window only becomes statistically usable once
//! it has been filled end to end.

use pulseox_hardware::SamplePair;

/// Window length handed to the estimator (4 s at 25 Hz).
pub const WINDOW_LEN: usize = 100;

/// Circular store of the most recent `N` sample pairs.
#[derive(Debug, Clone)]
pub struct RollingBuffer<const N: usize = WINDOW_LEN> {
    infrared: [u32; N],
    red: [u32; N],
    /// Next slot to overwrite.
    cursor: usize,
    /// Latched once `N` samples have been written since the last reset.
    ready: bool,
}

/// Buffer contents unrolled into chronological order (oldest first).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Window<const N: usize = WINDOW_LEN> {
    pub infrared: [u32; N],
    pub red: [u32; N],
}

impl<const N: usize> Default for RollingBuffer<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> RollingBuffer<N> {
    /// Create an empty buffer.
    pub const fn new() -> Self {
        assert!(N > 0, "rolling buffer capacity must be non-zero");
        Self {
            infrared: [0; N],
            red: [0; N],
            cursor: 0,
            ready: false,
        }
    }

    /// Write one sample at the cursor and advance it.
    pub fn push(&mut self, sample: SamplePair) {
        self.infrared[self.cursor] = sample.infrared;
        self.red[self.cursor] = sample.red;
        self.cursor = (self.cursor + 1) % N;

        if !self.ready && self.cursor == 0 {
            self.ready = true;
        }
    }

    /// Whether `N` samples have been written since the last reset.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    /// Number of valid samples held (saturates at `N`).
    pub fn len(&self) -> usize {
        if self.ready {
            N
        } else {
            self.cursor
        }
    }

    /// True when nothing has been written since the last reset.
    pub fn is_empty(&self) -> bool {
        !self.ready && self.cursor == 0
    }

    /// Capacity `N`.
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Slot the next sample will overwrite.
    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Raw infrared storage, in slot order.
    pub fn infrared(&self) -> &[u32; N] {
        &self.infrared
    }

    /// Raw red storage, in slot order.
    pub fn red(&self) -> &[u32; N] {
        &self.red
    }

    /// Copy the contents out oldest-first.
    ///
    /// Before the buffer is ready the unwritten tail is zero-filled.
    pub fn window(&self) -> Window<N> {
        let mut window = Window {
            infrared: [0; N],
            red: [0; N],
        };

        if self.ready {
            // Oldest sample sits at the cursor.
            let head = self.cursor;
            let tail = N - head;
            window.infrared[..tail].copy_from_slice(&self.infrared[head..]);
            window.infrared[tail..].copy_from_slice(&self.infrared[..head]);
            window.red[..tail].copy_from_slice(&self.red[head..]);
            window.red[tail..].copy_from_slice(&self.red[..head]);
        } else {
            window.infrared[..self.cursor].copy_from_slice(&self.infrared[..self.cursor]);
            window.red[..self.cursor].copy_from_slice(&self.red[..self.cursor]);
        }

        window
    }

    /// Zero both sequences and forget readiness.
    pub fn reset(&mut self) {
        self.infrared.fill(0);
        self.red.fill(0);
        self.cursor = 0;
        self.ready = false;
    }
}
