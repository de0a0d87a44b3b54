//! Integer exponential moving average for displayed vitals.
//!
//! `smoothed = (previous * (D - K) + raw * K) / D`, with the default
//! `K = 3`, `D = 10` keeping 70% history and 30% new reading. Division
//! truncates toward zero; the first reading after a reset is taken as-is.

/// Default weight of the new reading, in `1/denominator` units.
pub const EMA_NUMERATOR: i32 = 3;
/// Default weight denominator.
pub const EMA_DENOMINATOR: i32 = 10;

/// Fixed-point EMA with weight `numerator / denominator` on the new reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmaFilter {
    numerator: i32,
    denominator: i32,
}

impl Default for EmaFilter {
    fn default() -> Self {
        Self {
            numerator: EMA_NUMERATOR,
            denominator: EMA_DENOMINATOR,
        }
    }
}

impl EmaFilter {
    /// Create a filter. Returns `None` unless `0 < numerator <= denominator`.
    pub fn new(numerator: i32, denominator: i32) -> Option<Self> {
        if numerator <= 0 || denominator <= 0 || numerator > denominator {
            return None;
        }
        Some(Self {
            numerator,
            denominator,
        })
    }

    pub fn numerator(&self) -> i32 {
        self.numerator
    }

    pub fn denominator(&self) -> i32 {
        self.denominator
    }

    /// Fold `raw` into `previous`; `None` means no estimate yet.
    pub fn update(&self, previous: Option<i32>, raw: i32) -> i32 {
        match previous {
            None => raw,
            Some(prev) => {
                let (num, den) = (i64::from(self.numerator), i64::from(self.denominator));
                let mixed = ((den - num) * i64::from(prev) + num * i64::from(raw)) / den;
                // A weighted mean of two i32 values lies between them.
                i32::try_from(mixed).unwrap_or(raw)
            }
        }
    }
}
