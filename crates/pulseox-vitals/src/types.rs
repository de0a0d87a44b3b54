//! Vital-sign domain types.

use std::fmt;

use crate::gain::BrightnessChange;
use crate::smoothing::EmaFilter;

/// Open interval of physiologically plausible raw values.
///
/// A raw value `v` is accepted when `above < v < below`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SaneRange {
    pub above: i32,
    pub below: i32,
}

impl SaneRange {
    /// Saturation: `0 < spo2 <= 100`.
    pub const SPO2: Self = Self::new(0, 101);
    /// Heart rate: `0 < bpm < 240`.
    pub const HEART_RATE: Self = Self::new(0, 240);

    pub const fn new(above: i32, below: i32) -> Self {
        Self { above, below }
    }

    pub fn contains(&self, value: i32) -> bool {
        value > self.above && value < self.below
    }

    /// No integer fits.
    pub fn is_empty(&self) -> bool {
        i64::from(self.below) - i64::from(self.above) <= 1
    }
}

/// One measured quantity: the latest raw estimate, its validity and the
/// smoothed value presented to users.
///
/// The smoothed value survives across calculation cycles; the raw value
/// and validity flag describe only the most recent one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct VitalChannel {
    raw: Option<i32>,
    valid: bool,
    smoothed: Option<i32>,
    range: SaneRange,
}

impl VitalChannel {
    pub const fn new(range: SaneRange) -> Self {
        Self {
            raw: None,
            valid: false,
            smoothed: None,
            range,
        }
    }

    /// Record one estimator result.
    ///
    /// The smoothed value only moves when the estimator flagged the value
    /// valid and it lies inside the sane range. The validity flag mirrors
    /// the estimator either way.
    pub fn record(&mut self, raw: i32, valid: bool, ema: &EmaFilter) {
        self.raw = Some(raw);
        self.valid = valid;
        if valid && self.range.contains(raw) {
            self.smoothed = Some(ema.update(self.smoothed, raw));
        }
    }

    /// Mark this cycle invalid without touching the smoothed value.
    pub fn invalidate(&mut self) {
        self.raw = None;
        self.valid = false;
    }

    /// Forget everything, including the smoothed value.
    pub fn clear(&mut self) {
        self.raw = None;
        self.valid = false;
        self.smoothed = None;
    }

    /// Smoothed value if it is presentable given `finger_present`.
    pub fn reading(&self, finger_present: bool) -> Option<i32> {
        if !finger_present || !self.valid {
            return None;
        }
        self.smoothed.filter(|&v| v > 0)
    }

    pub fn raw(&self) -> Option<i32> {
        self.raw
    }

    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Smoothed value regardless of presence or validity.
    pub fn smoothed(&self) -> Option<i32> {
        self.smoothed
    }

    pub fn range(&self) -> SaneRange {
        self.range
    }
}

/// What one `advance` call did.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct TickReport {
    /// Samples moved from the driver into the buffer.
    pub samples_drained: usize,
    /// Whether the calculation gate fired this tick.
    pub calculated: bool,
    /// Whether the estimator itself ran (requires a finger).
    pub estimated: bool,
    /// Brightness change pushed to the driver, if any.
    pub gain_change: Option<BrightnessChange>,
}

/// Diagnostic snapshot of a session. Not a stable interface.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SessionStatus {
    pub finger_detected: bool,
    pub buffer_ready: bool,
    pub spo2_valid: bool,
    pub heart_rate_valid: bool,
    pub raw_infrared: u32,
    pub raw_red: u32,
    pub led_brightness: u8,
    pub auto_gain: bool,
}

fn yes_no(v: bool) -> &'static str {
    if v {
        "Yes"
    } else {
        "No"
    }
}

impl fmt::Display for SessionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Vitals session status:")?;
        writeln!(f, "Finger: {}", yes_no(self.finger_detected))?;
        writeln!(f, "Buffer Ready: {}", yes_no(self.buffer_ready))?;
        writeln!(f, "SpO2 Valid: {}", yes_no(self.spo2_valid))?;
        writeln!(f, "HR Valid: {}", yes_no(self.heart_rate_valid))?;
        writeln!(f, "Raw IR: {}", self.raw_infrared)?;
        writeln!(f, "LED Brightness: {}", self.led_brightness)?;
        writeln!(f, "Auto-gain: {}", if self.auto_gain { "On" } else { "Off" })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sane_ranges() {
        assert!(!SaneRange::SPO2.contains(0));
        assert!(SaneRange::SPO2.contains(1));
        assert!(SaneRange::SPO2.contains(100));
        assert!(!SaneRange::SPO2.contains(101));

        assert!(SaneRange::HEART_RATE.contains(239));
        assert!(!SaneRange::HEART_RATE.contains(240));
        assert!(!SaneRange::HEART_RATE.contains(-1));

        assert!(SaneRange::new(5, 6).is_empty());
        assert!(!SaneRange::new(5, 7).is_empty());
        assert!(SaneRange::new(i32::MAX, i32::MIN).is_empty());
    }

    #[test]
    fn channel_bootstraps_then_smooths() {
        let ema = EmaFilter::default();
        let mut ch = VitalChannel::new(SaneRange::SPO2);
        ch.record(98, true, &ema);
        assert_eq!(ch.smoothed(), Some(98));
        ch.record(90, true, &ema);
        // (98 * 7 + 90 * 3) / 10 = 95.6
        assert_eq!(ch.smoothed(), Some(95));
        assert_eq!(ch.raw(), Some(90));
    }

    #[test]
    fn out_of_range_keeps_stale_value_but_reports_flag() {
        let ema = EmaFilter::default();
        let mut ch = VitalChannel::new(SaneRange::HEART_RATE);
        ch.record(72, true, &ema);
        ch.record(250, true, &ema);
        assert_eq!(ch.smoothed(), Some(72));
        assert!(ch.is_valid());

        ch.record(80, false, &ema);
        assert_eq!(ch.smoothed(), Some(72));
        assert!(!ch.is_valid());
        assert_eq!(ch.reading(true), None);
    }

    #[test]
    fn reading_requires_presence() {
        let ema = EmaFilter::default();
        let mut ch = VitalChannel::new(SaneRange::SPO2);
        ch.record(98, true, &ema);
        assert_eq!(ch.reading(true), Some(98));
        assert_eq!(ch.reading(false), None);
    }

    #[test]
    fn invalidate_and_clear() {
        let ema = EmaFilter::default();
        let mut ch = VitalChannel::new(SaneRange::SPO2);
        ch.record(97, true, &ema);
        ch.invalidate();
        assert_eq!(ch.smoothed(), Some(97));
        assert_eq!(ch.reading(true), None);
        ch.clear();
        assert_eq!(ch.smoothed(), None);
    }

    #[test]
    fn status_dump_lists_every_field() {
        let status = SessionStatus {
            finger_detected: true,
            buffer_ready: false,
            spo2_valid: true,
            heart_rate_valid: false,
            raw_infrared: 31_000,
            raw_red: 20_000,
            led_brightness: 225,
            auto_gain: true,
        };
        let text = status.to_string();
        assert!(text.contains("Finger: Yes"));
        assert!(text.contains("Buffer Ready: No"));
        assert!(text.contains("SpO2 Valid: Yes"));
        assert!(text.contains("HR Valid: No"));
        assert!(text.contains("Raw IR: 31000"));
        assert!(text.contains("LED Brightness: 225"));
        assert!(text.contains("Auto-gain: On"));
    }
}
