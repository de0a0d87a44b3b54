//! Sample and acquisition-setting types shared by every sensor driver.
//!
//! These types are driver-agnostic: a MAX3010x FIFO reader, a replayed
//! capture file, or a test script all produce the same [`SamplePair`].

use serde::{Deserialize, Serialize};

use crate::error::DriverError;

/// One instant's raw light-intensity readings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SamplePair {
    /// Infrared channel ADC count.
    pub infrared: u32,
    /// Red channel ADC count.
    pub red: u32,
}

impl SamplePair {
    /// Create a sample pair.
    pub const fn new(infrared: u32, red: u32) -> Self {
        Self { infrared, red }
    }
}

impl From<(u32, u32)> for SamplePair {
    fn from((infrared, red): (u32, u32)) -> Self {
        Self { infrared, red }
    }
}

/// Which emitters the sensor drives during acquisition.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum LedMode {
    /// Red only (heart rate).
    RedOnly,
    /// Red and infrared (saturation + heart rate).
    RedIr,
    /// Red, infrared and green.
    MultiLed,
}

impl LedMode {
    /// Register encoding used by MAX3010x-class parts.
    pub fn register_value(&self) -> u8 {
        match self {
            LedMode::RedOnly => 1,
            LedMode::RedIr => 2,
            LedMode::MultiLed => 3,
        }
    }
}

/// Acquisition settings handed to the driver when a session begins.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SensorConfig {
    /// Initial emitter drive level (0 = off, 255 = maximum current).
    pub led_brightness: u8,
    /// Hardware sample averaging (1, 2, 4, 8, 16 or 32).
    pub sample_average: u8,
    /// Active emitters.
    pub led_mode: LedMode,
    /// ADC sample rate in Hz.
    pub sample_rate_hz: u16,
    /// LED pulse width in microseconds.
    pub pulse_width_us: u16,
    /// ADC full-scale range in nA.
    pub adc_range: u16,
    /// Green emitter drive level; unused for SpO2 and normally 0.
    pub green_brightness: u8,
}

impl Default for SensorConfig {
    fn default() -> Self {
        Self {
            led_brightness: 220,
            sample_average: 8,
            led_mode: LedMode::RedIr,
            sample_rate_hz: 100,
            pulse_width_us: 411,
            adc_range: 16384,
            green_brightness: 0,
        }
    }
}

impl SensorConfig {
    /// Hardware averaging factors the FIFO supports.
    pub const SAMPLE_AVERAGES: [u8; 6] = [1, 2, 4, 8, 16, 32];
    /// ADC rates the sensor supports, in Hz.
    pub const SAMPLE_RATES_HZ: [u16; 8] = [50, 100, 200, 400, 800, 1000, 1600, 3200];
    /// LED pulse widths the sensor supports, in microseconds.
    pub const PULSE_WIDTHS_US: [u16; 4] = [69, 118, 215, 411];
    /// ADC full-scale ranges the sensor supports, in nA.
    pub const ADC_RANGES: [u16; 4] = [2048, 4096, 8192, 16384];

    /// Check every register-backed field against the values the sensor
    /// accepts.
    ///
    /// # Errors
    ///
    /// Returns [`DriverError::UnsupportedSetting`] for the first field the
    /// sensor cannot be programmed with.
    pub fn check_supported(&self) -> Result<(), DriverError> {
        fn unsupported(setting: &'static str, value: impl Into<u32>) -> DriverError {
            DriverError::UnsupportedSetting {
                setting,
                value: value.into(),
            }
        }

        if !Self::SAMPLE_AVERAGES.contains(&self.sample_average) {
            return Err(unsupported("sample_average", self.sample_average));
        }
        if !Self::SAMPLE_RATES_HZ.contains(&self.sample_rate_hz) {
            return Err(unsupported("sample_rate_hz", self.sample_rate_hz));
        }
        if !Self::PULSE_WIDTHS_US.contains(&self.pulse_width_us) {
            return Err(unsupported("pulse_width_us", self.pulse_width_us));
        }
        if !Self::ADC_RANGES.contains(&self.adc_range) {
            return Err(unsupported("adc_range", self.adc_range));
        }
        Ok(())
    }

    /// Effective rate at which samples reach the FIFO, after averaging.
    pub fn effective_sample_rate_hz(&self) -> f64 {
        f64::from(self.sample_rate_hz) / f64::from(self.sample_average.max(1))
    }
}
