//! Session configuration.
//!
//! Defaults reproduce the tuning the sensor class was calibrated with; a
//! deployment normally only overrides the finger threshold or gain band.

use pulseox_hardware::SensorConfig;

use crate::error::ConfigError;
use crate::gain::GainConfig;
use crate::presence::FINGER_THRESHOLD;
use crate::schedule::CALCULATION_INTERVAL_MS;
use crate::smoothing::{EMA_DENOMINATOR, EMA_NUMERATOR};
use crate::types::SaneRange;

/// Everything a [`VitalsSession`](crate::VitalsSession) needs besides its
/// collaborators.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct SessionConfig {
    /// Infrared level at or above which a finger is present.
    pub finger_threshold: u32,
    /// Minimum time between estimator runs.
    pub calculation_interval_ms: u32,
    /// EMA weight of a new reading, over `ema_denominator`.
    pub ema_numerator: i32,
    pub ema_denominator: i32,
    /// Raw saturation values outside this range never reach the filter.
    pub spo2_range: SaneRange,
    /// Raw heart-rate values outside this range never reach the filter.
    pub heart_rate_range: SaneRange,
    /// Whether auto-gain starts enabled.
    pub auto_gain: bool,
    pub gain: GainConfig,
    /// Acquisition settings passed to the driver on `begin`.
    pub sensor: SensorConfig,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            finger_threshold: FINGER_THRESHOLD,
            calculation_interval_ms: CALCULATION_INTERVAL_MS,
            ema_numerator: EMA_NUMERATOR,
            ema_denominator: EMA_DENOMINATOR,
            spo2_range: SaneRange::SPO2,
            heart_rate_range: SaneRange::HEART_RATE,
            auto_gain: true,
            gain: GainConfig::default(),
            sensor: SensorConfig::default(),
        }
    }
}

impl SessionConfig {
    /// Check every field for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns the first inconsistency found.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.ema_numerator <= 0
            || self.ema_denominator <= 0
            || self.ema_numerator > self.ema_denominator
        {
            return Err(ConfigError::EmaWeights {
                numerator: self.ema_numerator,
                denominator: self.ema_denominator,
            });
        }

        if self.calculation_interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "calculation_interval_ms",
            });
        }

        for (vital, range) in [("spo2", self.spo2_range), ("heart_rate", self.heart_rate_range)] {
            if range.is_empty() {
                return Err(ConfigError::EmptyRange {
                    vital,
                    low: range.above,
                    high: range.below,
                });
            }
        }

        let gain = &self.gain;
        if gain.ir_target_low >= gain.ir_target_high {
            return Err(ConfigError::GainBand {
                low: gain.ir_target_low,
                high: gain.ir_target_high,
            });
        }
        if gain.led_min > gain.led_max {
            return Err(ConfigError::LedLimits {
                min: gain.led_min,
                max: gain.led_max,
            });
        }
        if gain.led_step == 0 {
            return Err(ConfigError::ZeroLedStep);
        }
        if gain.interval_ms == 0 {
            return Err(ConfigError::ZeroInterval {
                field: "gain.interval_ms",
            });
        }

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_are_valid() {
        let cfg = SessionConfig::default();
        assert_eq!(cfg.validate(), Ok(()));
        assert_eq!(cfg.finger_threshold, 15_000);
        assert_eq!(cfg.calculation_interval_ms, 1_000);
        assert_eq!(cfg.gain.interval_ms, 800);
        assert!(cfg.auto_gain);
    }

    #[test]
    fn rejects_bad_ema() {
        let cfg = SessionConfig {
            ema_numerator: 12,
            ..SessionConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::EmaWeights { .. })));
    }

    #[test]
    fn rejects_empty_gain_band() {
        let mut cfg = SessionConfig::default();
        cfg.gain.ir_target_low = 90_000;
        assert_eq!(
            cfg.validate(),
            Err(ConfigError::GainBand {
                low: 90_000,
                high: 90_000
            })
        );
    }

    #[test]
    fn rejects_inverted_led_limits_and_zero_step() {
        let mut cfg = SessionConfig::default();
        cfg.gain.led_min = 200;
        cfg.gain.led_max = 100;
        assert!(matches!(cfg.validate(), Err(ConfigError::LedLimits { .. })));

        let mut cfg = SessionConfig::default();
        cfg.gain.led_step = 0;
        assert_eq!(cfg.validate(), Err(ConfigError::ZeroLedStep));
    }

    #[test]
    fn rejects_zero_intervals() {
        let cfg = SessionConfig {
            calculation_interval_ms: 0,
            ..SessionConfig::default()
        };
        assert!(matches!(cfg.validate(), Err(ConfigError::ZeroInterval { .. })));
    }

    #[test]
    fn rejects_empty_sane_range() {
        let cfg = SessionConfig {
            heart_rate_range: SaneRange::new(100, 50),
            ..SessionConfig::default()
        };
        assert!(matches!(
            cfg.validate(),
            Err(ConfigError::EmptyRange { vital: "heart_rate", .. })
        ));
    }

    #[cfg(feature = "serde")]
    #[test]
    fn partial_json_fills_defaults() {
        let cfg: SessionConfig = serde_json::from_str(r#"{"finger_threshold": 20000}"#).unwrap();
        assert_eq!(cfg.finger_threshold, 20_000);
        assert_eq!(cfg.gain, GainConfig::default());
    }
}
