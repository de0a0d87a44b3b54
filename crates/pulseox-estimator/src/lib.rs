//! Reference saturation and heart-rate estimator for `pulseox-vitals`.
//!
//! [`ReferenceEstimator`] plugs into a [`pulseox_vitals::VitalsSession`] as
//! its [`Estimator`]. Saturation comes from the red/infrared ratio-of-ratios,
//! heart rate from the autocorrelation of the infrared window.
//!
//! ```
//! use pulseox_estimator::ReferenceEstimator;
//! use pulseox_vitals::Estimator;
//!
//! let est = ReferenceEstimator::default();
//! let flat = est.estimate(&[30_000; 100], &[20_000; 100]);
//! assert!(!flat.spo2_valid);
//! assert!(!flat.heart_rate_valid);
//! ```

pub mod heartrate;
pub mod saturation;

pub use heartrate::{estimate_heart_rate, PulseEstimate};
pub use saturation::{estimate_spo2, ratio_of_ratios, ChannelLevels};

use pulseox_hardware::SensorConfig;
use pulseox_vitals::{Estimate, Estimator};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Tuning for [`ReferenceEstimator`].
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct EstimatorConfig {
    /// Rate at which window samples were taken, in Hz.
    pub sample_rate_hz: f64,
    /// Lowest heart rate searched, BPM.
    pub bpm_min: f64,
    /// Highest heart rate searched, BPM.
    pub bpm_max: f64,
    /// Minimum normalized autocorrelation for a valid heart rate.
    pub min_confidence: f64,
}

impl Default for EstimatorConfig {
    fn default() -> Self {
        Self {
            sample_rate_hz: 25.0,
            bpm_min: 40.0,
            bpm_max: 180.0,
            min_confidence: 0.3,
        }
    }
}

impl EstimatorConfig {
    /// Defaults with the sample rate a sensor running `sensor` delivers.
    pub fn for_sensor(sensor: &SensorConfig) -> Self {
        Self {
            sample_rate_hz: sensor.effective_sample_rate_hz(),
            ..Self::default()
        }
    }
}

/// Ratio-of-ratios saturation plus autocorrelation heart rate.
#[derive(Debug, Clone, Default)]
pub struct ReferenceEstimator {
    config: EstimatorConfig,
}

impl ReferenceEstimator {
    pub fn new(config: EstimatorConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &EstimatorConfig {
        &self.config
    }

    /// Heart-rate search with this estimator's band and threshold applied.
    pub fn pulse(&self, infrared: &[u32]) -> Option<PulseEstimate> {
        let c = &self.config;
        estimate_heart_rate(infrared, c.sample_rate_hz, c.bpm_min, c.bpm_max)
            .filter(|p| p.confidence >= c.min_confidence)
    }
}

impl Estimator for ReferenceEstimator {
    fn estimate(&self, infrared: &[u32], red: &[u32]) -> Estimate {
        let mut out = Estimate::invalid();

        if let Some(spo2) = estimate_spo2(infrared, red) {
            out.spo2 = spo2;
            out.spo2_valid = true;
        }

        if let Some(pulse) = self.pulse(infrared) {
            out.heart_rate = pulse.bpm.round() as i32;
            out.heart_rate_valid = true;
        }

        tracing::trace!(
            spo2 = out.spo2,
            spo2_valid = out.spo2_valid,
            heart_rate = out.heart_rate,
            heart_rate_valid = out.heart_rate_valid,
            "Reference estimate"
        );
        out
    }
}
