//! Error types for session setup.
//!
//! Steady-state problems (no finger, untrusted estimates, out-of-range
//! values) are not errors: they surface as `None` readings and `false`
//! validity flags. Only starting a session can fail.

use pulseox_hardware::DriverError;
use thiserror::Error;

/// A specialized `Result` type for session operations.
pub type SessionResult<T> = Result<T, SessionError>;

/// Invalid [`SessionConfig`](crate::SessionConfig) values.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("EMA weights {numerator}/{denominator} must satisfy 0 < numerator <= denominator")]
    EmaWeights {
        numerator: i32,
        denominator: i32,
    },

    #[error("Gain target band is empty: low {low} >= high {high}")]
    GainBand {
        low: u32,
        high: u32,
    },

    #[error("LED limits inverted: min {min} > max {max}")]
    LedLimits {
        min: u8,
        max: u8,
    },

    #[error("LED step must be non-zero")]
    ZeroLedStep,

    #[error("{field} must be non-zero")]
    ZeroInterval {
        field: &'static str,
    },

    #[error("Sane range for {vital} is empty: ({low}, {high})")]
    EmptyRange {
        vital: &'static str,
        low: i32,
        high: i32,
    },
}

/// Why a session could not start.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The sensor could not be reached or configured.
    #[error("Sensor initialisation failed: {0}")]
    Driver(#[from] DriverError),

    /// The supplied configuration is unusable.
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),
}
