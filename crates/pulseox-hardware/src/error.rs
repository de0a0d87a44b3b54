//! Error types for sensor drivers and capture parsing.

use thiserror::Error;

/// Errors reported by a [`SampleSource`](crate::SampleSource) driver.
#[derive(Debug, Error)]
pub enum DriverError {
    /// The sensor did not answer on its bus.
    #[error("Sensor not found: {detail}")]
    NotFound {
        detail: String,
    },

    /// A bus transaction failed after the sensor was found.
    #[error("Bus error during {operation}: {message}")]
    Bus {
        operation: &'static str,
        message: String,
    },

    /// The driver refused a configuration value.
    #[error("Unsupported setting {setting} = {value}")]
    UnsupportedSetting {
        setting: &'static str,
        value: u32,
    },
}

impl DriverError {
    /// Creates a bus error for the given operation.
    pub fn bus(operation: &'static str, message: impl Into<String>) -> Self {
        Self::Bus {
            operation,
            message: message.into(),
        }
    }
}

/// Errors that can occur when parsing a recorded capture.
#[derive(Debug, Error)]
pub enum ParseError {
    /// A text capture line could not be read as `infrared,red`.
    #[error("Invalid capture line {line}: {message}")]
    InvalidLine {
        line: usize,
        message: String,
    },

    /// Not enough bytes in a binary capture.
    #[error("Insufficient data: need {needed} bytes, got {got}")]
    InsufficientData {
        needed: usize,
        got: usize,
    },

    /// The binary capture header magic doesn't match.
    #[error("Invalid magic: expected {expected:#010x}, got {got:#010x}")]
    InvalidMagic {
        expected: u32,
        got: u32,
    },
}
