//! PPG sensor interface abstractions.
//!
//! This crate provides the driver-side types consumed by the vitals core:
//!
//! - **[`SampleSource`]**: the trait a sensor driver implements (probe and
//!   configure, drain FIFO samples, set emitter brightness)
//! - **[`ScriptedSource`]**: an in-memory source for tests and capture replay
//! - **[`CaptureParser`]**: reads recorded captures in text or binary form
//!
//! # Design Principles
//!
//! 1. **No bus I/O here**: register-level drivers live behind [`SampleSource`]
//! 2. **Deterministic**: the same capture bytes always yield the same samples
//!
//! # Example
//!
//! ```rust
//! use pulseox_hardware::{SampleSource, ScriptedSource, SensorConfig};
//!
//! let mut source = ScriptedSource::from_capture("30000,20000\n30100,20050\n").unwrap();
//! source.begin(&SensorConfig::default()).unwrap();
//! while source.available() {
//!     let sample = source.pop_sample().unwrap();
//!     println!("ir={} red={}", sample.infrared, sample.red);
//! }
//! ```

mod capture;
mod error;
mod sample;
mod source;

pub use capture::{CaptureParser, CAPTURE_MAGIC};
pub use error::{DriverError, ParseError};
pub use sample::{LedMode, SamplePair, SensorConfig};
pub use source::{SampleSource, ScriptedSource};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
