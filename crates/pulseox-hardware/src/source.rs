//! The driver seam: anything that yields PPG samples and accepts an
//! emitter drive level.

use std::collections::VecDeque;

use crate::capture::CaptureParser;
use crate::error::{DriverError, ParseError};
use crate::sample::{SamplePair, SensorConfig};

/// A PPG sensor driver.
///
/// The vitals session owns exactly one source and is its only caller.
/// Implementations perform their own bus I/O; nothing above this trait
/// touches registers.
pub trait SampleSource {
    /// Probe the sensor and apply the acquisition settings.
    ///
    /// # Errors
    ///
    /// Returns an error if the sensor is unreachable or rejects a setting.
    fn begin(&mut self, config: &SensorConfig) -> Result<(), DriverError>;

    /// Whether at least one unread sample is waiting.
    fn available(&mut self) -> bool;

    /// Take the oldest unread sample.
    fn pop_sample(&mut self) -> Option<SamplePair>;

    /// Set the red and infrared emitter drive level.
    ///
    /// # Errors
    ///
    /// Returns an error if the write did not reach the sensor.
    fn set_brightness(&mut self, level: u8) -> Result<(), DriverError>;

    /// Keep-alive hook, called once per session tick after all other work.
    fn poll(&mut self) {}
}

/// In-memory sample source fed from a script or a recorded capture.
///
/// Records every brightness write so callers can inspect what the gain
/// loop asked for.
#[derive(Debug, Default)]
pub struct ScriptedSource {
    pending: VecDeque<SamplePair>,
    brightness: Option<u8>,
    brightness_writes: Vec<u8>,
    applied_config: Option<SensorConfig>,
    reachable: bool,
    reject_brightness: bool,
    polls: u64,
}

impl ScriptedSource {
    /// Create an empty, reachable source.
    pub fn new() -> Self {
        Self {
            reachable: true,
            ..Self::default()
        }
    }

    /// Create a source whose `begin` fails, as if nothing answered on the bus.
    pub fn unreachable() -> Self {
        Self {
            reachable: false,
            ..Self::default()
        }
    }

    /// Build a source preloaded with every sample in a text capture.
    ///
    /// # Errors
    ///
    /// Returns the first malformed line.
    pub fn from_capture(text: &str) -> Result<Self, ParseError> {
        let mut source = Self::new();
        source.extend(CaptureParser::parse_text(text)?);
        Ok(source)
    }

    /// Queue one sample.
    pub fn push(&mut self, sample: SamplePair) {
        self.pending.push_back(sample);
    }

    /// Queue `count` copies of the same sample.
    pub fn push_repeated(&mut self, sample: SamplePair, count: usize) {
        self.pending.extend(std::iter::repeat(sample).take(count));
    }

    /// Make subsequent brightness writes fail.
    pub fn set_reject_brightness(&mut self, reject: bool) {
        self.reject_brightness = reject;
    }

    /// Number of queued samples.
    pub fn pending(&self) -> usize {
        self.pending.len()
    }

    /// Last brightness accepted by the source, if any.
    pub fn brightness(&self) -> Option<u8> {
        self.brightness
    }

    /// Every accepted brightness write, in order.
    pub fn brightness_writes(&self) -> &[u8] {
        &self.brightness_writes
    }

    /// Settings applied by the last successful `begin`.
    pub fn applied_config(&self) -> Option<&SensorConfig> {
        self.applied_config.as_ref()
    }

    /// Number of keep-alive polls received.
    pub fn polls(&self) -> u64 {
        self.polls
    }
}

impl Extend<SamplePair> for ScriptedSource {
    fn extend<I: IntoIterator<Item = SamplePair>>(&mut self, iter: I) {
        self.pending.extend(iter);
    }
}

impl SampleSource for ScriptedSource {
    fn begin(&mut self, config: &SensorConfig) -> Result<(), DriverError> {
        if !self.reachable {
            return Err(DriverError::NotFound {
                detail: "scripted source marked unreachable".into(),
            });
        }
        config.check_supported()?;
        self.brightness = Some(config.led_brightness);
        self.applied_config = Some(config.clone());
        Ok(())
    }

    fn available(&mut self) -> bool {
        !self.pending.is_empty()
    }

    fn pop_sample(&mut self) -> Option<SamplePair> {
        self.pending.pop_front()
    }

    fn set_brightness(&mut self, level: u8) -> Result<(), DriverError> {
        if self.reject_brightness {
            return Err(DriverError::bus("set_brightness", "write not acknowledged"));
        }
        self.brightness = Some(level);
        self.brightness_writes.push(level);
        Ok(())
    }

    fn poll(&mut self) {
        self.polls += 1;
    }
}
