//! Finger-presence gate.

/// Infrared level at or above which a finger is considered on the sensor.
pub const FINGER_THRESHOLD: u32 = 15_000;

/// Stateless threshold on the latest infrared reading.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PresenceGate {
    threshold: u32,
}

impl Default for PresenceGate {
    fn default() -> Self {
        Self::new(FINGER_THRESHOLD)
    }
}

impl PresenceGate {
    pub const fn new(threshold: u32) -> Self {
        Self { threshold }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    /// Whether `latest_infrared` indicates a finger.
    pub fn is_present(&self, latest_infrared: u32) -> bool {
        latest_infrared >= self.threshold
    }
}
