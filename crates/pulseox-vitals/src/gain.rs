//! Closed-loop emitter brightness control (auto-gain).
//!
//! Keeps the infrared DC level inside a target band regardless of finger
//! size or skin tone. The controller steps brightness by a fixed amount
//! when the signal is outside `[target_low, target_high]`, clamps to
//! `[led_min, led_max]`, and waits one cooldown period after each applied
//! change. The dead-band between the two targets and the cooldown are the
//! only hysteresis.
//!
//! In-band decisions do not restart the cooldown. Once due, the controller
//! keeps re-evaluating on every poll until it actually changes something.

use pulseox_hardware::{DriverError, SampleSource};

use crate::schedule::{IntervalGate, GAIN_ADJUSTMENT_INTERVAL_MS};

/// Auto-gain tuning.
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GainConfig {
    /// Raise brightness below this infrared level.
    pub ir_target_low: u32,
    /// Lower brightness above this infrared level.
    pub ir_target_high: u32,
    /// Lowest drive level the controller will set.
    pub led_min: u8,
    /// Highest drive level the controller will set.
    pub led_max: u8,
    /// Drive level change per adjustment.
    pub led_step: u8,
    /// Cooldown after an applied change.
    pub interval_ms: u32,
}

impl Default for GainConfig {
    fn default() -> Self {
        Self {
            ir_target_low: 25_000,
            ir_target_high: 90_000,
            led_min: 20,
            led_max: 255,
            led_step: 5,
            interval_ms: GAIN_ADJUSTMENT_INTERVAL_MS,
        }
    }
}

/// What one evaluation decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GainAction {
    Increase,
    Decrease,
    Hold,
}

/// A brightness change that reached the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BrightnessChange {
    pub from: u8,
    pub to: u8,
}

/// Auto-gain state: current drive level and cooldown gate.
#[derive(Debug, Clone)]
pub struct GainController {
    config: GainConfig,
    brightness: u8,
    gate: IntervalGate,
}

impl GainController {
    /// Create a controller. `initial_brightness` is clamped into range;
    /// with inverted limits `led_max` wins.
    pub fn new(config: GainConfig, initial_brightness: u8, now_ms: u32) -> Self {
        let brightness = initial_brightness.max(config.led_min).min(config.led_max);
        let gate = IntervalGate::new(config.interval_ms, now_ms);
        Self {
            config,
            brightness,
            gate,
        }
    }

    pub fn brightness(&self) -> u8 {
        self.brightness
    }

    pub fn config(&self) -> &GainConfig {
        &self.config
    }

    /// Timestamp of the last applied change (or construction).
    pub fn last_adjustment_ms(&self) -> u32 {
        self.gate.last_fired_ms()
    }

    /// Decide what to do for the given infrared level, ignoring timing.
    pub fn decide(&self, latest_infrared: u32) -> GainAction {
        let cfg = &self.config;
        if latest_infrared < cfg.ir_target_low && self.brightness < cfg.led_max {
            GainAction::Increase
        } else if latest_infrared > cfg.ir_target_high && self.brightness > cfg.led_min {
            GainAction::Decrease
        } else {
            GainAction::Hold
        }
    }

    /// Drive level `action` would produce.
    pub fn target(&self, action: GainAction) -> u8 {
        let cfg = &self.config;
        match action {
            GainAction::Increase => self.brightness.saturating_add(cfg.led_step).min(cfg.led_max),
            GainAction::Decrease => self.brightness.saturating_sub(cfg.led_step).max(cfg.led_min),
            GainAction::Hold => self.brightness,
        }
    }

    /// Run one evaluation and push any change to `source`.
    ///
    /// Does nothing unless the cooldown has elapsed and a finger is present.
    /// The cooldown restarts only when a change reaches the driver; if the
    /// write fails the level is left untouched and the error returned.
    pub fn poll<S>(
        &mut self,
        now_ms: u32,
        latest_infrared: u32,
        finger_present: bool,
        source: &mut S,
    ) -> Result<Option<BrightnessChange>, DriverError>
    where
        S: SampleSource + ?Sized,
    {
        if !self.gate.is_due(now_ms) || !finger_present {
            return Ok(None);
        }

        let action = self.decide(latest_infrared);
        if action == GainAction::Hold {
            return Ok(None);
        }

        let from = self.brightness;
        let to = self.target(action);
        source.set_brightness(to)?;

        self.brightness = to;
        self.gate.mark_fired(now_ms);
        Ok(Some(BrightnessChange { from, to }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pulseox_hardware::ScriptedSource;

    fn controller(initial: u8) -> GainController {
        GainController::new(GainConfig::default(), initial, 0)
    }

    #[test]
    fn decide_covers_band() {
        let ctl = controller(100);
        assert_eq!(ctl.decide(10_000), GainAction::Increase);
        assert_eq!(ctl.decide(24_999), GainAction::Increase);
        assert_eq!(ctl.decide(25_000), GainAction::Hold);
        assert_eq!(ctl.decide(90_000), GainAction::Hold);
        assert_eq!(ctl.decide(90_001), GainAction::Decrease);
    }

    #[test]
    fn hold_at_clamp_limits() {
        assert_eq!(controller(255).decide(10_000), GainAction::Hold);
        assert_eq!(controller(20).decide(200_000), GainAction::Hold);
    }

    #[test]
    fn steps_clamp_to_limits() {
        let ctl = controller(253);
        assert_eq!(ctl.target(GainAction::Increase), 255);
        let ctl = controller(22);
        assert_eq!(ctl.target(GainAction::Decrease), 20);
    }

    #[test]
    fn initial_brightness_clamped() {
        assert_eq!(controller(5).brightness(), 20);
    }

    #[test]
    fn inverted_limits_do_not_panic() {
        let cfg = GainConfig {
            led_min: 200,
            led_max: 100,
            ..GainConfig::default()
        };
        assert_eq!(GainController::new(cfg.clone(), 220, 0).brightness(), 100);
        assert_eq!(GainController::new(cfg, 10, 0).brightness(), 100);
    }

    #[test]
    fn not_due_does_nothing() {
        let mut ctl = controller(220);
        let mut src = ScriptedSource::new();
        assert_eq!(ctl.poll(799, 10_000, true, &mut src).unwrap(), None);
        assert!(src.brightness_writes().is_empty());
    }

    #[test]
    fn absent_finger_does_not_reset_gate() {
        let mut ctl = controller(220);
        let mut src = ScriptedSource::new();
        assert_eq!(ctl.poll(900, 10_000, false, &mut src).unwrap(), None);
        assert_eq!(ctl.last_adjustment_ms(), 0);
        // Finger returns one poll later: still due, acts immediately.
        let change = ctl.poll(910, 10_000, true, &mut src).unwrap();
        assert_eq!(change, Some(BrightnessChange { from: 220, to: 225 }));
        assert_eq!(ctl.last_adjustment_ms(), 910);
    }

    #[test]
    fn in_band_hold_keeps_gate_due() {
        let mut ctl = controller(220);
        let mut src = ScriptedSource::new();
        assert_eq!(ctl.poll(800, 50_000, true, &mut src).unwrap(), None);
        assert_eq!(ctl.last_adjustment_ms(), 0);
        // Signal drops out of band on the very next poll.
        let change = ctl.poll(801, 20_000, true, &mut src).unwrap();
        assert_eq!(change.map(|c| c.to), Some(225));
    }

    #[test]
    fn applied_change_enforces_cooldown() {
        let mut ctl = controller(220);
        let mut src = ScriptedSource::new();
        assert!(ctl.poll(800, 100_000, true, &mut src).unwrap().is_some());
        assert_eq!(ctl.brightness(), 215);
        assert_eq!(ctl.poll(1_599, 100_000, true, &mut src).unwrap(), None);
        assert!(ctl.poll(1_600, 100_000, true, &mut src).unwrap().is_some());
        assert_eq!(src.brightness_writes(), &[215, 210]);
    }

    #[test]
    fn converges_to_max_within_seven_steps() {
        let mut ctl = controller(220);
        let mut src = ScriptedSource::new();
        let mut now = 0u32;
        let mut adjustments = 0;
        for _ in 0..1_000 {
            now += 100;
            if ctl.poll(now, 10_000, true, &mut src).unwrap().is_some() {
                adjustments += 1;
            }
            assert!((20..=255).contains(&ctl.brightness()));
        }
        assert_eq!(ctl.brightness(), 255);
        assert_eq!(adjustments, 7);
    }

    #[test]
    fn driver_failure_leaves_state_untouched() {
        let mut ctl = controller(220);
        let mut src = ScriptedSource::new();
        src.set_reject_brightness(true);
        assert!(ctl.poll(800, 10_000, true, &mut src).is_err());
        assert_eq!(ctl.brightness(), 220);
        assert_eq!(ctl.last_adjustment_ms(), 0);

        src.set_reject_brightness(false);
        assert!(ctl.poll(801, 10_000, true, &mut src).unwrap().is_some());
        assert_eq!(ctl.brightness(), 225);
    }
}
