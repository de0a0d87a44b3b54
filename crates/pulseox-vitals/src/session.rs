//! Poll-driven vitals session.
//!
//! [`VitalsSession`] owns the sensor driver, the estimator and the clock,
//! and composes the rolling buffer, presence gate, calculation gate,
//! smoothing filter and gain controller. Each [`advance`] call:
//!
//! 1. drains every available sample into the buffer, caching the latest;
//! 2. once the buffer is full and the calculation interval has elapsed,
//!    runs the estimator (finger present) or invalidates both readings
//!    (finger absent), then restarts the calculation interval;
//! 3. lets the gain controller adjust brightness if auto-gain is on;
//! 4. gives the driver its keep-alive poll.
//!
//! [`advance`]: VitalsSession::advance

use pulseox_hardware::{SamplePair, SampleSource};

use crate::buffer::{RollingBuffer, WINDOW_LEN};
use crate::clock::{Clock, MonotonicClock};
use crate::config::SessionConfig;
use crate::error::{ConfigError, SessionResult};
use crate::estimator::Estimator;
use crate::gain::GainController;
use crate::presence::PresenceGate;
use crate::schedule::IntervalGate;
use crate::smoothing::EmaFilter;
use crate::types::{SessionStatus, TickReport, VitalChannel};

/// A running measurement session over one sensor.
pub struct VitalsSession<S, E, C = MonotonicClock> {
    source: S,
    estimator: E,
    clock: C,
    buffer: RollingBuffer<WINDOW_LEN>,
    presence: PresenceGate,
    calculation: IntervalGate,
    ema: EmaFilter,
    gain: GainController,
    auto_gain: bool,
    spo2: VitalChannel,
    heart_rate: VitalChannel,
    latest: SamplePair,
}

impl<S, E> VitalsSession<S, E, MonotonicClock>
where
    S: SampleSource,
    E: Estimator,
{
    /// Start a session with default tuning and wall-clock time.
    ///
    /// # Errors
    ///
    /// Fails if the sensor cannot be reached or configured.
    pub fn with_defaults(source: S, estimator: E) -> SessionResult<Self> {
        Self::begin(source, estimator, MonotonicClock::new(), SessionConfig::default())
    }
}

impl<S, E, C> VitalsSession<S, E, C>
where
    S: SampleSource,
    E: Estimator,
    C: Clock,
{
    /// Validate `config`, configure the sensor and return a ready session.
    ///
    /// There is no partially started state: on error the collaborators are
    /// dropped and nothing is returned.
    ///
    /// # Errors
    ///
    /// Returns [`SessionError::Config`](crate::SessionError::Config) for an
    /// inconsistent configuration and
    /// [`SessionError::Driver`](crate::SessionError::Driver) if the sensor
    /// does not come up.
    pub fn begin(
        mut source: S,
        estimator: E,
        clock: C,
        config: SessionConfig,
    ) -> SessionResult<Self> {
        config.validate()?;

        if let Err(e) = source.begin(&config.sensor) {
            tracing::warn!(error = %e, "Sensor did not initialise");
            return Err(e.into());
        }

        let ema = EmaFilter::new(config.ema_numerator, config.ema_denominator).ok_or(
            ConfigError::EmaWeights {
                numerator: config.ema_numerator,
                denominator: config.ema_denominator,
            },
        )?;

        let now = clock.now_ms();
        let gain = GainController::new(config.gain.clone(), config.sensor.led_brightness, now);

        tracing::info!(
            finger_threshold = config.finger_threshold,
            led_brightness = gain.brightness(),
            auto_gain = config.auto_gain,
            "Vitals session started"
        );

        Ok(Self {
            source,
            estimator,
            clock,
            buffer: RollingBuffer::new(),
            presence: PresenceGate::new(config.finger_threshold),
            calculation: IntervalGate::new(config.calculation_interval_ms, now),
            ema,
            gain,
            auto_gain: config.auto_gain,
            spo2: VitalChannel::new(config.spo2_range),
            heart_rate: VitalChannel::new(config.heart_rate_range),
            latest: SamplePair::default(),
        })
    }

    /// Run one control-loop tick. See the module docs for the sequence.
    pub fn advance(&mut self) -> TickReport {
        let mut report = TickReport {
            samples_drained: self.drain_samples(),
            ..TickReport::default()
        };

        let now = self.clock.now_ms();
        if self.buffer.is_ready() && self.calculation.is_due(now) {
            report.estimated = self.calculate();
            report.calculated = true;
            self.calculation.mark_fired(now);
        }

        if self.auto_gain {
            let now = self.clock.now_ms();
            let present = self.is_finger_detected();
            match self
                .gain
                .poll(now, self.latest.infrared, present, &mut self.source)
            {
                Ok(Some(change)) => {
                    tracing::debug!(
                        from = change.from,
                        to = change.to,
                        infrared = self.latest.infrared,
                        "LED brightness adjusted"
                    );
                    report.gain_change = Some(change);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::warn!(error = %e, "Failed to apply LED brightness");
                }
            }
        }

        self.source.poll();
        report
    }

    fn drain_samples(&mut self) -> usize {
        let mut drained = 0;
        while self.source.available() {
            let Some(sample) = self.source.pop_sample() else {
                break;
            };
            self.latest = sample;
            self.buffer.push(sample);
            drained += 1;
        }
        drained
    }

    /// Returns whether the estimator ran.
    fn calculate(&mut self) -> bool {
        if !self.is_finger_detected() {
            self.spo2.invalidate();
            self.heart_rate.invalidate();
            tracing::trace!(infrared = self.latest.infrared, "No finger, skipping estimate");
            return false;
        }

        let window = self.buffer.window();
        let estimate = self.estimator.estimate(&window.infrared, &window.red);

        self.spo2.record(estimate.spo2, estimate.spo2_valid, &self.ema);
        self.heart_rate
            .record(estimate.heart_rate, estimate.heart_rate_valid, &self.ema);

        tracing::debug!(
            raw_spo2 = estimate.spo2,
            spo2_valid = estimate.spo2_valid,
            raw_hr = estimate.heart_rate,
            hr_valid = estimate.heart_rate_valid,
            smoothed_spo2 = ?self.spo2.smoothed(),
            smoothed_hr = ?self.heart_rate.smoothed(),
            "Vitals calculated"
        );
        true
    }

    /// Whether the latest infrared sample indicates a finger.
    pub fn is_finger_detected(&self) -> bool {
        self.presence.is_present(self.latest.infrared)
    }

    /// Smoothed saturation in percent, if presentable.
    pub fn spo2(&self) -> Option<i32> {
        self.spo2.reading(self.is_finger_detected())
    }

    /// Smoothed heart rate in BPM, if presentable.
    pub fn heart_rate(&self) -> Option<i32> {
        self.heart_rate.reading(self.is_finger_detected())
    }

    pub fn is_spo2_valid(&self) -> bool {
        self.spo2().is_some()
    }

    pub fn is_heart_rate_valid(&self) -> bool {
        self.heart_rate().is_some()
    }

    /// Latest raw infrared sample, for diagnostics.
    pub fn raw_infrared(&self) -> u32 {
        self.latest.infrared
    }

    /// Latest raw red sample, for diagnostics.
    pub fn raw_red(&self) -> u32 {
        self.latest.red
    }

    pub fn set_auto_gain(&mut self, enabled: bool) {
        self.auto_gain = enabled;
    }

    pub fn auto_gain_enabled(&self) -> bool {
        self.auto_gain
    }

    /// Current emitter drive level.
    pub fn brightness(&self) -> u8 {
        self.gain.brightness()
    }

    pub fn is_buffer_ready(&self) -> bool {
        self.buffer.is_ready()
    }

    pub fn buffer(&self) -> &RollingBuffer<WINDOW_LEN> {
        &self.buffer
    }

    pub fn spo2_channel(&self) -> &VitalChannel {
        &self.spo2
    }

    pub fn heart_rate_channel(&self) -> &VitalChannel {
        &self.heart_rate
    }

    /// Start a fresh measurement.
    ///
    /// Clears the buffer and both readings. Brightness and the auto-gain
    /// setting are kept so the controller does not have to re-converge.
    pub fn reset(&mut self) {
        self.buffer.reset();
        self.spo2.clear();
        self.heart_rate.clear();
        tracing::debug!(led_brightness = self.gain.brightness(), "Vitals session reset");
    }

    /// Diagnostic snapshot.
    pub fn status(&self) -> SessionStatus {
        SessionStatus {
            finger_detected: self.is_finger_detected(),
            buffer_ready: self.buffer.is_ready(),
            spo2_valid: self.spo2.is_valid(),
            heart_rate_valid: self.heart_rate.is_valid(),
            raw_infrared: self.latest.infrared,
            raw_red: self.latest.red,
            led_brightness: self.gain.brightness(),
            auto_gain: self.auto_gain,
        }
    }

    pub fn source(&self) -> &S {
        &self.source
    }

    pub fn source_mut(&mut self) -> &mut S {
        &mut self.source
    }

    pub fn clock(&self) -> &C {
        &self.clock
    }

    /// Tear down, handing the collaborators back.
    pub fn into_parts(self) -> (S, E, C) {
        (self.source, self.estimator, self.clock)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::estimator::Estimate;
    use crate::SessionError;
    use pulseox_hardware::ScriptedSource;
    use std::cell::{Cell, RefCell};
    use std::rc::Rc;

    const FINGER: SamplePair = SamplePair::new(30_000, 20_000);
    const NO_FINGER: SamplePair = SamplePair::new(1_000, 800);

    fn fixed(spo2: i32, hr: i32) -> impl Fn(&[u32], &[u32]) -> Estimate {
        move |_: &[u32], _: &[u32]| Estimate::valid(spo2, hr)
    }

    fn session<E: Estimator>(
        estimator: E,
    ) -> (VitalsSession<ScriptedSource, E, ManualClock>, ManualClock) {
        let clock = ManualClock::new(0);
        let s = VitalsSession::begin(
            ScriptedSource::new(),
            estimator,
            clock.clone(),
            SessionConfig::default(),
        )
        .unwrap();
        (s, clock)
    }

    #[test]
    fn begin_configures_sensor() {
        let (s, _) = session(fixed(98, 72));
        assert_eq!(s.source().brightness(), Some(220));
        assert_eq!(s.brightness(), 220);
        assert!(s.auto_gain_enabled());
        assert!(!s.is_buffer_ready());
    }

    #[test]
    fn begin_fails_for_unreachable_sensor() {
        let result = VitalsSession::begin(
            ScriptedSource::unreachable(),
            fixed(98, 72),
            ManualClock::new(0),
            SessionConfig::default(),
        );
        assert!(matches!(result, Err(SessionError::Driver(_))));
    }

    #[test]
    fn begin_rejects_bad_config() {
        let config = SessionConfig {
            ema_denominator: 0,
            ..SessionConfig::default()
        };
        let result =
            VitalsSession::begin(ScriptedSource::new(), fixed(98, 72), ManualClock::new(0), config);
        assert!(matches!(result, Err(SessionError::Config(_))));
    }

    #[test]
    fn drain_updates_latest_before_ready() {
        let (mut s, _) = session(fixed(98, 72));
        s.source_mut().push(SamplePair::new(16_000, 9_000));
        s.source_mut().push(SamplePair::new(17_000, 9_500));
        let report = s.advance();
        assert_eq!(report.samples_drained, 2);
        assert!(!report.calculated);
        assert_eq!(s.raw_infrared(), 17_000);
        assert_eq!(s.raw_red(), 9_500);
        assert!(s.is_finger_detected());
        assert_eq!(s.source().polls(), 1);
    }

    #[test]
    fn end_to_end_bootstrap() {
        let seen = Rc::new(RefCell::new(Vec::new()));
        let log = Rc::clone(&seen);
        let estimator = move |ir: &[u32], red: &[u32]| {
            log.borrow_mut().push((ir.to_vec(), red.to_vec()));
            Estimate::valid(98, 72)
        };
        let (mut s, clock) = session(estimator);
        s.source_mut().push_repeated(FINGER, WINDOW_LEN);
        clock.set(1_000);

        let report = s.advance();
        assert!(report.calculated);
        assert!(report.estimated);
        assert_eq!(s.spo2(), Some(98));
        assert_eq!(s.heart_rate(), Some(72));
        assert!(s.is_spo2_valid());
        assert!(s.is_heart_rate_valid());

        let calls = seen.borrow();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, vec![30_000; WINDOW_LEN]);
        assert_eq!(calls[0].1, vec![20_000; WINDOW_LEN]);
    }

    #[test]
    fn calculation_waits_for_interval() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let estimator = move |_: &[u32], _: &[u32]| {
            counter.set(counter.get() + 1);
            Estimate::valid(97, 65)
        };
        let (mut s, clock) = session(estimator);
        s.source_mut().push_repeated(FINGER, WINDOW_LEN);
        clock.set(999);
        assert!(!s.advance().calculated);
        clock.set(1_000);
        assert!(s.advance().calculated);
        clock.set(1_999);
        assert!(!s.advance().calculated);
        clock.set(2_000);
        assert!(s.advance().calculated);
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn absence_hides_cached_values_without_reset() {
        let (mut s, clock) = session(fixed(98, 72));
        s.source_mut().push_repeated(FINGER, WINDOW_LEN);
        clock.set(1_000);
        s.advance();
        assert_eq!(s.spo2(), Some(98));

        s.source_mut().push(NO_FINGER);
        clock.set(1_100);
        s.advance();
        assert!(!s.is_finger_detected());
        assert_eq!(s.spo2(), None);
        assert_eq!(s.heart_rate(), None);
        assert_eq!(s.spo2_channel().smoothed(), Some(98));
    }

    #[test]
    fn absent_finger_fires_calculation_gate_without_estimating() {
        let calls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&calls);
        let estimator = move |_: &[u32], _: &[u32]| {
            counter.set(counter.get() + 1);
            Estimate::valid(97, 65)
        };
        let (mut s, clock) = session(estimator);
        s.source_mut().push_repeated(NO_FINGER, WINDOW_LEN);
        clock.set(1_000);
        let report = s.advance();
        assert!(report.calculated);
        assert!(!report.estimated);
        assert_eq!(calls.get(), 0);

        // Finger arrives right after: the gate was consumed, so no estimate yet.
        s.source_mut().push(FINGER);
        clock.set(1_500);
        assert!(!s.advance().calculated);
        clock.set(2_000);
        assert!(s.advance().estimated);
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn invalid_and_out_of_range_keep_stale_smoothed() {
        let script = Rc::new(RefCell::new(vec![
            Estimate::valid(98, 72),
            Estimate::valid(98, 250),
            Estimate {
                spo2: 90,
                spo2_valid: false,
                heart_rate: 80,
                heart_rate_valid: true,
            },
        ]));
        let queue = Rc::clone(&script);
        let estimator = move |_: &[u32], _: &[u32]| queue.borrow_mut().remove(0);
        let (mut s, clock) = session(estimator);
        s.source_mut().push_repeated(FINGER, WINDOW_LEN);

        clock.set(1_000);
        s.advance();
        assert_eq!((s.spo2(), s.heart_rate()), (Some(98), Some(72)));

        clock.set(2_000);
        s.advance();
        // 250 BPM is out of range: stale 72 is kept and still flagged valid.
        assert_eq!(s.heart_rate(), Some(72));
        assert_eq!(s.heart_rate_channel().raw(), Some(250));

        clock.set(3_000);
        s.advance();
        assert_eq!(s.spo2(), None);
        assert!(!s.is_spo2_valid());
        assert_eq!(s.spo2_channel().smoothed(), Some(98));
        // (72 * 7 + 80 * 3) / 10 = 74
        assert_eq!(s.heart_rate(), Some(74));
    }

    #[test]
    fn reset_clears_readings_but_keeps_gain_state() {
        let (mut s, clock) = session(fixed(98, 72));
        s.source_mut().push_repeated(SamplePair::new(20_000, 15_000), WINDOW_LEN);
        clock.set(1_000);
        let report = s.advance();
        assert_eq!(report.gain_change.map(|c| c.to), Some(225));
        s.set_auto_gain(false);

        s.reset();
        assert_eq!(s.spo2(), None);
        assert_eq!(s.heart_rate(), None);
        assert!(!s.is_buffer_ready());
        assert_eq!(s.brightness(), 225);
        assert!(!s.auto_gain_enabled());

        s.source_mut().push_repeated(FINGER, WINDOW_LEN - 1);
        clock.set(5_000);
        s.advance();
        assert!(!s.is_buffer_ready());
        s.source_mut().push(FINGER);
        s.advance();
        assert!(s.is_buffer_ready());
    }

    #[test]
    fn auto_gain_disabled_leaves_brightness() {
        let (mut s, clock) = session(fixed(98, 72));
        s.set_auto_gain(false);
        s.source_mut().push(SamplePair::new(120_000, 80_000));
        clock.set(2_000);
        assert_eq!(s.advance().gain_change, None);
        assert_eq!(s.brightness(), 220);
        assert!(s.source().brightness_writes().is_empty());
    }

    #[test]
    fn gain_failure_is_not_fatal() {
        let (mut s, clock) = session(fixed(98, 72));
        s.source_mut().set_reject_brightness(true);
        s.source_mut().push(SamplePair::new(20_000, 15_000));
        clock.set(800);
        assert_eq!(s.advance().gain_change, None);
        assert_eq!(s.brightness(), 220);

        s.source_mut().set_reject_brightness(false);
        clock.set(801);
        assert_eq!(s.advance().gain_change.map(|c| c.to), Some(225));
    }

    #[test]
    fn status_reflects_state() {
        let (mut s, clock) = session(fixed(98, 72));
        s.source_mut().push_repeated(FINGER, WINDOW_LEN);
        clock.set(1_000);
        s.advance();
        let status = s.status();
        assert!(status.finger_detected);
        assert!(status.buffer_ready);
        assert!(status.spo2_valid);
        assert_eq!(status.raw_infrared, 30_000);
        assert_eq!(status.led_brightness, 220);
        assert!(status.to_string().contains("Auto-gain: On"));
    }
}
