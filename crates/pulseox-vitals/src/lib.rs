//! PPG vital-sign conditioning core.
//!
//! Turns a stream of raw infrared/red samples into stable, presentable
//! saturation and heart-rate readings, and keeps the emitter brightness in
//! its working range.
//!
//! # Architecture
//!
//! A [`VitalsSession`] is polled from the application's control loop and
//! composes:
//!
//! 1. **Buffering** ([`RollingBuffer`]): the most recent 100 sample pairs,
//!    usable once filled end to end.
//! 2. **Presence** ([`PresenceGate`]): infrared threshold deciding whether
//!    a finger is on the sensor. No finger means no readings.
//! 3. **Scheduling** ([`IntervalGate`]): the estimator runs at most once per
//!    second, the gain loop at most once per 800 ms.
//! 4. **Estimation** ([`Estimator`]): an external algorithm over the window.
//! 5. **Smoothing** ([`EmaFilter`]): integer EMA (70/30) per vital.
//! 6. **Auto-gain** ([`GainController`]): steps LED brightness toward the
//!    target infrared band.
//!
//! # Example
//!
//! ```
//! use pulseox_hardware::{SamplePair, ScriptedSource};
//! use pulseox_vitals::{Estimate, ManualClock, SessionConfig, VitalsSession};
//!
//! let estimator = |_ir: &[u32], _red: &[u32]| Estimate::valid(98, 72);
//! let clock = ManualClock::new(0);
//! let mut session = VitalsSession::begin(
//!     ScriptedSource::new(),
//!     estimator,
//!     clock.clone(),
//!     SessionConfig::default(),
//! )
//! .unwrap();
//!
//! session.source_mut().push_repeated(SamplePair::new(30_000, 20_000), 100);
//! clock.advance(1_000);
//! session.advance();
//!
//! assert_eq!(session.spo2(), Some(98));
//! assert_eq!(session.heart_rate(), Some(72));
//! ```

pub mod buffer;
pub mod clock;
pub mod config;
pub mod error;
pub mod estimator;
pub mod gain;
pub mod presence;
pub mod schedule;
pub mod session;
pub mod smoothing;
pub mod types;

pub use buffer::{RollingBuffer, Window, WINDOW_LEN};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::SessionConfig;
pub use error::{ConfigError, SessionError, SessionResult};
pub use estimator::{Estimate, Estimator};
pub use gain::{BrightnessChange, GainAction, GainConfig, GainController};
pub use presence::{PresenceGate, FINGER_THRESHOLD};
pub use schedule::{due_to_fire, IntervalGate, CALCULATION_INTERVAL_MS, GAIN_ADJUSTMENT_INTERVAL_MS};
pub use session::VitalsSession;
pub use smoothing::{EmaFilter, EMA_DENOMINATOR, EMA_NUMERATOR};
pub use types::{SaneRange, SessionStatus, TickReport, VitalChannel};

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
