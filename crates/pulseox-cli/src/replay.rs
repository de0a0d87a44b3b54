//! Capture replay and conversion.
//!
//! A replay feeds recorded samples through a [`VitalsSession`] backed by a
//! [`ScriptedSource`] and a [`ManualClock`] that advances one sample period
//! per sample, so gate timing matches the recording rather than the host.

use anyhow::{bail, Context, Result};
use clap::Args;
use colored::Colorize;
use serde::Serialize;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tabled::{settings::Style, Table, Tabled};

use pulseox_estimator::{EstimatorConfig, ReferenceEstimator};
use pulseox_hardware::{CaptureParser, SamplePair, ScriptedSource};
use pulseox_vitals::{Clock, ManualClock, SessionConfig, TickReport, VitalsSession};

use crate::OutputFormat;

/// Arguments for the replay command
#[derive(Args, Debug)]
pub struct ReplayArgs {
    /// Capture file (text `ir,red` lines or binary PPG1)
    pub file: PathBuf,

    /// Session configuration JSON; missing fields keep their defaults
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Rate the capture was recorded at, in Hz [default: the configured
    /// sensor's rate after averaging]
    #[arg(short, long)]
    pub sample_rate: Option<f64>,

    /// Samples delivered per session tick
    #[arg(short, long, default_value = "1", value_parser = clap::value_parser!(u32).range(1..))]
    pub batch: u32,

    /// Start with auto-gain disabled
    #[arg(long)]
    pub no_auto_gain: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value = "table")]
    pub format: OutputFormat,

    /// Pace ticks at the recording rate
    #[arg(long)]
    pub realtime: bool,
}

/// Arguments for the convert command
#[derive(Args, Debug)]
pub struct ConvertArgs {
    /// Input capture (text or binary)
    pub input: PathBuf,

    /// Output path for the binary capture
    pub output: PathBuf,
}

/// One calculation cycle as seen by a display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Reading {
    /// Session clock at the tick, ms.
    pub time_ms: u32,
    /// Samples consumed so far.
    pub samples: usize,
    pub finger: bool,
    pub spo2: Option<i32>,
    pub heart_rate: Option<i32>,
    pub raw_infrared: u32,
    pub led_brightness: u8,
}

#[derive(Tabled)]
struct ReadingRow {
    #[tabled(rename = "Time (s)")]
    time: String,
    #[tabled(rename = "Samples")]
    samples: usize,
    #[tabled(rename = "Finger")]
    finger: String,
    #[tabled(rename = "SpO2 %")]
    spo2: String,
    #[tabled(rename = "HR bpm")]
    heart_rate: String,
    #[tabled(rename = "Raw IR")]
    raw_infrared: u32,
    #[tabled(rename = "LED")]
    led: u8,
}

impl From<&Reading> for ReadingRow {
    fn from(r: &Reading) -> Self {
        Self {
            time: format!("{:.2}", f64::from(r.time_ms) / 1000.0),
            samples: r.samples,
            finger: if r.finger { "yes" } else { "no" }.to_string(),
            spo2: display_reading(r.spo2),
            heart_rate: display_reading(r.heart_rate),
            raw_infrared: r.raw_infrared,
            led: r.led_brightness,
        }
    }
}

fn display_reading(value: Option<i32>) -> String {
    value.map_or_else(|| "--".to_string(), |v| v.to_string())
}

/// Milliseconds per sample at `sample_rate_hz`, rounded.
pub fn sample_period_ms(sample_rate_hz: f64) -> Result<u32> {
    if !sample_rate_hz.is_finite() || sample_rate_hz <= 0.0 || sample_rate_hz > 1000.0 {
        bail!("sample rate must be in (0, 1000] Hz, got {sample_rate_hz}");
    }
    Ok((1000.0 / sample_rate_hz).round() as u32)
}

/// Recording rate: the explicit override, else what `config.sensor`
/// delivers after hardware averaging.
pub fn resolve_sample_rate(explicit: Option<f64>, config: &SessionConfig) -> f64 {
    explicit.unwrap_or_else(|| config.sensor.effective_sample_rate_hz())
}

/// Load a session configuration from JSON.
pub fn load_config(path: &Path) -> Result<SessionConfig> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("reading config {}", path.display()))?;
    let config: SessionConfig = serde_json::from_str(&text)
        .with_context(|| format!("parsing config {}", path.display()))?;
    config.validate()?;
    Ok(config)
}

/// Load and decode a capture file of either format.
pub fn load_capture(path: &Path) -> Result<Vec<SamplePair>> {
    let data = std::fs::read(path).with_context(|| format!("reading {}", path.display()))?;
    let samples = CaptureParser::parse_any(&data)
        .with_context(|| format!("decoding capture {}", path.display()))?;
    Ok(samples)
}

type ReplaySession = VitalsSession<ScriptedSource, ReferenceEstimator, ManualClock>;

/// Step-wise replay of a recorded capture.
pub struct Replayer {
    session: ReplaySession,
    samples: std::vec::IntoIter<SamplePair>,
    batch: usize,
    period_ms: u32,
    consumed: usize,
}

impl Replayer {
    pub fn new(
        samples: Vec<SamplePair>,
        config: SessionConfig,
        sample_rate_hz: f64,
        batch: usize,
    ) -> Result<Self> {
        let period_ms = sample_period_ms(sample_rate_hz)?;
        let estimator = ReferenceEstimator::new(EstimatorConfig {
            sample_rate_hz,
            ..EstimatorConfig::for_sensor(&config.sensor)
        });
        let session =
            VitalsSession::begin(ScriptedSource::new(), estimator, ManualClock::new(0), config)?;

        Ok(Self {
            session,
            samples: samples.into_iter(),
            batch: batch.max(1),
            period_ms,
            consumed: 0,
        })
    }

    /// Deliver the next batch and run one tick. `None` once the capture is
    /// exhausted.
    pub fn step(&mut self) -> Option<TickReport> {
        let mut pushed = 0u32;
        for sample in self.samples.by_ref().take(self.batch) {
            self.session.source_mut().push(sample);
            pushed += 1;
        }
        if pushed == 0 {
            return None;
        }
        self.consumed += pushed as usize;
        self.session.clock().advance(self.period_ms.saturating_mul(pushed));
        Some(self.session.advance())
    }

    /// Current presentable state.
    pub fn reading(&self) -> Reading {
        Reading {
            time_ms: self.session.clock().now_ms(),
            samples: self.consumed,
            finger: self.session.is_finger_detected(),
            spo2: self.session.spo2(),
            heart_rate: self.session.heart_rate(),
            raw_infrared: self.session.raw_infrared(),
            led_brightness: self.session.brightness(),
        }
    }

    /// Wall-clock duration of one batch at the recording rate.
    pub fn tick_duration(&self) -> Duration {
        Duration::from_millis(u64::from(self.period_ms) * self.batch as u64)
    }

    pub fn session(&self) -> &ReplaySession {
        &self.session
    }

    /// Finish the replay, handing back the driver with its write log.
    pub fn into_source(self) -> ScriptedSource {
        let (source, _estimator, _clock) = self.session.into_parts();
        source
    }

    /// Run to the end, collecting one reading per calculation.
    pub fn run_to_end(&mut self) -> Vec<Reading> {
        let mut readings = Vec::new();
        while let Some(report) = self.step() {
            if report.calculated {
                readings.push(self.reading());
            }
        }
        readings
    }
}

/// Execute the replay command
pub async fn execute(args: ReplayArgs) -> Result<()> {
    let mut config = match &args.config {
        Some(path) => load_config(path)?,
        None => SessionConfig::default(),
    };
    if args.no_auto_gain {
        config.auto_gain = false;
    }

    let samples = load_capture(&args.file)?;
    let total = samples.len();
    tracing::info!(file = %args.file.display(), samples = total, "Loaded capture");

    let sample_rate = resolve_sample_rate(args.sample_rate, &config);
    let mut replayer = Replayer::new(samples, config, sample_rate, args.batch as usize)?;
    let pace = replayer.tick_duration();

    if args.format == OutputFormat::Table {
        println!(
            "{} {} ({} samples @ {} Hz)",
            "[REPLAY]".bright_cyan().bold(),
            args.file.display(),
            total,
            sample_rate
        );
    }

    let mut readings = Vec::new();
    while let Some(report) = replayer.step() {
        if let Some(change) = report.gain_change {
            tracing::debug!(from = change.from, to = change.to, "LED brightness adjusted");
        }
        if report.calculated {
            let reading = replayer.reading();
            match args.format {
                OutputFormat::Json => println!("{}", serde_json::to_string(&reading)?),
                OutputFormat::Compact => println!(
                    "t={}ms finger={} spo2={} hr={} ir={} led={}",
                    reading.time_ms,
                    reading.finger,
                    display_reading(reading.spo2),
                    display_reading(reading.heart_rate),
                    reading.raw_infrared,
                    reading.led_brightness
                ),
                OutputFormat::Table => readings.push(reading),
            }
        }
        if args.realtime {
            tokio::time::sleep(pace).await;
        }
    }

    let status = replayer.session().status();
    match args.format {
        OutputFormat::Json => println!("{}", serde_json::to_string(&status)?),
        OutputFormat::Compact => println!("{}", status.to_string().replace('\n', " ")),
        OutputFormat::Table => {
            if readings.is_empty() {
                println!(
                    "{} No calculation cycles ran; the capture may be shorter than one window.",
                    "[WARN]".yellow().bold()
                );
            } else {
                let rows: Vec<ReadingRow> = readings.iter().map(ReadingRow::from).collect();
                let table = Table::new(rows).with(Style::rounded()).to_string();
                println!("{table}");
            }
            println!();
            println!("{}", "Final status".bold().cyan());
            println!("{status}");
        }
    }

    let source = replayer.into_source();
    tracing::info!(
        brightness_writes = source.brightness_writes().len(),
        final_brightness = ?source.brightness(),
        "Replay finished"
    );

    Ok(())
}

/// Execute the convert command
pub fn convert(args: ConvertArgs) -> Result<()> {
    let samples = load_capture(&args.input)?;
    let encoded = CaptureParser::encode_binary(&samples);
    std::fs::write(&args.output, &encoded)
        .with_context(|| format!("writing {}", args.output.display()))?;
    println!(
        "{} Wrote {} samples ({} bytes) to {}",
        "[OK]".green().bold(),
        samples.len(),
        encoded.len(),
        args.output.display()
    );
    Ok(())
}

/// Execute the defaults command
pub fn print_defaults() -> Result<()> {
    println!("{}", serde_json::to_string_pretty(&SessionConfig::default())?);
    Ok(())
}
