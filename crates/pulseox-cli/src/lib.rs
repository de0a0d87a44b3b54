//! pulseox CLI
//!
//! Offline tooling for the PPG conditioning core: replay recorded sensor
//! captures through a full session and inspect what it would have shown.
//!
//! # Usage
//!
//! ```bash
//! # Replay a text capture recorded at 25 Hz
//! pulseox replay capture.csv --sample-rate 25
//!
//! # Same, JSON lines, with a tuned configuration and auto-gain off
//! pulseox replay capture.csv --config tuned.json --no-auto-gain --format json
//!
//! # Pack a text capture into the binary format
//! pulseox convert capture.csv capture.ppg
//!
//! # Print the default session configuration
//! pulseox defaults
//! ```

use clap::{Parser, Subcommand, ValueEnum};

pub mod replay;

/// pulseox command line interface
#[derive(Parser, Debug)]
#[command(name = "pulseox")]
#[command(author, version, about = "PPG pulse-oximeter signal conditioning tools")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Command to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replay a capture through a vitals session
    Replay(replay::ReplayArgs),

    /// Convert a capture to the binary format
    Convert(replay::ConvertArgs),

    /// Print the default session configuration as JSON
    Defaults,

    /// Display version information
    Version,
}

/// Output format
#[derive(ValueEnum, Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum OutputFormat {
    /// Pretty table output
    #[default]
    Table,
    /// One JSON object per line
    Json,
    /// Compact single-line output
    Compact,
}

/// Lines printed by `pulseox version`.
pub fn version_lines() -> Vec<String> {
    vec![
        format!("pulseox {}", env!("CARGO_PKG_VERSION")),
        format!("hardware: {}", pulseox_hardware::VERSION),
        format!("vitals: {}", pulseox_vitals::VERSION),
        format!("estimator: {}", pulseox_estimator::VERSION),
    ]
}
