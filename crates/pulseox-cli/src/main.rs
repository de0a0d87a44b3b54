//! pulseox CLI entry point

use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

use pulseox_cli::{replay, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize logging
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Replay(args) => replay::execute(args).await?,
        Commands::Convert(args) => replay::convert(args)?,
        Commands::Defaults => replay::print_defaults()?,
        Commands::Version => {
            for line in pulseox_cli::version_lines() {
                println!("{line}");
            }
        }
    }

    Ok(())
}
