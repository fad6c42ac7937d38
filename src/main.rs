use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_subscriber::EnvFilter;

use duck_legends::{format_result, run, CliArgs, Config};

fn main() -> Result<()> {
    let config = Config::from(CliArgs::parse());

    // Logs go to stderr; stdout carries only the result
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| config.log_filter().into()),
        )
        .with_writer(std::io::stderr)
        .init();

    info!(
        version = duck_legends::VERSION,
        source = %config.source.display(),
        "🦆 duck legends"
    );

    let report = run(&config.source, &config.load)
        .with_context(|| format!("Failed to rank authors in {}", config.source.display()))?;

    if config.show_summary {
        eprintln!("{}", report.summary.describe());
    }

    let rendered = format_result(&report.to_result_set(), config.format)?;
    println!("{}", rendered);

    Ok(())
}
