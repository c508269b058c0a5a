// src/logging.rs
// =============================================================================
// Sets up `tracing` output for the terminal.
//
// Default level is INFO (discoveries and progress). With --verbose we go to
// DEBUG, which adds network errors, retries and calibration details.
// RUST_LOG still works for finer control.
// =============================================================================

use anyhow::Result;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

pub fn level_from_cli(cli: &crate::cli::Cli) -> tracing::Level {
    if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    }
}

pub fn init(level: tracing::Level) -> Result<()> {
    let filter = EnvFilter::from_default_env()
        .add_directive(format!("dirprobe={}", level).parse()?)
        .add_directive(tracing::Level::WARN.into());

    tracing_subscriber::registry()
        .with(filter)
        .with(
            tracing_subscriber::fmt::layer()
                .compact()
                .with_target(false)
                .with_thread_ids(false)
                .with_thread_names(false),
        )
        .try_init()
        .map_err(|e| anyhow::anyhow!("Failed to initialize logging: {}", e))?;

    Ok(())
}
