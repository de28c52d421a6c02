//! `mailsweep` - command-line email triage
//!
//! Fetches the latest emails from the triage service, has them classified,
//! and deletes the ones suggested for deletion.

#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![forbid(unsafe_code)]

mod cli;
mod commands;
mod render;
mod settings;

use anyhow::Result;
use clap::Parser;
use tracing::debug;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cli::Cli;
use settings::Settings;

const DEFAULT_LOG_FILTER: &str = "mailsweep=info,mailsweep_core=info,mailsweep_client=info";

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let settings_path = cli.config.clone().unwrap_or_else(Settings::default_path);
    let settings = Settings::load(&settings_path).await?;

    // Initialize logging
    let fallback = settings
        .log_filter
        .clone()
        .unwrap_or_else(|| DEFAULT_LOG_FILTER.to_string());
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| fallback.into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    debug!("Using settings from {}", settings_path.display());

    commands::run(cli.command, settings, &settings_path).await
}
