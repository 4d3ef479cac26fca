//! Shift Timeline - renders per-shift-team schedule timelines
//!
//! Reads a VRP snapshot, extracts each shift team's visits and rest breaks, and
//! writes one timeline per team.

mod cli;
mod config;
mod defaults;
mod services;
mod types;

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::info;
use tracing_appender::rolling::{RollingFileAppender, Rotation};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use crate::cli::{Cli, Command};
use crate::services::batch::{self, OutputFormat};
use crate::services::provider;
use crate::types::Snapshot;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Load .env before LOGS_DIR / RUST_LOG are read
    dotenvy::dotenv().ok();

    // File logging only when LOGS_DIR is set (daily rotation)
    let (file_layer, _guard) = match std::env::var("LOGS_DIR") {
        Ok(logs_dir) => {
            std::fs::create_dir_all(&logs_dir).ok();
            let file_appender =
                RollingFileAppender::new(Rotation::DAILY, &logs_dir, "shift-timeline.log");
            let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
            let layer = tracing_subscriber::fmt::layer()
                .with_writer(non_blocking)
                .with_ansi(false);
            (Some(layer), Some(guard))
        }
        Err(_) => (None, None),
    };

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info,shift_timeline=debug".into()),
        ))
        .with(tracing_subscriber::fmt::layer()) // stdout
        .with(file_layer)
        .init();

    let config = config::Config::from_env()?;
    let args = cli.command.args();
    let format = match cli.command {
        Command::Render(_) => OutputFormat::Svg,
        Command::Layout(_) => OutputFormat::Json,
    };
    let layout_config = config.layout_config(args)?;
    let output_dir = args.output_dir.clone().unwrap_or_else(|| config.output_dir.clone());
    info!(
        "Configuration loaded: zone={}, labels={}, legend={}, canvas={}x{}",
        layout_config.zone,
        layout_config.labels,
        layout_config.legend,
        layout_config.width,
        layout_config.height
    );

    let snapshot = Snapshot::from_path(&args.input)
        .await
        .with_context(|| format!("cannot load snapshot {}", args.input.display()))?;
    let schedules = provider::shift_schedules(&snapshot, args.break_actuals);
    info!("Loaded {} shift teams from {}", schedules.len(), args.input.display());

    let summary = batch::render_all(schedules, Arc::new(layout_config), &output_dir, format).await?;
    info!(
        "Finished: {} written, {} skipped",
        summary.written.len(),
        summary.skipped.len()
    );

    let failures = summary.write_failures();
    if failures > 0 {
        anyhow::bail!("{} timelines could not be written", failures);
    }

    Ok(())
}
