//! # Pixelfield
//!
//! Headless driver for the Pixelfield grid: builds a population, plays a
//! scripted pointer session against it and logs what the grid reports.
//!
//! Usage: `pixelfield [CONFIG.toml]`. Without an argument the config is read
//! from the platform config directory; a default file is written there on
//! first run.

#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(clippy::unwrap_used)]

use anyhow::Result;
use pixelfield_engine::app;
use pixelfield_engine::config::EngineConfig;
use tracing::info;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Main entry point.
fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::registry()
        .with(fmt::layer())
        .with(EnvFilter::from_default_env().add_directive("pixelfield=info".parse()?))
        .init();

    info!("Pixelfield starting...");
    info!("Version: {}", env!("CARGO_PKG_VERSION"));

    let config = match std::env::args_os().nth(1) {
        Some(path) => EngineConfig::try_load_from(&path)?,
        None => EngineConfig::load_or_create(),
    };

    let report = app::run(config)?;
    info!(
        "{} frames at {:.0} fps, {} clicks",
        report.frames,
        report.fps,
        report.clicks.len()
    );

    info!("Pixelfield shutdown complete");
    Ok(())
}
