//! # attendo
//!
//! Command-line client for the attendance gateway. Loads settings, wires
//! the auth and data clients to the remote store, and runs one command.

#![deny(unsafe_code)]

mod app;
mod commands;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;

use crate::app::App;
use crate::commands::Command;

/// Attendance gateway client.
#[derive(Parser, Debug)]
#[command(name = "attendo", about = "Attendance gateway client")]
struct Cli {
    /// Settings file (defaults to `~/.attendo/settings.json`).
    #[arg(long, global = true)]
    settings: Option<PathBuf>,

    /// Log level filter (overrides settings).
    #[arg(long, global = true)]
    log_level: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Cli::parse();

    let settings_path = args
        .settings
        .clone()
        .unwrap_or_else(attendo_settings::settings_path);
    let settings = attendo_settings::load_settings_from_path(&settings_path)
        .with_context(|| format!("Failed to load settings from {}", settings_path.display()))?;
    if attendo_settings::init_settings(settings).is_err() {
        tracing::warn!("settings already initialized");
    }
    let settings = attendo_settings::get_settings();

    let level = args.log_level.as_deref().unwrap_or(&settings.logging.level);
    attendo_core::logging::init_subscriber(level, settings.logging.format);

    if !args.command.needs_remote() {
        println!("{}", commands::run_local(args.command)?);
        return Ok(());
    }

    let app = App::from_settings(settings)?;
    let result = commands::run(&app, args.command).await;
    app.shutdown();
    println!("{}", result?);
    Ok(())
}

// ─────────────────────────────────────────────────────────────────────────────
// Tests
// ─────────────────────────────────────────────────────────────────────────────
