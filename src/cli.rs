//! Command-line interface for Thermolog.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Thermolog - temperature/humidity telemetry service
#[derive(Parser)]
#[command(name = "thermolog")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to a config file (overrides the default lookup)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run the HTTP service (default)
    Serve,

    /// Write a default config.toml if none exists
    Init,
}
