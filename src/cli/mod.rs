//! Command-line interface.
//!
//! The CLI drives the engine from a YAML backlog file with scripted
//! backend outcomes, so a run is fully reproducible without live
//! capabilities attached.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

pub mod backlog;
pub mod commands;
pub mod display;

#[derive(Parser)]
#[command(name = "conclave")]
#[command(about = "Conclave - Tiered Task Orchestration Engine", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output in JSON format
    #[arg(short, long, global = true)]
    pub json: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a backlog file and print per-task dispositions
    Run(RunArgs),

    /// Check a backlog file for structural problems without running it
    Validate(ValidateArgs),
}

#[derive(Args)]
pub struct RunArgs {
    /// Path to the YAML backlog file
    pub backlog: PathBuf,

    /// Path to a config file (defaults to .conclave/config.yaml)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

#[derive(Args)]
pub struct ValidateArgs {
    /// Path to the YAML backlog file
    pub backlog: PathBuf,
}

/// Print an error in the selected output format and exit non-zero.
pub fn handle_error(err: anyhow::Error, json: bool) {
    if json {
        eprintln!(
            "{}",
            serde_json::json!({ "error": format!("{err:#}") })
        );
    } else {
        eprintln!("error: {err:#}");
    }
    std::process::exit(1);
}
