use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// roomguard: building telemetry watchdog
///
/// Watches per-room sensor readings, detects wasteful, faulty or dangerous
/// conditions, and emits deduplicated, escalating alerts.
#[derive(Parser, Debug)]
#[command(name = "roomguard")]
#[command(version, about, long_about)]
pub struct Cli {
    /// Subcommand to execute (defaults to the daemon)
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Path to custom config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the evaluation loop until Ctrl+C or SIGTERM
    #[command(alias = "d")]
    Daemon,

    /// Run a single evaluation cycle and print the result without delivering alerts
    #[command(alias = "sc")]
    Scan {
        /// Output as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show the effective configuration
    #[command(alias = "c")]
    Config {
        /// Only validate, exit non-zero if invalid
        #[arg(long)]
        check: bool,
    },
}
