//! # CLI Interface
//!
//! Defines the command-line argument structure for `strongroom` using
//! `clap` derive. Supports three subcommands: `simulate`, `asset-id`, and
//! `version`.

use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::logging::LogFormat;

/// Strongroom custodial lending simulator.
///
/// Runs governed lending scenarios against an in-memory vault: members
/// approve a ticket, the ticket is redeemed step by step, and a JSON report
/// of every outcome is printed on stdout.
#[derive(Parser, Debug)]
#[command(
    name = "strongroom",
    about = "Strongroom custodial lending simulator",
    version,
    propagate_version = true
)]
pub struct StrongroomCli {
    /// Subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,
}

/// Top-level subcommands for the `strongroom` binary.
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run a scenario file and print the JSON report.
    Simulate(SimulateArgs),
    /// Print the deterministic asset identifier for a label.
    AssetId(AssetIdArgs),
    /// Print version information and exit.
    Version,
}

/// Arguments for the `simulate` subcommand.
#[derive(Parser, Debug)]
pub struct SimulateArgs {
    /// Path to the scenario file (JSON).
    #[arg(long, short = 's', env = "STRONGROOM_SCENARIO")]
    pub scenario: PathBuf,

    /// Default log filter when `RUST_LOG` is not set.
    #[arg(long, env = "STRONGROOM_LOG", default_value = "info")]
    pub log_level: String,

    /// Log output format. Logs always go to stderr.
    #[arg(long, value_enum, env = "STRONGROOM_LOG_FORMAT", default_value_t = LogFormat::Pretty)]
    pub log_format: LogFormat,

    /// Dump Prometheus metrics to stderr after the run.
    #[arg(long)]
    pub metrics: bool,
}

/// Arguments for the `asset-id` subcommand.
#[derive(Parser, Debug)]
pub struct AssetIdArgs {
    /// Human label the identifier is derived from.
    pub label: String,
}
