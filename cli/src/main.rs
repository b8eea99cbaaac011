// Copyright (c) 2026 ALAS Technology. MIT License.
// See LICENSE for details.

//! # Strongroom CLI
//!
//! Entry point for the `strongroom` binary. Parses CLI arguments,
//! initializes logging and metrics, and runs lending scenarios against an
//! in-memory vault.
//!
//! The binary supports three subcommands:
//!
//! - `simulate` — run a JSON scenario and print the report
//! - `asset-id` — print the identifier derived from a label
//! - `version`  — print build version information

mod cli;
mod logging;
mod metrics;
mod scenario;

use anyhow::{Context, Result};
use clap::Parser;

use strongroom_protocol::asset::AssetId;

use cli::{Commands, StrongroomCli};
use metrics::SimulationMetrics;
use scenario::Scenario;

fn main() -> Result<()> {
    let cli = StrongroomCli::parse();

    match cli.command {
        Commands::Simulate(args) => simulate(args),
        Commands::AssetId(args) => {
            println!("{}", AssetId::from_label(&args.label));
            Ok(())
        }
        Commands::Version => {
            print_version();
            Ok(())
        }
    }
}

/// Runs one scenario file and prints the JSON report on stdout.
fn simulate(args: cli::SimulateArgs) -> Result<()> {
    logging::init_logging(&args.log_level, args.log_format);

    let scenario = Scenario::load(&args.scenario)?;
    tracing::info!(
        scenario = %args.scenario.display(),
        members = scenario.members.len(),
        threshold = scenario.threshold,
        steps = scenario.steps.len(),
        "running scenario"
    );

    let metrics = SimulationMetrics::new().context("failed to create metrics registry")?;
    let report = scenario::run(&scenario, &metrics, chrono::Utc::now())?;

    tracing::info!(
        failures = report.failures,
        retired = report.retired,
        "scenario finished"
    );
    println!(
        "{}",
        serde_json::to_string_pretty(&report).context("failed to serialize report")?
    );

    if args.metrics {
        eprint!("{}", metrics.encode().context("failed to encode metrics")?);
    }
    Ok(())
}

/// Prints version information to stdout.
fn print_version() {
    println!("strongroom {}", env!("CARGO_PKG_VERSION"));
    println!("protocol   {}", strongroom_protocol::config::PROTOCOL_VERSION);
    println!("encoding   v{}", strongroom_protocol::config::TICKET_ENCODING_VERSION);
}
