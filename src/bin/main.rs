//! CLI entry point for the tick-driven CPU/memory simulator.

use anyhow::Context;
use clap::Parser;
use std::process::ExitCode;
use tickcore::prelude::*;
use tracing::error;

fn main() -> ExitCode {
    let cli = Cli::parse();
    tickcore::init_logging(cli.verbose);

    match run(cli) {
        Ok(report) => {
            println!("{}", report.render());
            ExitCode::SUCCESS
        }
        Err(e) => {
            error!(error = ?e, "tickcore run failed");
            ExitCode::FAILURE
        }
    }
}

/// Builds the validated config and runs the simulation, wrapping both
/// fallible stages with `anyhow::Context` so the top-level error carries
/// which stage failed.
fn run(cli: Cli) -> anyhow::Result<Report> {
    let config = Config::from_cli(cli).context("invalid configuration")?;
    tickcore::run_simulation(&config).context("simulation failed")
}
