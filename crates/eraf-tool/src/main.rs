//! `eraf-tool`: create, inspect, seal and open ERAF containers.
//!
//! Startup sequence:
//! 1. Parse the command line.
//! 2. Load and validate [`Config`] from `ERAF_`-prefixed environment variables.
//! 3. Initialise the tracing subscriber.
//! 4. Run the subcommand.

mod commands;
mod config;
mod report;
mod telemetry;

use anyhow::Result;
use clap::Parser;
use tracing::debug;

use commands::Commands;
use config::Config;

#[derive(Debug, Parser)]
#[command(name = "eraf-tool", version, about = "ERAF container tool")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

fn main() -> Result<()> {
    // -----------------------------------------------------------------------
    // 1. Command line
    // -----------------------------------------------------------------------
    let cli = Cli::parse();

    // -----------------------------------------------------------------------
    // 2. Configuration
    // -----------------------------------------------------------------------
    let cfg = Config::from_env().map_err(|e| {
        // Telemetry is not yet up; write to stderr directly.
        eprintln!("ERROR: configuration invalid: {e:#}");
        e
    })?;

    // -----------------------------------------------------------------------
    // 3. Telemetry
    // -----------------------------------------------------------------------
    telemetry::init_telemetry(&cfg.log_level)?;
    debug!(version = env!("CARGO_PKG_VERSION"), "eraf-tool starting");

    // -----------------------------------------------------------------------
    // 4. Command
    // -----------------------------------------------------------------------
    commands::run(cli.command, &cfg)
}
