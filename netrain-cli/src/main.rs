//! ## netrain-cli
//! **Packet capture rendered as falling streams**
//!
//! `netrain run` taps a live interface; `netrain simulate` drives the same pipeline
//! from a seeded synthetic tap. Both render headlessly to the log.

use clap::Parser;
use netrain_telemetry::EventLogger;

mod commands;
mod headless;

use commands::{Cli, Commands};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let config = commands::load_config(cli.config.as_ref())?;
    EventLogger::init(&config.telemetry.log_level)?;

    match cli.command {
        Commands::Run(args) => commands::run_live(args, config),
        Commands::Simulate(args) => commands::run_simulation(args, config),
    }
}
