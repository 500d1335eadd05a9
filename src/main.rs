//! eeburn - Parallel EEPROM programmer
//!
//! Host tool for an eeburn programmer: a microcontroller wired to the
//! address, data and control lines of a 28C-style parallel EEPROM,
//! driven over a serial port with S1 records.

mod cli;
mod commands;
mod image;

use clap::Parser;
use cli::{Cli, Commands};

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // Initialize logger
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    // Set log level based on verbosity
    match cli.verbose {
        0 => {} // default (info)
        1 => log::set_max_level(log::LevelFilter::Debug),
        _ => log::set_max_level(log::LevelFilter::Trace),
    }

    match &cli.command {
        Commands::Write { input, erase } => commands::run_write(&cli, input, *erase),
        Commands::Verify { input } => commands::run_verify(&cli, input),
        Commands::Erase => commands::run_erase(&cli),
    }
}
