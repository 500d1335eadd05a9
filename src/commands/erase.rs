//! Erase command implementation

use super::connect;
use crate::cli::Cli;
use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Run the erase command
pub fn run_erase(cli: &Cli) -> Result<(), Box<dyn std::error::Error>> {
    let mut burner = connect(cli)?;

    let pb = ProgressBar::new_spinner();
    pb.set_style(ProgressStyle::default_spinner().template("{spinner:.green} {msg}")?);
    pb.set_message(format!("Erasing {} bytes...", cli.rom_size));
    pb.enable_steady_tick(Duration::from_millis(100));

    if let Err(e) = burner.erase() {
        pb.abandon_with_message("Erase failed!");
        return Err(e.into());
    }
    pb.finish_with_message("Chip erase complete");

    burner.end()?;
    Ok(())
}
