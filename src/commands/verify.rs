//! Verify command implementation

use super::{connect, send_image};
use crate::cli::Cli;
use crate::image::Image;
use eeburn_serial::PageOp;
use std::path::Path;

/// Run the verify command
pub fn run_verify(cli: &Cli, input: &Path) -> Result<(), Box<dyn std::error::Error>> {
    let image = Image::load(input, cli.rom_size)?;
    println!("Read {} records from {:?}", image.pages(), input);

    let mut burner = connect(cli)?;
    send_image(&mut burner, &image, PageOp::Verify)?;
    burner.end()?;

    println!("Verification passed!");
    Ok(())
}
