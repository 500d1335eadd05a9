//! Write command implementation

use super::{connect, send_image};
use crate::cli::Cli;
use crate::image::Image;
use eeburn_serial::PageOp;
use std::path::Path;

/// Run the write command
///
/// Pages that already match are skipped by the programmer. If any page had
/// to be written, the whole image is verified afterwards.
pub fn run_write(cli: &Cli, input: &Path, erase: bool) -> Result<(), Box<dyn std::error::Error>> {
    let image = Image::load(input, cli.rom_size)?;
    println!("Read {} records from {:?}", image.pages(), input);

    let mut burner = connect(cli)?;

    if erase {
        println!("Erasing chip");
        burner.erase()?;
    }

    let updated = send_image(&mut burner, &image, PageOp::Write)?;
    if updated > 0 {
        send_image(&mut burner, &image, PageOp::Verify)?;
    } else {
        println!("Device already up to date");
    }

    burner.end()?;
    println!("Done");
    Ok(())
}
