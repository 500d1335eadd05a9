//! CLI command implementations
//!
//! Every command runs one session: open the port, `BEGIN`, do the work,
//! `END`. The programmer holds the target's bus for the whole session.

mod erase;
mod verify;
mod write;

pub use erase::run_erase;
pub use verify::run_verify;
pub use write::run_write;

use crate::cli::Cli;
use crate::image::Image;
use eeburn_serial::{Burner, PageOp, SerialTransport, Transport};
use indicatif::{ProgressBar, ProgressStyle};

/// Open the programmer port and start a session
pub fn connect(cli: &Cli) -> Result<Burner<SerialTransport>, Box<dyn std::error::Error>> {
    let transport = SerialTransport::open(&cli.port, Some(cli.speed))?;
    let mut burner = Burner::new(transport);
    burner.set_timeout(cli.timeout_ms);
    burner.begin()?;
    log::debug!("Session started on {}", cli.port);
    Ok(burner)
}

/// Send every record of `image` as a page command
///
/// Returns the number of pages the programmer had to write.
pub fn send_image<T: Transport>(
    burner: &mut Burner<T>,
    image: &Image,
    op: PageOp,
) -> Result<usize, Box<dyn std::error::Error>> {
    let verb = match op {
        PageOp::Write => "Writing",
        PageOp::Verify => "Verifying",
    };
    println!("{} {} bytes in {} pages", verb, image.size(), image.pages());

    let pb = ProgressBar::new(image.pages() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} pages ({eta}) {msg}")?
            .progress_chars("#>-"),
    );
    pb.set_message(verb);

    let mut updated = 0usize;
    for record in &image.records {
        log::debug!(
            "Sending page: address=0x{:04X} size={}",
            record.address,
            record.size
        );
        let ack = match burner.send_page(op, &record.text, record.address, record.size) {
            Ok(ack) => ack,
            Err(e) => {
                pb.abandon_with_message(format!("{} failed at 0x{:04X}", verb, record.address));
                return Err(e.into());
            }
        };
        if ack.updated() {
            updated += 1;
        }
        pb.inc(1);
    }

    pb.finish_with_message(format!("{} done, {} pages updated", verb, updated));
    Ok(updated)
}
