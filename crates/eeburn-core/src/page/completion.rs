//! Write completion detection
//!
//! After the last byte of a page is latched the device starts its internal
//! write cycle, which takes milliseconds. While the cycle runs, reads return
//! an unstable value (bit 6 toggles on every output-enable cycle). Once it
//! finishes, reads return the stored data. Polling for two identical reads
//! therefore detects the end of the cycle without a fixed delay.

use crate::bus::ParallelBus;
use crate::config::{MAX_POLL_RETRIES, T_ACCESS_NS, T_OUTPUT_FLOAT_NS};
use crate::error::{ProgramError, ProgramResult};

/// Wait for the device to finish the write cycle started by the last write
///
/// On entry the device must be selected with the data bus in read mode and
/// output-enable and write-enable released. The device is deselected on
/// return.
///
/// Returns `Ok(())` if the device settles on `expected`,
/// [`ProgramError::WriteCompletionDataMismatch`] if it settles on anything
/// else and [`ProgramError::WriteCompletionTimeout`] if it keeps toggling
/// for [`MAX_POLL_RETRIES`] samples.
pub fn wait_for_write_completion<B: ParallelBus + ?Sized>(
    bus: &mut B,
    expected: u8,
) -> ProgramResult {
    wait_for_write_completion_with(bus, expected, MAX_POLL_RETRIES)
}

/// [`wait_for_write_completion`] with an explicit retry ceiling
pub fn wait_for_write_completion_with<B: ParallelBus + ?Sized>(
    bus: &mut B,
    expected: u8,
    max_retries: u32,
) -> ProgramResult {
    let mut prev = sample(bus);
    let mut result = Err(ProgramError::WriteCompletionTimeout);

    for attempt in 0..max_retries {
        let next = sample(bus);
        if next == prev {
            result = if next == expected {
                Ok(())
            } else {
                Err(ProgramError::WriteCompletionDataMismatch)
            };
            log::trace!(
                "write completion after {} polls: read 0x{:02X}, expected 0x{:02X}",
                attempt + 1,
                next,
                expected
            );
            break;
        }
        prev = next;
    }

    bus.set_chip_select(false);

    if let Err(e) = result {
        log::warn!("write completion failed: {}", e);
    }
    result
}

/// One output-enable cycle: enable, let the outputs settle, sample, release
fn sample<B: ParallelBus + ?Sized>(bus: &mut B) -> u8 {
    bus.set_output_enable(true);
    bus.delay_ns(T_ACCESS_NS);
    let data = bus.read_data();
    bus.set_output_enable(false);
    bus.delay_ns(T_OUTPUT_FLOAT_NS);
    data
}
