//! Device geometry, timing and protocol constants
//!
//! The values describe the reference target: an AT28C256-class 5 V parallel
//! EEPROM driven by a 16 MHz controller.

// =============================================================================
// Device geometry
// =============================================================================

/// log2 of the page size
pub const PAGE_BITS: u32 = 6;

/// Write granularity of the device. A page write never spans two pages.
pub const PAGE_SIZE: usize = 1 << PAGE_BITS;

/// Size of the 16-bit address space
pub const ADDRESS_SPACE: u32 = 1 << 16;

/// Size of the reference device (32 KiB)
pub const ROM_SIZE: usize = 32 * 1024;

/// Page number containing `address`
pub const fn page_of(address: u32) -> u32 {
    address >> PAGE_BITS
}

// =============================================================================
// Timing (nanosecond figures are datasheet minimums)
// =============================================================================

/// Write pulse width (tWP)
pub const T_WRITE_PULSE_NS: u32 = 100;

/// Write pulse width high (tWPH)
pub const T_WRITE_PULSE_HIGH_NS: u32 = 50;

/// Address / chip-enable / output-enable to output delay (tACC, tCE, tOE)
pub const T_ACCESS_NS: u32 = 150;

/// Output float after output-enable is released (tDF)
pub const T_OUTPUT_FLOAT_NS: u32 = 50;

/// Worst case chip erase time (tEC)
pub const T_CHIP_ERASE_MS: u32 = 20;

/// Retry ceiling for write completion polling
pub const MAX_POLL_RETRIES: u32 = 100_000;

// =============================================================================
// Software chip erase
// =============================================================================

/// First unlock address
pub const UNLOCK_ADDR_1: u16 = 0x5555;

/// Second unlock address
pub const UNLOCK_ADDR_2: u16 = 0x2AAA;

/// The six (address, data) writes that erase the whole device
pub const CHIP_ERASE_SEQUENCE: [(u16, u8); 6] = [
    (UNLOCK_ADDR_1, 0xAA),
    (UNLOCK_ADDR_2, 0x55),
    (UNLOCK_ADDR_1, 0x80),
    (UNLOCK_ADDR_1, 0xAA),
    (UNLOCK_ADDR_2, 0x55),
    (UNLOCK_ADDR_1, 0x10),
];

// =============================================================================
// Link framing
// =============================================================================

/// Largest payload an S1 record can carry (byte count 255 minus 3)
pub const MAX_RECORD_PAYLOAD: usize = 252;

/// Longest S1 record: marker, count, address, data, checksum
pub const MAX_RECORD_LEN: usize = 2 + 2 + 4 + 2 * MAX_RECORD_PAYLOAD + 2;

/// Line buffer size: page command tag, longest record and a carriage return
pub const LINE_BUFFER_SIZE: usize = 1 + MAX_RECORD_LEN + 1;

/// Default idle timeout between two bytes of the same line
pub const DEFAULT_READ_TIMEOUT_MS: u32 = 1000;
