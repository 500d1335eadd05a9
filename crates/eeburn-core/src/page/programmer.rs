//! Page write, verify and erase sequencing

use core::fmt;

use crate::bus::{BusFeatures, Direction, ParallelBus};
use crate::config::{
    page_of, ADDRESS_SPACE, CHIP_ERASE_SEQUENCE, PAGE_SIZE, T_ACCESS_NS, T_CHIP_ERASE_MS,
    T_OUTPUT_FLOAT_NS, T_WRITE_PULSE_HIGH_NS, T_WRITE_PULSE_NS,
};
use crate::error::{ProgramError, ProgramResult};

use super::completion::wait_for_write_completion;

/// Check that a write of `size` bytes at `address` stays within one page
///
/// Writes that run past the end of the 16-bit address space necessarily
/// leave the last page, so they are rejected too.
pub fn check_page_bounds(address: u16, size: usize) -> ProgramResult {
    if size == 0 {
        return Ok(());
    }

    let start = address as u32;
    let end = start + size as u32 - 1;

    if size > PAGE_SIZE || end >= ADDRESS_SPACE || page_of(start) != page_of(end) {
        return Err(ProgramError::PageBoundaryCrossed);
    }

    Ok(())
}

/// First byte that differs during a page verify
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifyMismatch {
    /// Absolute address of the byte
    pub address: u16,
    /// Byte the host asked for
    pub expected: u8,
    /// Byte read back from the device
    pub actual: u8,
}

impl VerifyMismatch {
    /// Page containing the mismatching byte
    pub fn page(&self) -> u32 {
        page_of(self.address as u32)
    }

    /// Offset of the mismatching byte within its page
    pub fn offset(&self) -> usize {
        self.address as usize % PAGE_SIZE
    }
}

impl fmt::Display for VerifyMismatch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "address 0x{:04X} (page {} offset {}) expected 0x{:02X} got 0x{:02X}",
            self.address,
            self.page(),
            self.offset(),
            self.expected,
            self.actual
        )
    }
}

/// Page programmer
///
/// Owns the bus driver and tracks whether a session currently owns the bus.
/// Validation failures (page boundary, missing session) are reported before
/// any line is touched; device failures are reported as they are observed
/// and never retried.
pub struct PageProgrammer<B: ParallelBus> {
    bus: B,
    bus_owned: bool,
}

impl<B: ParallelBus> PageProgrammer<B> {
    /// Create a programmer, putting the bus lines in their idle state
    pub fn new(mut bus: B) -> Self {
        bus.init();
        Self {
            bus,
            bus_owned: false,
        }
    }

    /// Get a reference to the bus driver
    pub fn bus(&self) -> &B {
        &self.bus
    }

    /// Whether a session currently owns the bus
    pub fn is_bus_owned(&self) -> bool {
        self.bus_owned
    }

    /// Take ownership of the bus for a session
    ///
    /// Safe to call again while the bus is already owned.
    pub fn capture_bus(&mut self) {
        self.bus.capture_bus();
        self.bus_owned = true;
    }

    /// Give the bus back at the end of a session
    pub fn release_bus(&mut self, reset: bool) {
        self.bus.release_bus(reset);
        self.bus_owned = false;
    }

    /// Write up to one page of data starting at `address`
    ///
    /// An empty write succeeds without touching the bus. The result is the
    /// outcome of write completion polling on the last byte.
    pub fn write_page(&mut self, address: u16, data: &[u8]) -> ProgramResult {
        let Some(&last) = data.last() else {
            return Ok(());
        };

        check_page_bounds(address, data.len())?;

        if self.bus.features().contains(BusFeatures::SHARED_BUS) && !self.bus_owned {
            return Err(ProgramError::OutOfSession);
        }

        log::debug!("write page: addr=0x{:04X} size={}", address, data.len());

        self.bus.set_chip_select(true);
        self.bus.set_direction(Direction::Write);
        for (offset, &byte) in data.iter().enumerate() {
            self.latch(address.wrapping_add(offset as u16), byte);
        }
        self.bus.set_direction(Direction::Read);

        wait_for_write_completion(&mut self.bus, last)
    }

    /// Write a single byte
    pub fn write_byte(&mut self, address: u16, data: u8) -> ProgramResult {
        self.write_page(address, &[data])
    }

    /// Compare device contents at `address` against `data`
    ///
    /// Stops at the first differing byte and reports it.
    pub fn verify_page(&mut self, address: u16, data: &[u8]) -> Result<(), VerifyMismatch> {
        self.bus.set_chip_select(true);
        self.bus.set_output_enable(true);

        let mut result = Ok(());
        for (offset, &expected) in data.iter().enumerate() {
            let byte_address = address.wrapping_add(offset as u16);
            let actual = self.sample(byte_address);
            if actual != expected {
                result = Err(VerifyMismatch {
                    address: byte_address,
                    expected,
                    actual,
                });
                break;
            }
            self.bus.delay_ns(T_OUTPUT_FLOAT_NS);
        }

        self.bus.set_output_enable(false);
        self.bus.set_chip_select(false);

        if let Err(mismatch) = &result {
            log::debug!("verify page 0x{:04X}: mismatch at {}", address, mismatch);
        }
        result
    }

    /// Read a single byte
    pub fn read_byte(&mut self, address: u16) -> u8 {
        self.bus.set_chip_select(true);
        self.bus.set_output_enable(true);
        let data = self.sample(address);
        self.bus.set_output_enable(false);
        self.bus.set_chip_select(false);
        data
    }

    /// Erase the whole device with the software chip erase sequence
    ///
    /// Needs a session even on a dedicated bus. The device is not polled
    /// afterwards; the worst case erase time is waited out instead.
    pub fn chip_erase(&mut self) -> ProgramResult {
        if !self.bus_owned {
            return Err(ProgramError::OutOfSession);
        }

        log::debug!("chip erase");

        self.bus.set_chip_select(true);
        self.bus.set_direction(Direction::Write);
        for &(address, data) in CHIP_ERASE_SEQUENCE.iter() {
            self.latch(address, data);
        }
        self.bus.set_direction(Direction::Read);
        self.bus.set_chip_select(false);

        self.bus.delay_ms(T_CHIP_ERASE_MS);
        Ok(())
    }

    /// Latch one byte: the falling edge of ~WE latches the address, the
    /// rising edge latches the data
    fn latch(&mut self, address: u16, data: u8) {
        self.bus.set_address(address);
        self.bus.write_data(data);
        self.bus.set_write_enable(true);
        self.bus.delay_ns(T_WRITE_PULSE_NS);
        self.bus.set_write_enable(false);
        self.bus.delay_ns(T_WRITE_PULSE_HIGH_NS);
    }

    /// Read one byte with chip select and output enable already asserted
    fn sample(&mut self, address: u16) -> u8 {
        self.bus.set_address(address);
        self.bus.delay_ns(T_ACCESS_NS);
        self.bus.read_data()
    }
}
