//! Emulated parallel EEPROM

use alloc::vec;
use alloc::vec::Vec;

use eeburn_core::bus::{BusFeatures, Direction, ParallelBus};
use eeburn_core::config::{CHIP_ERASE_SEQUENCE, ROM_SIZE};

/// Configuration for the dummy EEPROM
#[derive(Debug, Clone)]
pub struct DummyConfig {
    /// Device size in bytes; addresses wrap around at this size
    pub size: usize,
    /// Output-enabled reads that toggle before a write cycle settles
    pub busy_samples: u32,
    /// Advertise a bus shared with another master
    pub shared_bus: bool,
    /// Never finish a write cycle
    pub stuck_busy: bool,
    /// Store the complement of every written byte
    pub corrupt_writes: bool,
}

impl Default for DummyConfig {
    fn default() -> Self {
        Self {
            size: ROM_SIZE,
            busy_samples: 4,
            shared_bus: false,
            stuck_busy: false,
            corrupt_writes: false,
        }
    }
}

/// Hardware activity seen by the dummy EEPROM
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BusStats {
    /// Number of `ParallelBus` calls, `features()` excluded
    pub calls: usize,
    /// `read_data` calls
    pub reads: usize,
    /// Completed write-enable pulses
    pub we_pulses: usize,
    /// `capture_bus` calls
    pub captures: usize,
    /// `release_bus` calls
    pub releases: usize,
    /// Reset flag of the last `release_bus` call
    pub last_reset: Option<bool>,
    /// Accumulated `delay_ns` time
    pub delay_ns: u64,
    /// Accumulated `delay_ms` time
    pub delay_ms: u64,
}

/// Dummy parallel EEPROM
///
/// Emulates the pins of a 28C-style EEPROM: the falling edge of write
/// enable latches the address, the rising edge latches the data and starts
/// a write cycle. During the cycle every output-enabled read flips bit 6.
pub struct DummyEeprom {
    config: DummyConfig,
    data: Vec<u8>,
    address: u16,
    data_out: u8,
    direction: Direction,
    selected: bool,
    output_enabled: bool,
    write_enabled: bool,
    latched_address: u16,
    busy: u32,
    toggle: bool,
    unlock: Vec<(u16, u8)>,
    captured: bool,
    stats: BusStats,
}

impl DummyEeprom {
    /// Create an erased dummy EEPROM with the given configuration
    pub fn new(config: DummyConfig) -> Self {
        let data = vec![0xFF; config.size];
        Self {
            config,
            data,
            address: 0,
            data_out: 0,
            direction: Direction::Read,
            selected: false,
            output_enabled: false,
            write_enabled: false,
            latched_address: 0,
            busy: 0,
            toggle: false,
            unlock: Vec::new(),
            captured: false,
            stats: BusStats::default(),
        }
    }

    /// Create an erased 32 KiB dummy EEPROM on a dedicated bus
    pub fn new_default() -> Self {
        Self::new(DummyConfig::default())
    }

    /// Create a dummy EEPROM with pre-filled contents
    pub fn with_data(config: DummyConfig, initial_data: &[u8]) -> Self {
        let mut eeprom = Self::new(config);
        let len = core::cmp::min(initial_data.len(), eeprom.data.len());
        eeprom.data[..len].copy_from_slice(&initial_data[..len]);
        eeprom
    }

    /// Get a reference to the device contents
    pub fn data(&self) -> &[u8] {
        &self.data
    }

    /// Hardware activity so far
    pub fn stats(&self) -> BusStats {
        self.stats
    }

    /// Whether the bus is currently captured from the other master
    pub fn is_captured(&self) -> bool {
        self.captured
    }

    /// Whether the device is selected
    pub fn is_selected(&self) -> bool {
        self.selected
    }

    /// Whether a write cycle is still running
    pub fn is_busy(&self) -> bool {
        self.busy > 0
    }

    fn index(&self, address: u16) -> usize {
        address as usize % self.data.len()
    }

    fn latch_data(&mut self, address: u16, value: u8) {
        let step = (address, value);

        if CHIP_ERASE_SEQUENCE.get(self.unlock.len()) == Some(&step) {
            self.unlock.push(step);
            if self.unlock.len() == CHIP_ERASE_SEQUENCE.len() {
                log::debug!("dummy: chip erase");
                self.unlock.clear();
                self.data.fill(0xFF);
                self.busy = 0;
            }
            return;
        }

        self.flush_unlock();
        if CHIP_ERASE_SEQUENCE[0] == step {
            self.unlock.push(step);
        } else {
            self.store(address, value);
        }
    }

    /// Bytes held back as a possible erase prefix turn out to be data
    fn flush_unlock(&mut self) {
        let pending = core::mem::take(&mut self.unlock);
        for (address, value) in pending {
            self.store(address, value);
        }
    }

    fn store(&mut self, address: u16, value: u8) {
        let index = self.index(address);
        self.data[index] = if self.config.corrupt_writes {
            !value
        } else {
            value
        };
        self.busy = if self.config.stuck_busy {
            u32::MAX
        } else {
            self.config.busy_samples
        };
    }
}

impl ParallelBus for DummyEeprom {
    fn features(&self) -> BusFeatures {
        if self.config.shared_bus {
            BusFeatures::SHARED_BUS
        } else {
            BusFeatures::empty()
        }
    }

    fn init(&mut self) {
        self.stats.calls += 1;
        self.direction = Direction::Read;
        self.selected = false;
        self.output_enabled = false;
        self.write_enabled = false;
    }

    fn set_address(&mut self, address: u16) {
        self.stats.calls += 1;
        self.address = address;
    }

    fn read_data(&mut self) -> u8 {
        self.stats.calls += 1;
        self.stats.reads += 1;
        if !self.selected || !self.output_enabled || self.direction == Direction::Write {
            return 0xFF;
        }

        let stored = self.data[self.index(self.address)];
        if self.busy == 0 {
            return stored;
        }

        if !self.config.stuck_busy {
            self.busy -= 1;
        }
        self.toggle = !self.toggle;
        if self.toggle {
            stored ^ 0x40
        } else {
            stored
        }
    }

    fn write_data(&mut self, data: u8) {
        self.stats.calls += 1;
        self.data_out = data;
    }

    fn set_direction(&mut self, direction: Direction) {
        self.stats.calls += 1;
        if direction == Direction::Read {
            self.flush_unlock();
        }
        self.direction = direction;
    }

    fn set_chip_select(&mut self, selected: bool) {
        self.stats.calls += 1;
        self.selected = selected;
    }

    fn set_output_enable(&mut self, enabled: bool) {
        self.stats.calls += 1;
        self.output_enabled = enabled;
    }

    fn set_write_enable(&mut self, enabled: bool) {
        self.stats.calls += 1;
        if self.selected && self.direction == Direction::Write {
            if enabled && !self.write_enabled {
                self.latched_address = self.address;
            } else if !enabled && self.write_enabled {
                self.stats.we_pulses += 1;
                self.latch_data(self.latched_address, self.data_out);
            }
        }
        self.write_enabled = enabled;
    }

    fn delay_ns(&mut self, ns: u32) {
        self.stats.calls += 1;
        self.stats.delay_ns += ns as u64;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.stats.calls += 1;
        self.stats.delay_ms += ms as u64;
    }

    fn capture_bus(&mut self) {
        self.stats.calls += 1;
        self.stats.captures += 1;
        self.captured = true;
    }

    fn release_bus(&mut self, reset: bool) {
        self.stats.calls += 1;
        self.stats.releases += 1;
        self.stats.last_reset = Some(reset);
        self.captured = false;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeburn_core::config::{MAX_POLL_RETRIES, PAGE_SIZE, T_CHIP_ERASE_MS};
    use eeburn_core::page::{wait_for_write_completion_with, PageProgrammer, VerifyMismatch};
    use eeburn_core::ProgramError;

    fn programmer(config: DummyConfig) -> PageProgrammer<DummyEeprom> {
        PageProgrammer::new(DummyEeprom::new(config))
    }

    #[test]
    fn test_write_page() {
        let mut prog = programmer(DummyConfig::default());
        assert_eq!(prog.write_page(0x1234, &[0xAA, 0xBB, 0xCC]), Ok(()));

        let bus = prog.bus();
        assert_eq!(&bus.data()[0x1234..0x1237], &[0xAA, 0xBB, 0xCC]);
        assert_eq!(bus.stats().we_pulses, 3);
        assert!(!bus.is_selected());
    }

    #[test]
    fn test_write_full_page() {
        let mut prog = programmer(DummyConfig::default());
        let page: Vec<u8> = (0..PAGE_SIZE as u8).collect();
        assert_eq!(prog.write_page(0x0140, &page), Ok(()));
        assert_eq!(&prog.bus().data()[0x0140..0x0180], page.as_slice());
        assert_eq!(prog.bus().stats().we_pulses, PAGE_SIZE);
    }

    #[test]
    fn test_boundary_violation_touches_nothing() {
        let mut prog = programmer(DummyConfig::default());
        let before = prog.bus().stats();

        assert_eq!(
            prog.write_page(0x003F, &[0x01, 0x02]),
            Err(ProgramError::PageBoundaryCrossed)
        );
        assert_eq!(
            prog.write_page(0x0000, &[0u8; PAGE_SIZE + 1]),
            Err(ProgramError::PageBoundaryCrossed)
        );

        assert_eq!(prog.bus().stats(), before);
        assert!(prog.bus().data().iter().all(|&b| b == 0xFF));
    }

    #[test]
    fn test_empty_write_touches_nothing() {
        let mut prog = programmer(DummyConfig::default());
        let before = prog.bus().stats();
        assert_eq!(prog.write_page(0x003F, &[]), Ok(()));
        assert_eq!(prog.bus().stats(), before);
    }

    #[test]
    fn test_shared_bus_requires_capture() {
        let mut prog = programmer(DummyConfig {
            shared_bus: true,
            ..Default::default()
        });
        let before = prog.bus().stats();

        assert_eq!(
            prog.write_page(0x0000, &[0x12]),
            Err(ProgramError::OutOfSession)
        );
        assert_eq!(prog.bus().stats(), before);

        prog.capture_bus();
        assert!(prog.is_bus_owned());
        assert!(prog.bus().is_captured());
        assert_eq!(prog.write_page(0x0000, &[0x12]), Ok(()));
        assert_eq!(prog.bus().data()[0], 0x12);

        prog.release_bus(false);
        assert!(!prog.bus().is_captured());
        assert_eq!(prog.bus().stats().last_reset, Some(false));
        assert_eq!(
            prog.write_page(0x0000, &[0x34]),
            Err(ProgramError::OutOfSession)
        );
    }

    #[test]
    fn test_dedicated_bus_writes_without_capture() {
        let mut prog = programmer(DummyConfig::default());
        assert_eq!(prog.write_byte(0x7FFF, 0x5A), Ok(()));
        assert_eq!(prog.read_byte(0x7FFF), 0x5A);
    }

    #[test]
    fn test_write_completion_settles() {
        let mut prog = programmer(DummyConfig {
            busy_samples: 1000,
            ..Default::default()
        });
        assert_eq!(prog.write_byte(0x0100, 0x00), Ok(()));
        assert!(!prog.bus().is_busy());
    }

    #[test]
    fn test_write_completion_data_mismatch() {
        let mut prog = programmer(DummyConfig {
            corrupt_writes: true,
            ..Default::default()
        });
        assert_eq!(
            prog.write_byte(0x0100, 0x3C),
            Err(ProgramError::WriteCompletionDataMismatch)
        );
        assert_eq!(prog.bus().data()[0x0100], 0xC3);
        assert!(!prog.bus().is_selected());
    }

    #[test]
    fn test_write_completion_timeout() {
        let mut prog = programmer(DummyConfig {
            stuck_busy: true,
            ..Default::default()
        });
        let before = prog.bus().stats().reads;
        assert_eq!(
            prog.write_byte(0x0100, 0x3C),
            Err(ProgramError::WriteCompletionTimeout)
        );
        // First sample plus one per retry
        assert_eq!(
            prog.bus().stats().reads - before,
            MAX_POLL_RETRIES as usize + 1
        );
        assert!(!prog.bus().is_selected());
    }

    #[test]
    fn test_write_completion_retry_ceiling() {
        let mut eeprom = DummyEeprom::new(DummyConfig {
            busy_samples: 10,
            ..Default::default()
        });
        {
            let mut prog = PageProgrammer::new(&mut eeprom);
            assert_eq!(prog.write_byte(0x0010, 0x77), Ok(()));
        }

        // Start another cycle by hand and give up before it settles
        eeprom.set_chip_select(true);
        eeprom.set_direction(Direction::Write);
        eeprom.set_address(0x0010);
        eeprom.write_data(0x78);
        eeprom.set_write_enable(true);
        eeprom.set_write_enable(false);
        eeprom.set_direction(Direction::Read);
        assert_eq!(
            wait_for_write_completion_with(&mut eeprom, 0x78, 3),
            Err(ProgramError::WriteCompletionTimeout)
        );
        assert!(!eeprom.is_selected());
    }

    #[test]
    fn test_verify_page() {
        let mut contents = vec![0u8; 0x100];
        contents[0x41] = 0x12;
        let mut prog = PageProgrammer::new(DummyEeprom::with_data(
            DummyConfig::default(),
            &contents,
        ));

        assert_eq!(prog.verify_page(0x0040, &[0x00, 0x12, 0x00]), Ok(()));
        assert_eq!(
            prog.verify_page(0x0040, &[0x00, 0x13, 0x99]),
            Err(VerifyMismatch {
                address: 0x0041,
                expected: 0x13,
                actual: 0x12,
            })
        );
        assert!(!prog.bus().is_selected());
        assert_eq!(prog.bus().stats().we_pulses, 0);
    }

    #[test]
    fn test_chip_erase() {
        let mut prog = PageProgrammer::new(DummyEeprom::with_data(
            DummyConfig::default(),
            &[0u8; ROM_SIZE],
        ));

        assert_eq!(prog.chip_erase(), Err(ProgramError::OutOfSession));
        assert_eq!(prog.bus().stats().we_pulses, 0);

        prog.capture_bus();
        assert_eq!(prog.chip_erase(), Ok(()));

        let bus = prog.bus();
        assert_eq!(bus.stats().we_pulses, CHIP_ERASE_SEQUENCE.len());
        assert!(bus.stats().delay_ms >= T_CHIP_ERASE_MS as u64);
        assert!(bus.data().iter().all(|&b| b == 0xFF));
        assert!(!bus.is_selected());
    }

    #[test]
    fn test_unlock_prefix_written_as_data() {
        let mut prog = programmer(DummyConfig::default());
        assert_eq!(prog.write_byte(0x5555, 0xAA), Ok(()));
        assert_eq!(prog.write_byte(0x2AAA, 0x55), Ok(()));
        assert_eq!(prog.bus().data()[0x5555], 0xAA);
        assert_eq!(prog.bus().data()[0x2AAA], 0x55);
    }

    #[test]
    fn test_addresses_wrap_at_device_size() {
        let mut prog = programmer(DummyConfig {
            size: 0x1000,
            ..Default::default()
        });
        assert_eq!(prog.write_byte(0x1001, 0x42), Ok(()));
        assert_eq!(prog.bus().data()[0x0001], 0x42);
    }
}
