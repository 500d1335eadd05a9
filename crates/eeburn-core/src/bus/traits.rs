//! Parallel bus trait definitions

use bitflags::bitflags;

bitflags! {
    /// Parallel bus feature flags
    ///
    /// These flags describe how the programmer is wired to the device.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct BusFeatures: u32 {
        /// The device bus is shared with another bus master (e.g. the CPU
        /// of the board the EEPROM is soldered to). Programming is only
        /// allowed while a session has captured the bus.
        const SHARED_BUS = 1 << 0;
    }
}

impl Default for BusFeatures {
    fn default() -> Self {
        BusFeatures::empty()
    }
}

/// Direction of the data bus as seen from the programmer
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum Direction {
    /// Data pins are inputs; the device may drive them
    #[default]
    Read,
    /// Data pins are outputs driven by the programmer
    Write,
}

/// Parallel EEPROM bus driver
///
/// Implementations own the GPIO lines connected to the device. Every call
/// changes the line state immediately; the engine inserts the settle and
/// pulse delays between calls through [`delay_ns`](Self::delay_ns) and
/// [`delay_ms`](Self::delay_ms).
///
/// All control lines on the device are active low. The methods here take
/// the logical state: `set_chip_select(true)` selects the device.
///
/// ## Example: GPIO port implementation
///
/// ```ignore
/// impl ParallelBus for MegaPorts {
///     fn set_address(&mut self, address: u16) {
///         self.port_f.write(address as u8);
///         self.port_k.write((address >> 8) as u8);
///     }
///
///     fn read_data(&mut self) -> u8 {
///         self.port_l.read()
///     }
///
///     // ...
/// }
/// ```
pub trait ParallelBus {
    /// Get the features of this bus
    fn features(&self) -> BusFeatures {
        BusFeatures::empty()
    }

    /// Put all lines in their idle state: address and control lines as
    /// outputs with the control lines deasserted, data lines as inputs
    fn init(&mut self);

    /// Drive the address lines
    fn set_address(&mut self, address: u16);

    /// Sample the data lines
    fn read_data(&mut self) -> u8;

    /// Drive the data lines (only meaningful in [`Direction::Write`])
    fn write_data(&mut self, data: u8);

    /// Switch the data lines between input and output
    fn set_direction(&mut self, direction: Direction);

    /// Select or deselect the device (~CE)
    fn set_chip_select(&mut self, selected: bool);

    /// Enable or disable the device outputs (~OE)
    fn set_output_enable(&mut self, enabled: bool);

    /// Assert or release the write strobe (~WE)
    fn set_write_enable(&mut self, enabled: bool);

    /// Busy-wait for at least `ns` nanoseconds
    fn delay_ns(&mut self, ns: u32);

    /// Busy-wait for at least `ms` milliseconds
    fn delay_ms(&mut self, ms: u32);

    /// Take exclusive ownership of a shared bus
    ///
    /// Halts the other bus master and tri-states its lines. Calling it
    /// while the bus is already captured must be harmless.
    fn capture_bus(&mut self) {}

    /// Hand a shared bus back to the other bus master
    ///
    /// With `reset` set, the other master is held in reset while it is
    /// resumed so it restarts from the freshly programmed contents.
    fn release_bus(&mut self, _reset: bool) {}
}

impl<B: ParallelBus + ?Sized> ParallelBus for &mut B {
    fn features(&self) -> BusFeatures {
        (**self).features()
    }

    fn init(&mut self) {
        (**self).init()
    }

    fn set_address(&mut self, address: u16) {
        (**self).set_address(address)
    }

    fn read_data(&mut self) -> u8 {
        (**self).read_data()
    }

    fn write_data(&mut self, data: u8) {
        (**self).write_data(data)
    }

    fn set_direction(&mut self, direction: Direction) {
        (**self).set_direction(direction)
    }

    fn set_chip_select(&mut self, selected: bool) {
        (**self).set_chip_select(selected)
    }

    fn set_output_enable(&mut self, enabled: bool) {
        (**self).set_output_enable(enabled)
    }

    fn set_write_enable(&mut self, enabled: bool) {
        (**self).set_write_enable(enabled)
    }

    fn delay_ns(&mut self, ns: u32) {
        (**self).delay_ns(ns)
    }

    fn delay_ms(&mut self, ms: u32) {
        (**self).delay_ms(ms)
    }

    fn capture_bus(&mut self) {
        (**self).capture_bus()
    }

    fn release_bus(&mut self, reset: bool) {
        (**self).release_bus(reset)
    }
}
