//! eeburn-dummy - In-memory EEPROM and serial port emulator for testing
//!
//! This crate provides a [`DummyEeprom`] that implements the `ParallelBus`
//! pin interface on top of a byte array, and a [`DummySerial`] port, so
//! the programming engine and the session protocol can run without real
//! hardware.

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

mod eeprom;
mod serial;

pub use eeprom::{BusStats, DummyConfig, DummyEeprom};
pub use serial::DummySerial;
