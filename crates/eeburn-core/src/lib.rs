//! eeburn-core - Programming protocol engine for parallel EEPROMs
//!
//! This crate contains everything a microcontroller needs to program a
//! parallel EEPROM on behalf of a host, except the pin-level bus driver:
//!
//! - [`bus`] - the `ParallelBus` trait the board support code implements
//! - [`page`] - page write / verify / chip erase sequencing and write
//!   completion detection
//! - [`srec`] - the S1 record codec used to carry data over the link
//! - [`session`] - the line-oriented BEGIN/END session protocol
//!
//! It is `no_std` and allocation free.
//!
//! # Features
//!
//! - `std` - Implement `std::error::Error` for the error types
//!
//! # Example
//!
//! ```ignore
//! use eeburn_core::session::{Session, SessionConfig};
//!
//! let mut session = Session::new(board_bus, SessionConfig::default());
//! session.announce(&mut uart)?;
//! loop {
//!     session.poll(&mut uart, millis())?;
//! }
//! ```

#![no_std]
#![warn(missing_docs)]
#![warn(rust_2018_idioms)]

#[cfg(any(test, feature = "std"))]
extern crate std;

pub mod bus;
pub mod config;
pub mod error;
pub mod page;
pub mod session;
pub mod srec;

pub use error::{Error, ProgramError, ProgramResult, Result};
