//! Parallel bus abstraction
//!
//! This module defines the trait the board support code implements to give
//! the programming engine access to the EEPROM's address, data and control
//! lines.

mod traits;

pub use traits::*;
