//! Page programming
//!
//! [`PageProgrammer`] sequences the bus signals for page writes, page
//! verification and chip erase. [`completion`] holds the data polling
//! algorithm that detects the end of a write cycle.

pub mod completion;
mod programmer;

pub use completion::{wait_for_write_completion, wait_for_write_completion_with};
pub use programmer::{check_page_bounds, PageProgrammer, VerifyMismatch};
