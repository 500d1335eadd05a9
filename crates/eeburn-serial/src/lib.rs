//! eeburn-serial - Host side of the eeburn programming protocol
//!
//! This crate talks to an eeburn programmer over a serial port. The
//! programmer speaks a line-oriented ASCII protocol:
//!
//! ```text
//! --> BEGIN
//! <-- ACK:BEGIN
//! --> WS1061234AABBCC82
//! <-- ACK:W:1234:3
//! --> END
//! <-- ACK:END
//! ```
//!
//! # Example
//!
//! ```no_run
//! use eeburn_serial::{Burner, PageOp, SerialTransport};
//!
//! let transport = SerialTransport::open("/dev/ttyUSB0", Some(115200))?;
//! let mut burner = Burner::new(transport);
//!
//! burner.begin()?;
//! let ack = burner.send_page(PageOp::Write, "S1061234AABBCC82", 0x1234, 3)?;
//! println!("updated: {}", ack.updated());
//! burner.end()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod device;
pub mod error;
pub mod protocol;
pub mod transport;

// Re-exports
pub use device::Burner;
pub use error::{Result, SerialError};
pub use protocol::{PageAck, PageOp, Response};
pub use transport::serial::SerialTransport;
pub use transport::Transport;
