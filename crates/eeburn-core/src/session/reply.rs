//! ACK / NAK reply lines
//!
//! ```text
//! ACK:BEGIN                 control command accepted
//! ACK:W:1234:3              page written (V: page already matched)
//! NAK:<reason>              command rejected
//! NAK:<reason>: <detail>    command rejected, with the offending input
//! RESET                     firmware (re)started
//! ```

use core::fmt;

use crate::error::Error;
use crate::page::VerifyMismatch;

use super::command::PageOp;

/// Positive acknowledgment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Ack {
    /// Session started
    Begin,
    /// Session ended
    End,
    /// Chip erased
    Erase,
    /// Page command completed
    Page {
        /// What was actually done: `Verify` if the page already matched
        op: PageOp,
        /// Record address
        address: u16,
        /// Record length
        size: usize,
    },
}

impl fmt::Display for Ack {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Begin => write!(f, "ACK:BEGIN"),
            Self::End => write!(f, "ACK:END"),
            Self::Erase => write!(f, "ACK:ERASE"),
            Self::Page { op, address, size } => {
                write!(f, "ACK:{}:{:04X}:{}", op.as_char(), address, size)
            }
        }
    }
}

/// Extra information attached to a NAK
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Detail<'a> {
    /// The offending input line
    Line(&'a [u8]),
    /// The first byte that failed to verify
    Mismatch(VerifyMismatch),
}

impl fmt::Display for Detail<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Line(line) => {
                for &b in line.iter() {
                    if b.is_ascii_graphic() || b == b' ' {
                        fmt::Write::write_char(f, b as char)?;
                    } else {
                        write!(f, "\\x{:02X}", b)?;
                    }
                }
                Ok(())
            }
            Self::Mismatch(mismatch) => write!(f, "{}", mismatch),
        }
    }
}

/// Negative acknowledgment
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Nak<'a> {
    /// Why the command was rejected
    pub error: Error,
    /// Optional detail
    pub detail: Option<Detail<'a>>,
}

impl<'a> Nak<'a> {
    /// A NAK with only a reason
    pub fn new(error: impl Into<Error>) -> Self {
        Self {
            error: error.into(),
            detail: None,
        }
    }

    /// A NAK citing the offending line
    pub fn with_line(error: impl Into<Error>, line: &'a [u8]) -> Self {
        Self {
            error: error.into(),
            detail: Some(Detail::Line(line)),
        }
    }
}

impl fmt::Display for Nak<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "NAK:{}", self.error.reason())?;
        if let Some(detail) = &self.detail {
            write!(f, ": {}", detail)?;
        }
        Ok(())
    }
}

/// A line sent to the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Reply<'a> {
    /// Command accepted
    Ack(Ack),
    /// Command rejected
    Nak(Nak<'a>),
    /// Startup announcement
    Reset,
}

impl Reply<'_> {
    /// Whether this is a positive acknowledgment
    pub fn is_ack(&self) -> bool {
        matches!(self, Self::Ack(_))
    }
}

impl From<Ack> for Reply<'_> {
    fn from(ack: Ack) -> Self {
        Self::Ack(ack)
    }
}

impl<'a> From<Nak<'a>> for Reply<'a> {
    fn from(nak: Nak<'a>) -> Self {
        Self::Nak(nak)
    }
}

impl fmt::Display for Reply<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ack(ack) => write!(f, "{}", ack),
            Self::Nak(nak) => write!(f, "{}", nak),
            Self::Reset => write!(f, "RESET"),
        }
    }
}
