//! Error types for eeburn-core
//!
//! This module provides no_std compatible error types. The errors fall into
//! three classes, all of which the session protocol recovers from locally
//! by replying with a NAK:
//!
//! - [`ProgramError`] - rejected or failed device operations
//! - [`RecordError`] - malformed S1 records
//! - [`ProtocolError`] - framing problems and commands that are not valid
//!   in the current session state

use core::fmt;

/// Page programming failure - no_std compatible, Copy for efficiency
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProgramError {
    /// The write would span two pages (or run past the address space)
    PageBoundaryCrossed,
    /// The device settled on a value other than the last byte written
    WriteCompletionDataMismatch,
    /// The device never settled within the polling retry ceiling
    WriteCompletionTimeout,
    /// The operation needs the bus, but no session owns it
    OutOfSession,
}

impl ProgramError {
    /// The reason string reported to the host in a NAK line
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::PageBoundaryCrossed => "PageBoundaryCrossed",
            Self::WriteCompletionDataMismatch => "WriteCompletionDataMismatch",
            Self::WriteCompletionTimeout => "WriteCompletionTimeout",
            Self::OutOfSession => "OutOfSession",
        }
    }
}

impl fmt::Display for ProgramError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::PageBoundaryCrossed => write!(f, "page boundary crossed"),
            Self::WriteCompletionDataMismatch => write!(f, "write completion data mismatch"),
            Self::WriteCompletionTimeout => write!(f, "write completion timeout"),
            Self::OutOfSession => write!(f, "bus not owned by a session"),
        }
    }
}

/// Outcome of a device operation that has no payload
pub type ProgramResult = core::result::Result<(), ProgramError>;

/// S1 record decoding failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordError {
    /// The line does not start with the `S1` marker
    BadMarker,
    /// The byte count field disagrees with the line length
    LengthMismatch,
    /// A character in a hex field is not a hex digit
    InvalidDigit,
    /// The checksum is not the complement of the byte sum
    ChecksumMismatch,
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::BadMarker => write!(f, "not an S1 record"),
            Self::LengthMismatch => write!(f, "byte count does not match line length"),
            Self::InvalidDigit => write!(f, "invalid hex digit"),
            Self::ChecksumMismatch => write!(f, "checksum mismatch"),
        }
    }
}

/// Session protocol failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProtocolError {
    /// A line did not fit in the line buffer
    BufferOverrun,
    /// A partial line was abandoned by the host
    ReadTimeout,
    /// Only `BEGIN` is accepted before a session starts
    UnexpectedInIdle,
    /// Unknown command inside a session
    UnexpectedInActive,
    /// A page command carried a record that failed to decode
    InvalidRecord,
    /// A verify-only page command found different contents
    VerifyFailed,
}

impl ProtocolError {
    /// The reason string reported to the host in a NAK line
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::BufferOverrun => "buffer overrun",
            Self::ReadTimeout => "read timeout",
            Self::UnexpectedInIdle => "unexpected in idle state",
            Self::UnexpectedInActive => "unexpected in active state",
            Self::InvalidRecord => "invalid record",
            Self::VerifyFailed => "verify failed",
        }
    }
}

impl fmt::Display for ProtocolError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Any error the session can report to the host
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// Device operation error
    Program(ProgramError),
    /// Record decoding error
    Record(RecordError),
    /// Protocol error
    Protocol(ProtocolError),
}

impl Error {
    /// The reason string reported to the host in a NAK line
    ///
    /// Every record error is reported as `invalid record`; the specific
    /// cause only shows up in the logs.
    pub const fn reason(&self) -> &'static str {
        match self {
            Self::Program(e) => e.as_str(),
            Self::Record(_) => ProtocolError::InvalidRecord.as_str(),
            Self::Protocol(e) => e.as_str(),
        }
    }
}

impl From<ProgramError> for Error {
    fn from(e: ProgramError) -> Self {
        Self::Program(e)
    }
}

impl From<RecordError> for Error {
    fn from(e: RecordError) -> Self {
        Self::Record(e)
    }
}

impl From<ProtocolError> for Error {
    fn from(e: ProtocolError) -> Self {
        Self::Protocol(e)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Program(e) => write!(f, "{}", e),
            Self::Record(e) => write!(f, "invalid record: {}", e),
            Self::Protocol(e) => write!(f, "{}", e),
        }
    }
}

/// Failure to talk to the host over the serial transport
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkError<E> {
    /// The transport reported an error
    Io(E),
    /// A reply could not be formatted
    Format,
}

impl<E: fmt::Debug> fmt::Display for LinkError<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Io(e) => write!(f, "serial transport error: {:?}", e),
            Self::Format => write!(f, "reply formatting failed"),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ProgramError {}

#[cfg(feature = "std")]
impl std::error::Error for RecordError {}

#[cfg(feature = "std")]
impl std::error::Error for ProtocolError {}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

#[cfg(feature = "std")]
impl<E: fmt::Debug> std::error::Error for LinkError<E> {}

/// Result type alias using the core Error type
pub type Result<T> = core::result::Result<T, Error>;
