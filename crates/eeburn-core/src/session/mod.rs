//! Host session protocol
//!
//! The host drives the programmer with newline terminated command lines and
//! gets exactly one reply line back per command:
//!
//! ```text
//! host                         device
//!                              RESET
//! BEGIN                        ACK:BEGIN
//! ERASE                        ACK:ERASE
//! WS1061234AABBCC82            ACK:W:1234:3
//! VS1061234AABBCC82            ACK:V:1234:3
//! END                          ACK:END
//! ```
//!
//! Outside a session (`Idle`) only `BEGIN` is accepted. Inside one
//! (`Active`) every page command is verified first, and a `W` command only
//! programs the device if the page does not already match.

mod command;
mod reader;
mod reply;

pub use command::{Command, PageOp};
pub use reader::{Line, LineEvent, LineReader};
pub use reply::{Ack, Detail, Nak, Reply};

use core::fmt;

use embedded_io::{Read, ReadReady, Write, WriteFmtError};

use crate::bus::ParallelBus;
use crate::config::{ADDRESS_SPACE, DEFAULT_READ_TIMEOUT_MS};
use crate::error::{LinkError, ProgramError, ProtocolError};
use crate::page::PageProgrammer;
use crate::srec;

/// Session state
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SessionState {
    /// No session, bus not owned
    #[default]
    Idle,
    /// Session in progress, bus owned
    Active,
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Idle => write!(f, "idle"),
            Self::Active => write!(f, "active"),
        }
    }
}

/// Session configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionConfig {
    /// Longest allowed gap between two bytes of one line
    pub read_timeout_ms: u32,
    /// Reset the attached system when the session ends
    pub reset_on_end: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            read_timeout_ms: DEFAULT_READ_TIMEOUT_MS,
            reset_on_end: true,
        }
    }
}

/// Device side of the host session protocol
pub struct Session<B: ParallelBus> {
    programmer: PageProgrammer<B>,
    reader: LineReader,
    state: SessionState,
    config: SessionConfig,
}

impl<B: ParallelBus> Session<B> {
    /// Create a session engine in the `Idle` state
    pub fn new(bus: B, config: SessionConfig) -> Self {
        Self {
            programmer: PageProgrammer::new(bus),
            reader: LineReader::new(config.read_timeout_ms),
            state: SessionState::Idle,
            config,
        }
    }

    /// Current state
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Get a reference to the page programmer
    pub fn programmer(&self) -> &PageProgrammer<B> {
        &self.programmer
    }

    /// Tell the host the device has (re)started
    pub fn announce<S: Write>(&mut self, serial: &mut S) -> Result<(), LinkError<S::Error>> {
        log::info!("programmer ready");
        send(serial, &Reply::Reset)
    }

    /// Service the serial link once
    ///
    /// Handles at most one line. Returns `true` if a line or a framing
    /// error was processed, `false` if the link had nothing complete yet.
    ///
    /// Must be called more often than `read_timeout_ms`: a gap is only
    /// measured between calls, so bytes that arrived during a longer
    /// pause count as late.
    pub fn poll<S>(&mut self, serial: &mut S, now_ms: u64) -> Result<bool, LinkError<S::Error>>
    where
        S: Read + ReadReady + Write,
    {
        let event = match self.reader.poll(serial, now_ms).map_err(LinkError::Io)? {
            Some(event) => event,
            None => return Ok(false),
        };

        match event {
            Ok(line) if line.is_empty() => {}
            Ok(line) => {
                let reply = self.handle_line(&line);
                send(serial, &reply)?;
            }
            Err(error) => {
                log::warn!("{}", error);
                send(serial, &Nak::new(error).into())?;
            }
        }
        Ok(true)
    }

    /// Execute one command line and produce its reply
    pub fn handle_line<'a>(&mut self, line: &'a [u8]) -> Reply<'a> {
        let command = Command::parse(line);
        log::trace!("{} <- {:?}", self.state, command);

        match (self.state, command) {
            (SessionState::Idle, Command::Begin) => {
                self.programmer.capture_bus();
                self.state = SessionState::Active;
                log::info!("session started");
                Ack::Begin.into()
            }
            (SessionState::Idle, _) => {
                Nak::with_line(ProtocolError::UnexpectedInIdle, line).into()
            }
            (SessionState::Active, Command::Begin) => {
                self.programmer.capture_bus();
                Ack::Begin.into()
            }
            (SessionState::Active, Command::End) => {
                self.programmer.release_bus(self.config.reset_on_end);
                self.state = SessionState::Idle;
                log::info!("session ended");
                Ack::End.into()
            }
            (SessionState::Active, Command::Erase) => match self.programmer.chip_erase() {
                Ok(()) => Ack::Erase.into(),
                Err(e) => Nak::new(e).into(),
            },
            (SessionState::Active, Command::Page { op, record }) => {
                self.page_command(op, record, line)
            }
            (SessionState::Active, Command::Unknown) => {
                Nak::with_line(ProtocolError::UnexpectedInActive, line).into()
            }
        }
    }

    fn page_command<'a>(&mut self, op: PageOp, record: &[u8], line: &'a [u8]) -> Reply<'a> {
        let record = match srec::decode(record) {
            Ok(record) => record,
            Err(e) => {
                log::debug!("rejecting record: {}", e);
                return Nak::with_line(e, line).into();
            }
        };
        let address = record.address;
        let size = record.len();

        if address as u32 + size as u32 > ADDRESS_SPACE {
            log::debug!("record at 0x{:04X} runs past the address space", address);
            return Nak::new(ProgramError::PageBoundaryCrossed).into();
        }

        let mismatch = match self.programmer.verify_page(address, &record.data) {
            Ok(()) => {
                return Ack::Page {
                    op: PageOp::Verify,
                    address,
                    size,
                }
                .into()
            }
            Err(mismatch) => mismatch,
        };

        match op {
            PageOp::Verify => Nak {
                error: ProtocolError::VerifyFailed.into(),
                detail: Some(Detail::Mismatch(mismatch)),
            }
            .into(),
            PageOp::Write => match self.programmer.write_page(address, &record.data) {
                Ok(()) => Ack::Page {
                    op: PageOp::Write,
                    address,
                    size,
                }
                .into(),
                Err(e) => {
                    log::warn!("write 0x{:04X} failed: {}", address, e);
                    Nak::new(e).into()
                }
            },
        }
    }
}

/// Write one reply line
fn send<S: Write>(serial: &mut S, reply: &Reply<'_>) -> Result<(), LinkError<S::Error>> {
    log::debug!("-> {}", reply);
    serial
        .write_fmt(format_args!("{}\r\n", reply))
        .map_err(|e| match e {
            WriteFmtError::Other(e) => LinkError::Io(e),
            _ => LinkError::Format,
        })?;
    serial.flush().map_err(LinkError::Io)
}
