//! Host side view of the line protocol
//!
//! Commands are single lines terminated by `\n`. Every command gets one
//! reply line; the programmer may interleave `MSG:` lines with free-form
//! diagnostics, and announces a restart with `RESET`.

pub use eeburn_core::session::PageOp;

/// Control command: start a session
pub const CMD_BEGIN: &str = "BEGIN";
/// Control command: end a session
pub const CMD_END: &str = "END";
/// Control command: erase the device
pub const CMD_ERASE: &str = "ERASE";

/// Number of BEGIN attempts before giving up on a resetting programmer
pub const BEGIN_ATTEMPTS: usize = 5;

/// Default time to wait for a reply line
pub const DEFAULT_TIMEOUT_MS: u32 = 5000;

const ACK_PREFIX: &str = "ACK:";
const NAK_PREFIX: &str = "NAK:";
const MSG_PREFIX: &str = "MSG:";
const RESET_LINE: &str = "RESET";

/// Result of a page command
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageAck {
    /// `Verify` if the page already matched, `Write` if it was programmed
    pub op: PageOp,
    /// Acknowledged address
    pub address: u16,
    /// Acknowledged size
    pub size: usize,
}

impl PageAck {
    /// Whether the programmer had to write the page
    pub fn updated(&self) -> bool {
        self.op == PageOp::Write
    }
}

/// A line received from the programmer
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Control command accepted (`ACK:BEGIN`)
    Ack(String),
    /// Page command accepted (`ACK:W:1234:3`)
    Page(PageAck),
    /// Command rejected; reason and optional detail
    Nak(String),
    /// Diagnostic message
    Msg(String),
    /// Programmer restarted
    Reset,
}

impl Response {
    /// Parse one reply line (terminator already removed)
    pub fn parse(line: &str) -> Option<Self> {
        if line == RESET_LINE {
            return Some(Self::Reset);
        }
        if let Some(msg) = line.strip_prefix(MSG_PREFIX) {
            return Some(Self::Msg(msg.to_string()));
        }
        if let Some(reason) = line.strip_prefix(NAK_PREFIX) {
            return Some(Self::Nak(reason.to_string()));
        }

        let ack = line.strip_prefix(ACK_PREFIX)?;
        match parse_page_ack(ack) {
            Some(page) => Some(Self::Page(page)),
            None if !ack.is_empty() && !ack.contains(':') => Some(Self::Ack(ack.to_string())),
            None => None,
        }
    }
}

/// `<op>:<hex address>:<decimal size>`
fn parse_page_ack(ack: &str) -> Option<PageAck> {
    let mut fields = ack.split(':');
    let op = match fields.next()? {
        "W" => PageOp::Write,
        "V" => PageOp::Verify,
        _ => return None,
    };

    let address = fields.next()?;
    let size = fields.next()?;
    if fields.next().is_some()
        || address.is_empty()
        || !address.bytes().all(|b| b.is_ascii_digit() || b.is_ascii_uppercase())
        || size.is_empty()
        || !size.bytes().all(|b| b.is_ascii_digit())
    {
        return None;
    }

    Some(PageAck {
        op,
        address: u16::from_str_radix(address, 16).ok()?,
        size: size.parse().ok()?,
    })
}

/// Format a page command line
pub fn page_command(op: PageOp, record: &str) -> String {
    format!("{}{}", op.as_char(), record)
}
