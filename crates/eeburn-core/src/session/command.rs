//! Host command parsing

/// Operation requested by a page command
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PageOp {
    /// `W`: make the page match, writing it if needed
    Write,
    /// `V`: only check that the page matches
    Verify,
}

impl PageOp {
    /// The tag character used on the wire
    pub const fn as_char(&self) -> char {
        match self {
            Self::Write => 'W',
            Self::Verify => 'V',
        }
    }

    /// Parse a page command tag
    pub const fn from_tag(tag: u8) -> Option<Self> {
        match tag {
            b'W' => Some(Self::Write),
            b'V' => Some(Self::Verify),
            _ => None,
        }
    }
}

/// A command line received from the host
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Command<'a> {
    /// Start a session (or re-capture the bus inside one)
    Begin,
    /// End the session
    End,
    /// Erase the whole device
    Erase,
    /// Page command: tag character followed by an S1 record
    Page {
        /// Requested operation
        op: PageOp,
        /// The record text, still encoded
        record: &'a [u8],
    },
    /// Anything else
    Unknown,
}

impl<'a> Command<'a> {
    /// Parse one line (without terminator)
    pub fn parse(line: &'a [u8]) -> Self {
        match line {
            b"BEGIN" => Self::Begin,
            b"END" => Self::End,
            b"ERASE" => Self::Erase,
            [tag, record @ ..] => match PageOp::from_tag(*tag) {
                Some(op) => Self::Page { op, record },
                None => Self::Unknown,
            },
            [] => Self::Unknown,
        }
    }
}
