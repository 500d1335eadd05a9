//! Motorola S1 record codec
//!
//! Data travels over the serial link as S1 records, one per line:
//!
//! ```text
//! S1 06 1234 AABBCC 82
//! |  |  |    |      +-- checksum: complement of the sum of all bytes
//! |  |  |    +--------- data bytes
//! |  |  +-------------- 16-bit address, big endian
//! |  +----------------- byte count: address + data + checksum bytes
//! +-------------------- record type marker
//! ```
//!
//! The byte count covers the two address bytes and the checksum, so a
//! record carries `byte_count - 3` data bytes, at most 252.

use core::fmt::Write;

use heapless::{String, Vec};

use crate::config::{MAX_RECORD_LEN, MAX_RECORD_PAYLOAD};
use crate::error::RecordError;

/// Record type marker for records with a 16-bit address
pub const S1_MARKER: &[u8; 2] = b"S1";

/// Bytes counted by the byte count field besides the data
const OVERHEAD: usize = 3;

/// A decoded S1 record
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Load address of the first data byte
    pub address: u16,
    /// Data bytes
    pub data: Vec<u8, MAX_RECORD_PAYLOAD>,
}

impl Record {
    /// Number of data bytes
    pub fn len(&self) -> usize {
        self.data.len()
    }

    /// Whether the record carries no data
    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Decode one S1 record line (without line terminator)
///
/// The line must be exactly as long as its byte count says: two characters
/// each for marker, byte count and checksum, four for the address and two
/// per data byte.
///
/// The checksum test is `sum ^ checksum == 0xFF`, i.e. the checksum byte
/// must be the complement of the 8-bit sum of the byte count, address and
/// data bytes.
pub fn decode(line: &[u8]) -> Result<Record, RecordError> {
    if line.len() < 2 || &line[..2] != S1_MARKER {
        return Err(RecordError::BadMarker);
    }

    if line.len() < 4 {
        return Err(RecordError::LengthMismatch);
    }
    let byte_count = read8(&line[2..4])? as usize;
    if byte_count < OVERHEAD || line.len() != 10 + 2 * (byte_count - OVERHEAD) {
        return Err(RecordError::LengthMismatch);
    }

    // Byte count, address and data, in textual order
    let fields = &line[2..2 + 2 * byte_count];
    let mut sum = 0u8;
    let mut address = [0u8; 2];
    let mut data = Vec::new();

    for (i, pair) in fields.chunks_exact(2).enumerate() {
        let value = read8(pair)?;
        sum = sum.wrapping_add(value);
        match i {
            0 => {}
            1 | 2 => address[i - 1] = value,
            _ => data
                .push(value)
                .map_err(|_| RecordError::LengthMismatch)?,
        }
    }

    let checksum = read8(&line[2 + 2 * byte_count..])?;
    if sum ^ checksum != 0xFF {
        return Err(RecordError::ChecksumMismatch);
    }

    Ok(Record {
        address: u16::from_be_bytes(address),
        data,
    })
}

/// Encode data as an S1 record line (without line terminator)
///
/// Returns `None` if `data` is longer than [`MAX_RECORD_PAYLOAD`].
pub fn encode(address: u16, data: &[u8]) -> Option<String<MAX_RECORD_LEN>> {
    if data.len() > MAX_RECORD_PAYLOAD {
        return None;
    }

    let byte_count = (data.len() + OVERHEAD) as u8;
    let [addr_hi, addr_lo] = address.to_be_bytes();
    let sum = data
        .iter()
        .fold(byte_count.wrapping_add(addr_hi).wrapping_add(addr_lo), |acc, &b| {
            acc.wrapping_add(b)
        });

    let mut line = String::new();
    write!(line, "S1{:02X}{:04X}", byte_count, address).ok()?;
    for byte in data {
        write!(line, "{:02X}", byte).ok()?;
    }
    write!(line, "{:02X}", !sum).ok()?;
    Some(line)
}

/// Decode two hex digits
fn read8(pair: &[u8]) -> Result<u8, RecordError> {
    Ok((hex_digit(pair[0])? << 4) | hex_digit(pair[1])?)
}

fn hex_digit(c: u8) -> Result<u8, RecordError> {
    match c {
        b'0'..=b'9' => Ok(c - b'0'),
        b'A'..=b'F' => Ok(c - b'A' + 10),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        _ => Err(RecordError::InvalidDigit),
    }
}
