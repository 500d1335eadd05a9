//! In-memory serial port

use alloc::collections::VecDeque;
use alloc::string::String;
use alloc::vec::Vec;
use core::convert::Infallible;

use embedded_io::{ErrorType, Read, ReadReady, Write};

/// Serial port emulator
///
/// Bytes pushed by the test are what the firmware reads; bytes the firmware
/// writes accumulate in the output buffer.
#[derive(Debug, Default)]
pub struct DummySerial {
    input: VecDeque<u8>,
    output: Vec<u8>,
}

impl DummySerial {
    /// Create an empty port
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue raw bytes for the firmware
    pub fn push_bytes(&mut self, bytes: &[u8]) {
        self.input.extend(bytes.iter().copied());
    }

    /// Queue a line for the firmware, appending the newline
    pub fn push_line(&mut self, line: &str) {
        self.push_bytes(line.as_bytes());
        self.input.push_back(b'\n');
    }

    /// Everything the firmware wrote and was not taken yet
    pub fn output(&self) -> &[u8] {
        &self.output
    }

    /// Take everything the firmware wrote so far
    pub fn take_output(&mut self) -> Vec<u8> {
        core::mem::take(&mut self.output)
    }

    /// Take the complete reply lines written so far, without terminators
    ///
    /// A partial trailing line stays in the buffer.
    pub fn take_replies(&mut self) -> Vec<String> {
        let end = match self.output.iter().rposition(|&b| b == b'\n') {
            Some(pos) => pos + 1,
            None => return Vec::new(),
        };

        let complete: Vec<u8> = self.output.drain(..end).collect();
        String::from_utf8_lossy(&complete)
            .lines()
            .map(String::from)
            .collect()
    }
}

impl ErrorType for DummySerial {
    type Error = Infallible;
}

impl Read for DummySerial {
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let mut n = 0;
        for slot in buf.iter_mut() {
            match self.input.pop_front() {
                Some(byte) => {
                    *slot = byte;
                    n += 1;
                }
                None => break,
            }
        }
        Ok(n)
    }
}

impl ReadReady for DummySerial {
    fn read_ready(&mut self) -> Result<bool, Self::Error> {
        Ok(!self.input.is_empty())
    }
}

impl Write for DummySerial {
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.output.extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }
}
