//! Line framing with an inter-byte deadline

use embedded_io::{Read, ReadReady};
use heapless::Vec;

use crate::config::LINE_BUFFER_SIZE;
use crate::error::ProtocolError;

/// One received line, terminator and trailing CR removed
pub type Line = Vec<u8, LINE_BUFFER_SIZE>;

/// Outcome of a completed read: a line, or a framing error to report
pub type LineEvent = Result<Line, ProtocolError>;

/// Accumulates serial bytes into lines
///
/// A line that outgrows the buffer is dropped up to its newline and then
/// reported once as an overrun. A partial line that stalls for longer
/// than the timeout is dropped and reported as a read timeout.
#[derive(Debug)]
pub struct LineReader {
    buf: Line,
    overrun: bool,
    last_byte_ms: Option<u64>,
    timeout_ms: u32,
}

impl LineReader {
    /// Create a reader with the given inter-byte timeout
    pub fn new(timeout_ms: u32) -> Self {
        Self {
            buf: Vec::new(),
            overrun: false,
            last_byte_ms: None,
            timeout_ms,
        }
    }

    /// Whether part of a line has been received
    pub fn in_progress(&self) -> bool {
        self.last_byte_ms.is_some()
    }

    /// Drain available bytes from `serial`
    ///
    /// Returns as soon as a line completes, leaving later bytes unread.
    /// `Ok(None)` means nothing is ready yet. A partial line that went
    /// stale since the last call ends before any new byte is read.
    pub fn poll<S>(&mut self, serial: &mut S, now_ms: u64) -> Result<Option<LineEvent>, S::Error>
    where
        S: Read + ReadReady,
    {
        if let Some(event) = self.check_timeout(now_ms) {
            return Ok(Some(event));
        }

        let mut byte = [0u8; 1];
        while serial.read_ready()? {
            if serial.read(&mut byte)? == 0 {
                break;
            }
            self.last_byte_ms = Some(now_ms);
            if let Some(event) = self.push(byte[0]) {
                return Ok(Some(event));
            }
        }
        Ok(None)
    }

    /// Feed one byte
    pub fn push(&mut self, byte: u8) -> Option<LineEvent> {
        if byte == b'\n' {
            return Some(self.finish());
        }

        if !self.overrun && self.buf.push(byte).is_err() {
            log::warn!("line exceeds {} bytes, discarding", LINE_BUFFER_SIZE);
            self.overrun = true;
            self.buf.clear();
        }
        None
    }

    /// Report a stalled partial line
    pub fn check_timeout(&mut self, now_ms: u64) -> Option<LineEvent> {
        let last = self.last_byte_ms?;
        if now_ms.saturating_sub(last) <= self.timeout_ms as u64 {
            return None;
        }

        log::debug!("read timeout after {} bytes", self.buf.len());
        let error = if self.overrun {
            ProtocolError::BufferOverrun
        } else {
            ProtocolError::ReadTimeout
        };
        self.reset();
        Some(Err(error))
    }

    fn finish(&mut self) -> LineEvent {
        let overrun = self.overrun;
        let mut line = core::mem::take(&mut self.buf);
        self.reset();

        if overrun {
            return Err(ProtocolError::BufferOverrun);
        }
        if line.last() == Some(&b'\r') {
            line.pop();
        }
        Ok(line)
    }

    fn reset(&mut self) {
        self.buf.clear();
        self.overrun = false;
        self.last_byte_ms = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use core::convert::Infallible;
    use std::collections::VecDeque;

    struct Input(VecDeque<u8>);

    impl Input {
        fn new(bytes: &[u8]) -> Self {
            Self(bytes.iter().copied().collect())
        }
    }

    impl embedded_io::ErrorType for Input {
        type Error = Infallible;
    }

    impl Read for Input {
        fn read(&mut self, buf: &mut [u8]) -> Result<usize, Infallible> {
            let mut n = 0;
            while n < buf.len() {
                match self.0.pop_front() {
                    Some(b) => {
                        buf[n] = b;
                        n += 1;
                    }
                    None => break,
                }
            }
            Ok(n)
        }
    }

    impl ReadReady for Input {
        fn read_ready(&mut self) -> Result<bool, Infallible> {
            Ok(!self.0.is_empty())
        }
    }

    fn expect_line(event: Option<LineEvent>) -> Line {
        match event {
            Some(Ok(line)) => line,
            other => panic!("expected a line, got {:?}", other),
        }
    }

    #[test]
    fn test_reads_lf_and_crlf_lines() {
        let mut reader = LineReader::new(1000);
        let mut input = Input::new(b"BEGIN\nEND\r\n");

        let line = expect_line(reader.poll(&mut input, 0).unwrap());
        assert_eq!(line.as_slice(), b"BEGIN");
        let line = expect_line(reader.poll(&mut input, 0).unwrap());
        assert_eq!(line.as_slice(), b"END");
        assert_eq!(reader.poll(&mut input, 0).unwrap(), None);
    }

    #[test]
    fn test_only_one_trailing_cr_is_stripped() {
        let mut reader = LineReader::new(1000);
        let mut input = Input::new(b"A\r\r\n");
        let line = expect_line(reader.poll(&mut input, 0).unwrap());
        assert_eq!(line.as_slice(), b"A\r");
    }

    #[test]
    fn test_partial_line_waits() {
        let mut reader = LineReader::new(1000);
        let mut input = Input::new(b"BEG");
        assert_eq!(reader.poll(&mut input, 0).unwrap(), None);
        assert!(reader.in_progress());

        input.0.extend(b"IN\n".iter().copied());
        let line = expect_line(reader.poll(&mut input, 500).unwrap());
        assert_eq!(line.as_slice(), b"BEGIN");
        assert!(!reader.in_progress());
    }

    #[test]
    fn test_timeout_on_stalled_line() {
        let mut reader = LineReader::new(1000);
        let mut input = Input::new(b"WS10612");
        assert_eq!(reader.poll(&mut input, 100).unwrap(), None);
        assert_eq!(reader.poll(&mut input, 1100).unwrap(), None);
        assert_eq!(
            reader.poll(&mut input, 1101).unwrap(),
            Some(Err(ProtocolError::ReadTimeout))
        );

        // The partial line is gone
        input.0.extend(b"END\n".iter().copied());
        let line = expect_line(reader.poll(&mut input, 1200).unwrap());
        assert_eq!(line.as_slice(), b"END");
    }

    #[test]
    fn test_gap_before_remaining_bytes_ends_line() {
        let mut reader = LineReader::new(1000);
        let mut input = Input::new(b"BEG");
        assert_eq!(reader.poll(&mut input, 0).unwrap(), None);

        input.0.extend(b"IN\n".iter().copied());
        assert_eq!(
            reader.poll(&mut input, 5000).unwrap(),
            Some(Err(ProtocolError::ReadTimeout))
        );

        let line = expect_line(reader.poll(&mut input, 5000).unwrap());
        assert_eq!(line.as_slice(), b"IN");
        assert!(!reader.in_progress());
    }

    #[test]
    fn test_idle_reader_never_times_out() {
        let mut reader = LineReader::new(10);
        let mut input = Input::new(b"");
        assert_eq!(reader.poll(&mut input, 0).unwrap(), None);
        assert_eq!(reader.poll(&mut input, 1_000_000).unwrap(), None);
    }

    #[test]
    fn test_overrun_reported_once_at_newline() {
        let mut reader = LineReader::new(1000);
        let mut bytes = std::vec![b'X'; LINE_BUFFER_SIZE + 100];
        bytes.push(b'\n');
        bytes.extend_from_slice(b"BEGIN\n");
        let mut input = Input::new(&bytes);

        assert_eq!(
            reader.poll(&mut input, 0).unwrap(),
            Some(Err(ProtocolError::BufferOverrun))
        );
        let line = expect_line(reader.poll(&mut input, 0).unwrap());
        assert_eq!(line.as_slice(), b"BEGIN");
    }

    #[test]
    fn test_line_filling_buffer_exactly_is_accepted() {
        let mut reader = LineReader::new(1000);
        let mut bytes = std::vec![b'X'; LINE_BUFFER_SIZE];
        bytes.push(b'\n');
        let mut input = Input::new(&bytes);

        let line = expect_line(reader.poll(&mut input, 0).unwrap());
        assert_eq!(line.len(), LINE_BUFFER_SIZE);
    }

    #[test]
    fn test_stalled_overrun_reports_overrun() {
        let mut reader = LineReader::new(1000);
        let bytes = std::vec![b'X'; LINE_BUFFER_SIZE + 1];
        let mut input = Input::new(&bytes);

        assert_eq!(reader.poll(&mut input, 0).unwrap(), None);
        assert_eq!(
            reader.poll(&mut input, 2000).unwrap(),
            Some(Err(ProtocolError::BufferOverrun))
        );
    }

    #[test]
    fn test_empty_line() {
        let mut reader = LineReader::new(1000);
        let mut input = Input::new(b"\r\n");
        let line = expect_line(reader.poll(&mut input, 0).unwrap());
        assert!(line.is_empty());
    }
}
