//! Programmer client
//!
//! `Burner` drives one programming session over a [`Transport`]: it sends
//! command lines, waits for the matching reply and turns `NAK:` and `RESET`
//! replies into errors.

use crate::error::{Result, SerialError};
use crate::protocol::*;
use crate::transport::Transport;

/// How long to keep draining stale input after a programmer reset
const DRAIN_TIMEOUT_MS: u32 = 100;

/// Connection to an eeburn programmer
pub struct Burner<T: Transport> {
    /// Transport layer
    transport: T,
    /// Received bytes not yet consumed as lines
    rx: Vec<u8>,
    /// Reply timeout
    timeout_ms: u32,
}

impl<T: Transport> Burner<T> {
    /// Create a client on top of an open transport
    ///
    /// No bytes are exchanged until [`begin`](Self::begin).
    pub fn new(transport: T) -> Self {
        Self {
            transport,
            rx: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Set how long to wait for each reply
    pub fn set_timeout(&mut self, timeout_ms: u32) {
        self.timeout_ms = timeout_ms;
    }

    /// Get a reference to the transport
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Start a session
    ///
    /// Opening the port often restarts the programmer, which then answers
    /// with `RESET` instead of an ACK. BEGIN is resent in that case.
    pub fn begin(&mut self) -> Result<()> {
        for attempt in 1..=BEGIN_ATTEMPTS {
            match self.control(CMD_BEGIN) {
                Err(SerialError::Reset) => {
                    log::info!(
                        "Programmer reset, resending BEGIN ({}/{})",
                        attempt,
                        BEGIN_ATTEMPTS
                    );
                    self.discard_input()?;
                }
                other => return other,
            }
        }
        Err(SerialError::BeginFailed(BEGIN_ATTEMPTS))
    }

    /// Erase the whole device
    pub fn erase(&mut self) -> Result<()> {
        self.control(CMD_ERASE)
    }

    /// End the session
    pub fn end(&mut self) -> Result<()> {
        self.control(CMD_END)
    }

    /// Send one S1 record as a page command
    ///
    /// `address` and `size` describe the record; the programmer must
    /// acknowledge exactly that page.
    pub fn send_page(
        &mut self,
        op: PageOp,
        record: &str,
        address: u16,
        size: usize,
    ) -> Result<PageAck> {
        let command = page_command(op, record);
        let ack = match self.command(&command)? {
            Response::Page(ack) => ack,
            other => return Err(unexpected(&command, &other)),
        };

        if ack.address != address || ack.size != size {
            return Err(SerialError::PageMismatch {
                sent_address: address,
                sent_size: size,
                address: ack.address,
                size: ack.size,
            });
        }
        Ok(ack)
    }

    /// Send a control command and expect its ACK
    fn control(&mut self, name: &str) -> Result<()> {
        match self.command(name)? {
            Response::Ack(ack) if ack == name => Ok(()),
            other => Err(unexpected(name, &other)),
        }
    }

    /// Send a command line and wait for its reply
    fn command(&mut self, command: &str) -> Result<Response> {
        log::debug!("--> {}", command);
        self.transport.write(command.as_bytes())?;
        self.transport.write(b"\n")?;
        self.transport.flush()?;

        loop {
            let line = self.read_line()?;
            log::debug!("<-- {}", line);

            match Response::parse(&line) {
                Some(Response::Msg(msg)) => log::info!("Programmer: {}", msg),
                Some(Response::Nak(reason)) => return Err(SerialError::Nak(reason)),
                Some(Response::Reset) => return Err(SerialError::Reset),
                Some(response) => return Ok(response),
                None => {
                    return Err(SerialError::UnexpectedResponse {
                        command: command.to_string(),
                        response: line,
                    })
                }
            }
        }
    }

    /// Next non-empty reply line, without terminator
    fn read_line(&mut self) -> Result<String> {
        let mut buf = [0u8; 256];
        loop {
            if let Some(pos) = self.rx.iter().position(|&b| b == b'\n') {
                let raw: Vec<u8> = self.rx.drain(..=pos).collect();
                let line = String::from_utf8_lossy(&raw).trim_end().to_string();
                if line.is_empty() {
                    continue;
                }
                return Ok(line);
            }

            let n = self.transport.read_nonblock(&mut buf, self.timeout_ms)?;
            if n == 0 {
                return Err(SerialError::Timeout);
            }
            self.rx.extend_from_slice(&buf[..n]);
        }
    }

    /// Drop buffered and in-flight input
    fn discard_input(&mut self) -> Result<()> {
        self.rx.clear();
        let mut buf = [0u8; 256];
        while self.transport.read_nonblock(&mut buf, DRAIN_TIMEOUT_MS)? > 0 {}
        Ok(())
    }
}

fn unexpected(command: &str, response: &Response) -> SerialError {
    SerialError::UnexpectedResponse {
        command: command.to_string(),
        response: format!("{:?}", response),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use eeburn_core::session::{Session, SessionConfig};
    use eeburn_core::srec;
    use eeburn_dummy::{DummyConfig, DummyEeprom, DummySerial};
    use std::collections::VecDeque;

    /// Runs the firmware session in-process
    struct Loopback {
        session: Session<DummyEeprom>,
        serial: DummySerial,
        pending: VecDeque<u8>,
        /// Writes swallowed by a simulated programmer restart
        restarts: usize,
    }

    impl Loopback {
        fn new(config: DummyConfig) -> Self {
            Self {
                session: Session::new(DummyEeprom::new(config), SessionConfig::default()),
                serial: DummySerial::new(),
                pending: VecDeque::new(),
                restarts: 0,
            }
        }

        fn eeprom(&self) -> &DummyEeprom {
            self.session.programmer().bus()
        }
    }

    impl Transport for Loopback {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            if self.restarts > 0 {
                if data.ends_with(b"\n") {
                    self.restarts -= 1;
                    self.session.announce(&mut self.serial).unwrap();
                }
                return Ok(());
            }
            self.serial.push_bytes(data);
            Ok(())
        }

        fn read_nonblock(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize> {
            while self.session.poll(&mut self.serial, 0).unwrap() {}
            self.pending.extend(self.serial.take_output());

            let n = buf.len().min(self.pending.len());
            for (slot, byte) in buf.iter_mut().zip(self.pending.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    /// Replays canned replies
    struct Scripted {
        replies: VecDeque<u8>,
        written: Vec<u8>,
    }

    impl Scripted {
        fn new(replies: &str) -> Self {
            Self {
                replies: replies.bytes().collect(),
                written: Vec::new(),
            }
        }
    }

    impl Transport for Scripted {
        fn write(&mut self, data: &[u8]) -> Result<()> {
            self.written.extend_from_slice(data);
            Ok(())
        }

        fn read_nonblock(&mut self, buf: &mut [u8], _timeout_ms: u32) -> Result<usize> {
            let n = buf.len().min(self.replies.len()).min(4);
            for (slot, byte) in buf.iter_mut().zip(self.replies.drain(..n)) {
                *slot = byte;
            }
            Ok(n)
        }

        fn flush(&mut self) -> Result<()> {
            Ok(())
        }
    }

    #[test]
    fn test_session_round_trip() {
        let mut burner = Burner::new(Loopback::new(DummyConfig::default()));
        burner.begin().unwrap();

        let record = srec::encode(0x1234, &[0xAA, 0xBB, 0xCC]).unwrap();
        let ack = burner
            .send_page(PageOp::Write, &record, 0x1234, 3)
            .unwrap();
        assert!(ack.updated());

        let ack = burner
            .send_page(PageOp::Write, &record, 0x1234, 3)
            .unwrap();
        assert!(!ack.updated());

        let ack = burner
            .send_page(PageOp::Verify, &record, 0x1234, 3)
            .unwrap();
        assert_eq!(ack.op, PageOp::Verify);

        burner.end().unwrap();

        let eeprom = burner.transport().eeprom();
        assert_eq!(&eeprom.data()[0x1234..0x1237], &[0xAA, 0xBB, 0xCC]);
        assert_eq!(eeprom.stats().releases, 1);
    }

    #[test]
    fn test_erase() {
        let mut burner = Burner::new(Loopback::new(DummyConfig::default()));
        burner.begin().unwrap();
        burner.erase().unwrap();
        burner.end().unwrap();
        assert_eq!(burner.transport().eeprom().stats().we_pulses, 6);
    }

    #[test]
    fn test_begin_retried_after_reset() {
        let mut loopback = Loopback::new(DummyConfig::default());
        loopback.restarts = 2;
        let mut burner = Burner::new(loopback);

        burner.begin().unwrap();
        assert!(burner.transport().eeprom().is_captured());
    }

    #[test]
    fn test_begin_gives_up() {
        let mut loopback = Loopback::new(DummyConfig::default());
        loopback.restarts = BEGIN_ATTEMPTS;
        let mut burner = Burner::new(loopback);

        assert!(matches!(
            burner.begin(),
            Err(SerialError::BeginFailed(n)) if n == BEGIN_ATTEMPTS
        ));
    }

    #[test]
    fn test_nak_becomes_error() {
        let mut burner = Burner::new(Loopback::new(DummyConfig::default()));
        burner.begin().unwrap();

        let record = srec::encode(0x0000, &[0x01]).unwrap();
        match burner.send_page(PageOp::Verify, &record, 0x0000, 1) {
            Err(SerialError::Nak(reason)) => assert_eq!(
                reason,
                "verify failed: address 0x0000 (page 0 offset 0) expected 0x01 got 0xFF"
            ),
            other => panic!("expected NAK, got {:?}", other),
        }
    }

    #[test]
    fn test_page_mismatch() {
        let mut burner = Burner::new(Loopback::new(DummyConfig::default()));
        burner.begin().unwrap();

        let record = srec::encode(0x0100, &[0x01, 0x02]).unwrap();
        assert!(matches!(
            burner.send_page(PageOp::Write, &record, 0x0101, 2),
            Err(SerialError::PageMismatch { address: 0x0100, size: 2, .. })
        ));
    }

    #[test]
    fn test_messages_and_blank_lines_skipped() {
        let mut burner = Burner::new(Scripted::new("\r\nMSG:booting\r\nACK:BEGIN\r\n"));
        burner.begin().unwrap();
        assert_eq!(burner.transport().written, b"BEGIN\n");
    }

    #[test]
    fn test_unexpected_reply() {
        let mut burner = Burner::new(Scripted::new("ACK:END\r\n"));
        assert!(matches!(
            burner.begin(),
            Err(SerialError::UnexpectedResponse { .. })
        ));

        let mut burner = Burner::new(Scripted::new("what\r\n"));
        assert!(matches!(
            burner.end(),
            Err(SerialError::UnexpectedResponse { ref response, .. }) if response == "what"
        ));
    }

    #[test]
    fn test_timeout() {
        let mut burner = Burner::new(Scripted::new("ACK:BEG"));
        assert!(matches!(burner.begin(), Err(SerialError::Timeout)));
    }
}
