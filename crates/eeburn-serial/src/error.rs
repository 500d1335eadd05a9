//! Error types for the host link

use thiserror::Error;

/// Host link errors
#[derive(Debug, Error)]
pub enum SerialError {
    /// The programmer rejected a command
    #[error("{0}")]
    Nak(String),

    /// The programmer restarted in the middle of an exchange
    #[error("Programmer reset")]
    Reset,

    /// A reply that does not fit the command that was sent
    #[error("Unexpected response to {command}: {response}")]
    UnexpectedResponse {
        /// Command that was sent
        command: String,
        /// Reply line received
        response: String,
    },

    /// A page ACK for a different page than the one sent
    #[error("Page mismatch: sent 0x{sent_address:04X}/{sent_size}, acknowledged 0x{address:04X}/{size}")]
    PageMismatch {
        /// Address sent
        sent_address: u16,
        /// Size sent
        sent_size: usize,
        /// Address acknowledged
        address: u16,
        /// Size acknowledged
        size: usize,
    },

    /// BEGIN kept being answered with RESET
    #[error("Programmer did not accept BEGIN after {0} attempts")]
    BeginFailed(usize),

    /// No complete reply within the timeout
    #[error("Communication timeout")]
    Timeout,

    /// I/O error during communication
    #[error("I/O error: {0}")]
    IoError(String),

    /// Serial port error
    #[error("Serial port error: {0}")]
    SerialPort(#[from] serialport::Error),
}

/// Result type for host link operations
pub type Result<T> = core::result::Result<T, SerialError>;

impl From<std::io::Error> for SerialError {
    fn from(e: std::io::Error) -> Self {
        SerialError::IoError(e.to_string())
    }
}
