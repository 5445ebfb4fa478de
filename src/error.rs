//! # P1/DSMR Error Handling
//!
//! This module defines the DsmrError enum, which represents the different error
//! types that can occur in the p1-dsmr crate.
//!
//! Stream-level conditions (overflow, missing start, checksum mismatch, empty
//! telegram) are recovered inside the reader and only logged and counted. The
//! remaining variants are returned by the outer surfaces: configuration
//! loading, serial port I/O and the CLI.

use thiserror::Error;

/// Represents the different error types that can occur in the P1 crate.
#[derive(Debug, Error)]
pub enum DsmrError {
    /// Indicates an error related to the serial port communication.
    #[error("Serial port error: {0}")]
    SerialPortError(String),

    /// The accumulation buffer passed its ceiling without completing a telegram.
    #[error("Telegram buffer overflow after {len} bytes")]
    BufferOverflow { len: usize },

    /// An end pattern was found with no start marker before it.
    #[error("Telegram start marker not found")]
    FrameNotFound,

    /// Indicates a checksum mismatch.
    #[error("Checksum mismatch: calculated {calculated:04X}, received {received:04X}")]
    ChecksumMismatch { calculated: u16, received: u16 },

    /// A checksummed telegram produced no usable readings.
    #[error("Telegram contained no usable records ({lines} lines)")]
    EmptyTelegram { lines: usize },

    /// The checksum field after the end marker is not 4 hex digits.
    #[error("Invalid checksum field: {0}")]
    InvalidChecksumField(String),

    /// Indicates an invalid configuration value.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}
