//! # P1 Telegram Framing
//!
//! A P1 port sends telegrams without any length field:
//!
//! ```text
//! /ISk5\2MT382-1000        <- start marker + identification
//!
//! 1-0:1.8.1(123456.789*kWh)
//! ...
//! !8E67                    <- end marker + CRC16 as 4 hex digits
//! ```
//!
//! [`FrameDetector`] accumulates the stream one byte at a time and cuts a
//! candidate frame whenever the buffer ends with `!XXXX`. The CRC covers the
//! bytes from the `/` through the `!` inclusive. Every completed end pattern
//! resets the buffer, whether or not a start marker was found.
//!
//! ```ignore
//! let mut detector = FrameDetector::new();
//! for &byte in stream {
//!     if let FrameEvent::FrameReady(frame) = detector.feed(byte) {
//!         frame.verify()?;
//!         // hand frame.body() to the telegram parser
//!     }
//! }
//! ```

use crate::constants::{
    DSMR_BUFFER_RESERVE, DSMR_CRC_DIGITS, DSMR_END_MARKER, DSMR_END_PATTERN_LEN,
    DSMR_MAX_BUFFER, DSMR_START_MARKER,
};
use crate::dsmr::crc::calculate_crc16;
use crate::error::DsmrError;
use bytes::{Bytes, BytesMut};

/// A candidate telegram cut from the stream, not yet checksum-verified.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TelegramFrame {
    /// Bytes from the start marker through the end marker inclusive.
    body: Bytes,
    /// Checksum received in the trailer.
    checksum: u16,
}

impl TelegramFrame {
    pub fn new(body: Bytes, checksum: u16) -> Self {
        TelegramFrame { body, checksum }
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }

    pub fn checksum(&self) -> u16 {
        self.checksum
    }

    /// Checksum gate: compares the computed CRC16 with the received one.
    pub fn verify(&self) -> Result<(), DsmrError> {
        let calculated = calculate_crc16(&self.body);
        if calculated != self.checksum {
            return Err(DsmrError::ChecksumMismatch {
                calculated,
                received: self.checksum,
            });
        }
        Ok(())
    }
}

/// Outcome of feeding one byte to the detector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FrameEvent {
    /// No end pattern yet.
    NeedMore,
    /// A complete candidate frame; the buffer has been reset.
    FrameReady(TelegramFrame),
    /// The buffer passed its ceiling and was flushed.
    Overflow { len: usize },
    /// An end pattern arrived with no start marker before it; buffer flushed.
    NoStart,
}

/// Byte-at-a-time telegram boundary detector.
#[derive(Debug)]
pub struct FrameDetector {
    buffer: BytesMut,
    max_len: usize,
}

impl Default for FrameDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl FrameDetector {
    /// Create a detector with the default 4096 byte ceiling.
    pub fn new() -> Self {
        Self::with_max_len(DSMR_MAX_BUFFER)
    }

    /// Create a detector with a custom buffer ceiling.
    pub fn with_max_len(max_len: usize) -> Self {
        FrameDetector {
            buffer: BytesMut::with_capacity(DSMR_BUFFER_RESERVE.min(max_len + 1)),
            max_len,
        }
    }

    /// Number of bytes currently buffered.
    pub fn buffered(&self) -> usize {
        self.buffer.len()
    }

    pub fn max_len(&self) -> usize {
        self.max_len
    }

    /// Drop any partially accumulated telegram.
    pub fn reset(&mut self) {
        self.buffer.clear();
    }

    /// Append one byte and report whether a frame boundary was reached.
    pub fn feed(&mut self, byte: u8) -> FrameEvent {
        self.buffer.extend_from_slice(&[byte]);

        let n = self.buffer.len();
        if n > self.max_len {
            self.buffer.clear();
            return FrameEvent::Overflow { len: n };
        }
        if n < DSMR_END_PATTERN_LEN {
            return FrameEvent::NeedMore;
        }

        // end marker position: '!' followed by 4 hex digits
        let end = n - DSMR_END_PATTERN_LEN;
        if self.buffer[end] != DSMR_END_MARKER {
            return FrameEvent::NeedMore;
        }
        let checksum = match parse_crc_field(&self.buffer[end + 1..]) {
            Some(crc) => crc,
            None => return FrameEvent::NeedMore,
        };

        let event = match self.buffer[..end]
            .iter()
            .rposition(|&b| b == DSMR_START_MARKER)
        {
            Some(start) => FrameEvent::FrameReady(TelegramFrame {
                body: Bytes::copy_from_slice(&self.buffer[start..=end]),
                checksum,
            }),
            None => FrameEvent::NoStart,
        };
        self.buffer.clear();
        event
    }
}

/// Parse the 4 hex digit checksum trailer (either case), high nibble first.
pub fn parse_crc_field(field: &[u8]) -> Option<u16> {
    if field.len() != DSMR_CRC_DIGITS {
        return None;
    }
    field.iter().try_fold(0u16, |acc, &b| {
        let nibble = (b as char).to_digit(16)?;
        Some((acc << 4) | nibble as u16)
    })
}

/// Locate the checksummed range of a raw telegram dump: from the first `/`
/// through the first `!` after it.
pub fn checksum_range(data: &[u8]) -> Option<&[u8]> {
    let (start, end) = telegram_bounds(data)?;
    Some(&data[start..=end])
}

fn telegram_bounds(data: &[u8]) -> Option<(usize, usize)> {
    let start = data.iter().position(|&b| b == DSMR_START_MARKER)?;
    let end = data[start..]
        .iter()
        .position(|&b| b == DSMR_END_MARKER)
        .map(|offset| start + offset)?;
    Some((start, end))
}

/// Cut the first complete telegram out of a raw dump, trailer included.
///
/// Unlike [`FrameDetector`] this reports why a dump cannot be framed: a
/// missing `/`...`!` range or a malformed checksum trailer.
pub fn frame_from_dump(data: &[u8]) -> Result<TelegramFrame, DsmrError> {
    let (start, end) = telegram_bounds(data).ok_or(DsmrError::FrameNotFound)?;
    let body = &data[start..=end];
    let trailer = &data[end + 1..data.len().min(end + 1 + DSMR_CRC_DIGITS)];
    let checksum = parse_crc_field(trailer).ok_or_else(|| {
        DsmrError::InvalidChecksumField(String::from_utf8_lossy(trailer).into_owned())
    })?;
    Ok(TelegramFrame::new(Bytes::copy_from_slice(body), checksum))
}
