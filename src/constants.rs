//! P1/DSMR Protocol Constants
//!
//! This module defines constants used by the telegram reader, based on the
//! DSMR P1 companion standard (IEC 62056-21 mode D framing with a CRC16 trailer).

/// Telegram start marker (`/` before the meter identification)
pub const DSMR_START_MARKER: u8 = b'/';

/// Telegram end marker (`!` before the 4 hex digit CRC)
pub const DSMR_END_MARKER: u8 = b'!';

/// Number of hex digits in the checksum trailer
pub const DSMR_CRC_DIGITS: usize = 4;

/// End pattern length: end marker plus the checksum trailer
pub const DSMR_END_PATTERN_LEN: usize = 1 + DSMR_CRC_DIGITS;

/// Hard ceiling for the accumulation buffer
pub const DSMR_MAX_BUFFER: usize = 4096;

/// Initial capacity reserved for the accumulation buffer
pub const DSMR_BUFFER_RESERVE: usize = 2048;

/// Reflected CRC-16 feedback polynomial (0x8005 reversed)
pub const DSMR_CRC_POLYNOMIAL: u16 = 0xA001;

// ----------------------------------------------------------------------------
// Reader defaults
// ----------------------------------------------------------------------------

/// Default validity window for readings (0 disables staleness checks)
pub const DEFAULT_OBIS_VALIDITY_MS: u64 = 10_000;

/// Default interval between sweep/publish ticks
pub const DEFAULT_UPDATE_INTERVAL_MS: u64 = 500;

/// Telegram lines logged per parse by the rotating line window
pub const LOG_LINES_PER_PARSE: usize = 10;

// Serial defaults (DSMR 4.x / 5.x: 115200 8N1)
pub const DSMR_DEFAULT_BAUDRATE: u32 = 115_200;
pub const DSMR_DEFAULT_DATA_BITS: u8 = 8;
pub const DSMR_DEFAULT_STOP_BITS: u8 = 1;

/// Bytes requested per serial read
pub const SERIAL_READ_CHUNK: usize = 512;
