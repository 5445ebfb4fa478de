//! # p1-dsmr - A Rust Crate for Reading DSMR/P1 Smart Meter Telegrams
//!
//! Dutch, Belgian and Luxembourg smart meters push a text telegram over their
//! P1 port every few seconds. The p1-dsmr crate finds complete telegrams in the
//! raw serial byte stream, validates their CRC16, parses the OBIS readings,
//! normalises units and keeps the latest value of every key for periodic
//! publication.
//!
//! ## Features
//!
//! - Byte-at-a-time telegram framing with a bounded buffer
//! - CRC16 validation of every telegram before anything is parsed
//! - Tolerant OBIS line parsing with energy in kWh and power in W
//! - Staleness tracking: readings not refreshed in time become unavailable
//! - Sensor registration and ordered publication
//! - Serial port access via `tokio-serial`, JSON configuration and a CLI
//!
//! ## Usage
//!
//! ```rust
//! use p1_dsmr::clock::ManualClock;
//! use p1_dsmr::P1Reader;
//!
//! let clock = ManualClock::new(1_000);
//! let mut reader = P1Reader::with_clock(10_000, clock.clone());
//! reader.register("1-0:1.8.0", |value: Option<f64>| println!("energy: {value:?}"));
//!
//! reader.feed(b"/ISk5\\2MT382-1000\r\n1-0:1.8.0(00001.234*kWh)\r\n!BA6C");
//! assert_eq!(reader.store().snapshot("1-0:1.8.0"), Some(1.234));
//!
//! reader.tick();
//! ```

pub mod clock;
pub mod config;
pub mod constants;
pub mod dsmr;
pub mod error;
pub mod logging;
pub mod util;

pub use crate::error::DsmrError;
pub use crate::logging::{init_logger, log_info};

pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::{DsmrConfig, SensorConfig};
pub use dsmr::{
    calculate_crc16, parse_telegram, run, ByteSource, FrameDetector, FrameEvent, LogSink,
    ObisReading, P1Port, P1Reader, ParsedTelegram, Reading, ReaderStats, ReadingStore,
    SensorSink, SerialConfig, TelegramFrame,
};

/// Open the P1 serial port described by `config`.
///
/// # Arguments
/// * `config` - Port path and line settings (e.g. "/dev/ttyUSB0", 115200 8N1)
///
/// # Returns
/// * `Ok(P1Port)` - Port ready to be driven by [`run`]
/// * `Err(DsmrError)` - Opening the port failed
pub fn connect(config: &SerialConfig) -> Result<P1Port<tokio_serial::SerialStream>, DsmrError> {
    P1Port::open(config)
}
