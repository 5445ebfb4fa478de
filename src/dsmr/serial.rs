//! # P1 Serial Communication
//!
//! This module opens the meter's P1 port with `tokio-serial` and runs the
//! reader against it. The port is receive-only: the meter pushes a telegram
//! every second (DSMR 5) or every ten seconds (DSMR 4) once the request line
//! is raised by the hardware.
//!
//! [`run`] interleaves the two reader entry points: every chunk that arrives
//! is drained into the reader, and on each `update_interval` the reader ticks
//! (staleness sweep + publication).

use crate::clock::Clock;
use crate::constants::{
    DSMR_DEFAULT_BAUDRATE, DSMR_DEFAULT_DATA_BITS, DSMR_DEFAULT_STOP_BITS, SERIAL_READ_CHUNK,
};
use crate::dsmr::reader::P1Reader;
use crate::error::DsmrError;
use log::{debug, info};
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;
use std::time::Duration;
use tokio::io::{AsyncRead, AsyncReadExt};
use tokio::time::MissedTickBehavior;
use tokio_serial::SerialPortBuilderExt;

/// Parity setting of the P1 line.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SerialParity {
    #[default]
    None,
    Even,
    Odd,
}

/// Configuration for the serial connection.
///
/// Defaults match DSMR 4.x/5.x meters (115200 8N1). DSMR 2.2 and 3.0 meters
/// use 9600 7E1.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SerialConfig {
    pub port: String,
    pub baudrate: u32,
    pub data_bits: u8,
    pub parity: SerialParity,
    pub stop_bits: u8,
}

impl Default for SerialConfig {
    fn default() -> Self {
        SerialConfig {
            port: "/dev/ttyUSB0".to_string(),
            baudrate: DSMR_DEFAULT_BAUDRATE,
            data_bits: DSMR_DEFAULT_DATA_BITS,
            parity: SerialParity::None,
            stop_bits: DSMR_DEFAULT_STOP_BITS,
        }
    }
}

impl SerialConfig {
    pub fn tokio_data_bits(&self) -> Result<tokio_serial::DataBits, DsmrError> {
        match self.data_bits {
            7 => Ok(tokio_serial::DataBits::Seven),
            8 => Ok(tokio_serial::DataBits::Eight),
            other => Err(DsmrError::ConfigError(format!(
                "unsupported data bits: {other}"
            ))),
        }
    }

    pub fn tokio_stop_bits(&self) -> Result<tokio_serial::StopBits, DsmrError> {
        match self.stop_bits {
            1 => Ok(tokio_serial::StopBits::One),
            2 => Ok(tokio_serial::StopBits::Two),
            other => Err(DsmrError::ConfigError(format!(
                "unsupported stop bits: {other}"
            ))),
        }
    }

    pub fn tokio_parity(&self) -> tokio_serial::Parity {
        match self.parity {
            SerialParity::None => tokio_serial::Parity::None,
            SerialParity::Even => tokio_serial::Parity::Even,
            SerialParity::Odd => tokio_serial::Parity::Odd,
        }
    }
}

/// Receive side of a P1 connection over any async byte stream.
pub struct P1Port<P> {
    port: P,
    rx: VecDeque<u8>,
}

impl P1Port<tokio_serial::SerialStream> {
    /// Open the serial port described by `config`.
    pub fn open(config: &SerialConfig) -> Result<Self, DsmrError> {
        let port = tokio_serial::new(config.port.as_str(), config.baudrate)
            .data_bits(config.tokio_data_bits()?)
            .stop_bits(config.tokio_stop_bits()?)
            .parity(config.tokio_parity())
            .open_native_async()
            .map_err(|e| DsmrError::SerialPortError(e.to_string()))?;
        info!("Opened P1 port {} at {} baud", config.port, config.baudrate);
        Ok(Self::from_reader(port))
    }
}

impl<P: AsyncRead + Unpin> P1Port<P> {
    pub fn from_reader(port: P) -> Self {
        P1Port {
            port,
            rx: VecDeque::with_capacity(SERIAL_READ_CHUNK),
        }
    }

    /// Wait for the next chunk of bytes and queue it. Returns the number of
    /// bytes read; 0 means the stream ended.
    pub async fn read_chunk(&mut self) -> Result<usize, DsmrError> {
        let mut buf = [0u8; SERIAL_READ_CHUNK];
        let n = self
            .port
            .read(&mut buf)
            .await
            .map_err(|e| DsmrError::SerialPortError(e.to_string()))?;
        self.rx.extend(&buf[..n]);
        Ok(n)
    }

    /// Bytes read but not yet drained by a reader.
    pub fn received(&mut self) -> &mut VecDeque<u8> {
        &mut self.rx
    }

    pub fn into_inner(self) -> P {
        self.port
    }
}

/// Drive a reader from a port until the stream ends.
///
/// A final tick is performed when the stream closes so that sinks see the
/// last telegram.
pub async fn run<P, C>(
    port: &mut P1Port<P>,
    reader: &mut P1Reader<C>,
    update_interval: Duration,
) -> Result<(), DsmrError>
where
    P: AsyncRead + Unpin,
    C: Clock,
{
    let mut ticker = tokio::time::interval(update_interval.max(Duration::from_millis(1)));
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        tokio::select! {
            _ = ticker.tick() => reader.tick(),
            read = port.read_chunk() => {
                let n = read?;
                reader.drain(port.received());
                if n == 0 {
                    debug!("P1 stream closed");
                    reader.tick();
                    return Ok(());
                }
            }
        }
    }
}
