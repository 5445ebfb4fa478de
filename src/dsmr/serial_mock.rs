//! Mock P1 port for testing
//!
//! This module provides a mock serial port that can be used to test the
//! reader and the run loop without requiring a meter. It implements
//! `AsyncRead` for [`P1Port`](crate::dsmr::serial::P1Port) and
//! [`ByteSource`] for direct draining.

use crate::dsmr::crc::calculate_crc16;
use crate::dsmr::source::ByteSource;
use std::collections::VecDeque;
use std::io;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::task::{Context, Poll};
use tokio::io::{AsyncRead, ReadBuf};

fn lock<T>(m: &Mutex<T>) -> MutexGuard<'_, T> {
    m.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Mock serial port that replays queued bytes
#[derive(Clone, Default)]
pub struct MockSerialPort {
    /// Data to be read from the port (incoming)
    pub rx_buffer: Arc<Mutex<VecDeque<u8>>>,
    /// Simulated errors
    pub next_error: Arc<Mutex<Option<io::Error>>>,
    /// Maximum bytes handed out per read (0 = unlimited), to simulate fragmentation
    pub max_chunk: Arc<Mutex<usize>>,
}

impl MockSerialPort {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue data to be read from the port
    pub fn queue_rx_data(&self, data: &[u8]) {
        lock(&self.rx_buffer).extend(data);
    }

    /// Queue a telegram body (`/` through `!`) followed by its correct CRC
    pub fn queue_telegram(&self, body: &str) {
        let crc = calculate_crc16(body.as_bytes());
        self.queue_rx_data(body.as_bytes());
        self.queue_rx_data(format!("{crc:04X}").as_bytes());
    }

    /// Queue a telegram body followed by a fixed checksum trailer
    pub fn queue_telegram_with_crc(&self, body: &str, crc: &str) {
        self.queue_rx_data(body.as_bytes());
        self.queue_rx_data(crc.as_bytes());
    }

    /// Bytes still waiting to be read
    pub fn pending(&self) -> usize {
        lock(&self.rx_buffer).len()
    }

    /// Clear all buffers
    pub fn clear(&self) {
        lock(&self.rx_buffer).clear();
    }

    /// Set an error to be returned on the next read
    pub fn set_next_error(&self, error: io::Error) {
        *lock(&self.next_error) = Some(error);
    }

    /// Limit the bytes returned per read
    pub fn set_max_chunk(&self, max_chunk: usize) {
        *lock(&self.max_chunk) = max_chunk;
    }
}

// Implement AsyncRead for MockSerialPort
impl AsyncRead for MockSerialPort {
    fn poll_read(
        self: Pin<&mut Self>,
        _cx: &mut Context<'_>,
        buf: &mut ReadBuf<'_>,
    ) -> Poll<io::Result<()>> {
        // Check for simulated error
        if let Some(error) = lock(&self.next_error).take() {
            return Poll::Ready(Err(error));
        }

        let max_chunk = *lock(&self.max_chunk);
        let mut rx = lock(&self.rx_buffer);
        let mut available = rx.len().min(buf.remaining());
        if max_chunk > 0 {
            available = available.min(max_chunk);
        }

        // an empty queue reads as end of stream
        if available > 0 {
            let data: Vec<u8> = rx.drain(..available).collect();
            buf.put_slice(&data);
        }

        Poll::Ready(Ok(()))
    }
}

impl ByteSource for MockSerialPort {
    fn available(&self) -> bool {
        !lock(&self.rx_buffer).is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        lock(&self.rx_buffer).pop_front()
    }
}
