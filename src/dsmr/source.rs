//! Byte sources the reader can drain without blocking.

use std::collections::VecDeque;

/// Ordered byte channel that may deliver data in arbitrary fragments.
pub trait ByteSource {
    /// Whether a byte can be read right now.
    fn available(&self) -> bool;

    /// Read one byte, `None` when nothing is available.
    fn read_byte(&mut self) -> Option<u8>;
}

impl ByteSource for &[u8] {
    fn available(&self) -> bool {
        !self.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        let (&first, rest) = self.split_first()?;
        *self = rest;
        Some(first)
    }
}

impl ByteSource for VecDeque<u8> {
    fn available(&self) -> bool {
        !self.is_empty()
    }

    fn read_byte(&mut self) -> Option<u8> {
        self.pop_front()
    }
}
