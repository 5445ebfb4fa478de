//! # P1 Reader
//!
//! [`P1Reader`] ties the pipeline together:
//!
//! ```text
//! bytes -> FrameDetector -> checksum gate -> telegram parser -> ReadingStore -> Publisher
//! ```
//!
//! It is driven by two entry points that never run concurrently:
//! [`P1Reader::drain`] consumes whatever bytes are available right now, and
//! [`P1Reader::tick`] expires stale readings and publishes the latest values.
//! Neither blocks. Stream problems (overflow, missing start, bad checksum,
//! empty telegram) are logged and counted, and the reader always returns to
//! an empty buffer ready to resynchronise on the next telegram.

use crate::clock::{Clock, MonotonicClock};
use crate::constants::DEFAULT_OBIS_VALIDITY_MS;
use crate::dsmr::frame::{FrameDetector, FrameEvent, TelegramFrame};
use crate::dsmr::publish::{Publisher, SensorSink};
use crate::dsmr::source::ByteSource;
use crate::dsmr::store::ReadingStore;
use crate::dsmr::telegram::{lines, parse_lines};
use crate::error::DsmrError;
use crate::util::logging::{log_frame_preview, TelegramLineLog};
use log::{debug, info, warn};
use serde::Serialize;

/// Counters for the reader's lifetime.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ReaderStats {
    pub bytes_received: u64,
    pub telegrams_valid: u64,
    pub checksum_errors: u64,
    pub overflows: u64,
    pub missing_start: u64,
    pub empty_telegrams: u64,
    pub readings_stored: u64,
}

pub struct P1Reader<C: Clock = MonotonicClock> {
    detector: FrameDetector,
    store: ReadingStore,
    publisher: Publisher,
    line_log: TelegramLineLog,
    clock: C,
    validity_ms: u64,
    stats: ReaderStats,
}

impl Default for P1Reader<MonotonicClock> {
    fn default() -> Self {
        Self::new(DEFAULT_OBIS_VALIDITY_MS)
    }
}

impl P1Reader<MonotonicClock> {
    /// Reader timestamping readings with a monotonic clock.
    pub fn new(validity_ms: u64) -> Self {
        Self::with_clock(validity_ms, MonotonicClock::new())
    }
}

impl<C: Clock> P1Reader<C> {
    pub fn with_clock(validity_ms: u64, clock: C) -> Self {
        info!("DSMR reader ready; obis-validity={validity_ms} ms");
        P1Reader {
            detector: FrameDetector::new(),
            store: ReadingStore::new(),
            publisher: Publisher::new(),
            line_log: TelegramLineLog::default(),
            clock,
            validity_ms,
            stats: ReaderStats::default(),
        }
    }

    /// Replace the frame detector, e.g. to use a different buffer ceiling.
    pub fn with_detector(mut self, detector: FrameDetector) -> Self {
        self.detector = detector;
        self
    }

    /// Register a sink for an OBIS key. Returns false for an empty key.
    pub fn register<S>(&mut self, key: &str, sink: S) -> bool
    where
        S: SensorSink + 'static,
    {
        self.publisher.register(key, Box::new(sink))
    }

    /// Consume every byte the source has available right now.
    ///
    /// Returns the number of bytes consumed.
    pub fn drain<S>(&mut self, source: &mut S) -> usize
    where
        S: ByteSource + ?Sized,
    {
        let mut consumed = 0;
        while source.available() {
            let Some(byte) = source.read_byte() else {
                break;
            };
            consumed += 1;
            let event = self.detector.feed(byte);
            self.handle_event(event);
        }
        self.stats.bytes_received += consumed as u64;
        consumed
    }

    /// Feed a chunk of bytes.
    pub fn feed(&mut self, mut bytes: &[u8]) -> usize {
        self.drain(&mut bytes)
    }

    /// Expire stale readings, then publish to every registered sink.
    pub fn tick(&mut self) {
        let now = self.clock.now_ms();
        let expired = self.store.expire_stale(now, self.validity_ms);
        if expired > 0 {
            debug!("Invalidated {expired} stale readings");
        }
        self.publisher.publish_all(&self.store);
    }

    fn handle_event(&mut self, event: FrameEvent) {
        match event {
            FrameEvent::NeedMore => {}
            FrameEvent::Overflow { len } => {
                self.stats.overflows += 1;
                warn!("{}, flushing", DsmrError::BufferOverflow { len });
            }
            FrameEvent::NoStart => {
                self.stats.missing_start += 1;
                warn!("{}, clearing buffer", DsmrError::FrameNotFound);
            }
            FrameEvent::FrameReady(frame) => match self.process_frame(&frame) {
                Ok(records) => {
                    self.stats.telegrams_valid += 1;
                    self.stats.readings_stored += records as u64;
                }
                Err(e @ DsmrError::ChecksumMismatch { .. }) => {
                    self.stats.checksum_errors += 1;
                    warn!("DSMR {e}");
                    log_frame_preview("Rejected telegram", frame.body());
                }
                Err(e @ DsmrError::EmptyTelegram { .. }) => {
                    self.stats.telegrams_valid += 1;
                    self.stats.empty_telegrams += 1;
                    warn!("{e}");
                }
                Err(e) => warn!("Telegram dropped: {e}"),
            },
        }
    }

    /// Verify, parse and store one candidate frame. Returns the number of
    /// readings stored.
    fn process_frame(&mut self, frame: &TelegramFrame) -> Result<usize, DsmrError> {
        frame.verify()?;

        let telegram = parse_lines(self.line_log.observe(lines(frame.body())));
        self.line_log.advance(telegram.lines);
        if let Some(ident) = &telegram.identification {
            debug!("Telegram from meter {ident}");
        }
        if telegram.readings.is_empty() {
            return Err(DsmrError::EmptyTelegram {
                lines: telegram.lines,
            });
        }

        let now = self.clock.now_ms();
        for reading in &telegram.readings {
            self.store.set(&reading.key, reading.value, now);
        }
        info!(
            "Parsed DSMR telegram: {} lines, {} records",
            telegram.lines,
            telegram.readings.len()
        );
        Ok(telegram.readings.len())
    }

    pub fn store(&self) -> &ReadingStore {
        &self.store
    }

    pub fn stats(&self) -> &ReaderStats {
        &self.stats
    }

    pub fn validity_ms(&self) -> u64 {
        self.validity_ms
    }

    pub fn publisher(&self) -> &Publisher {
        &self.publisher
    }

    /// Bytes waiting for the end of the current telegram.
    pub fn buffered(&self) -> usize {
        self.detector.buffered()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;
    use crate::dsmr::crc::calculate_crc16;

    fn telegram(body: &str) -> Vec<u8> {
        let mut data = body.as_bytes().to_vec();
        let crc = calculate_crc16(&data);
        data.extend_from_slice(format!("{crc:04X}").as_bytes());
        data
    }

    #[test]
    fn test_valid_telegram_is_stored() {
        let clock = ManualClock::new(500);
        let mut reader = P1Reader::with_clock(10_000, clock.clone());
        reader.feed(&telegram("/ISk5\\2MT382-1000\r\n1-0:1.7.0(01.193*kW)\r\n!"));
        assert_eq!(reader.store().snapshot("1-0:1.7.0"), Some(1193.0));
        assert_eq!(reader.store().get("1-0:1.7.0").unwrap().updated_ms, 500);
        assert_eq!(reader.stats().telegrams_valid, 1);
        assert_eq!(reader.stats().readings_stored, 1);
        assert_eq!(reader.buffered(), 0);
    }

    #[test]
    fn test_empty_telegram_counted_not_stored() {
        let mut reader = P1Reader::with_clock(10_000, ManualClock::new(1));
        reader.feed(&telegram("/XMX5\r\n0-0:96.1.1(ABC)\r\n!"));
        assert!(reader.store().is_empty());
        assert_eq!(reader.stats().empty_telegrams, 1);
        assert_eq!(reader.stats().telegrams_valid, 1);
    }

    #[test]
    fn test_stream_errors_are_counted() {
        let mut reader = P1Reader::with_clock(10_000, ManualClock::new(1))
            .with_detector(FrameDetector::with_max_len(32));
        reader.feed(&[b'~'; 40]);
        reader.feed(b"1-0:1.8.0(1)\r\n!ABCD");
        reader.feed(b"/X\r\n1(2)\r\n!0000");
        let stats = reader.stats();
        assert_eq!(stats.overflows, 1);
        assert_eq!(stats.missing_start, 1);
        assert_eq!(stats.checksum_errors, 1);
        assert_eq!(stats.telegrams_valid, 0);
        assert_eq!(stats.bytes_received, 40 + 19 + 15);
    }
}
