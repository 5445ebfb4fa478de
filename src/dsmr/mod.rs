//! The dsmr module contains the components responsible for the P1 telegram
//! pipeline: checksum, framing, parsing, reading storage and publication, as
//! well as serial communication.

pub mod crc;
pub mod frame;
pub mod publish;
pub mod reader;
pub mod serial;
pub mod serial_mock;
pub mod source;
pub mod store;
pub mod telegram;

pub use crc::{calculate_crc16, verify_crc16};
pub use frame::{frame_from_dump, FrameDetector, FrameEvent, TelegramFrame};
pub use publish::{LogSink, Publisher, SensorSink};
pub use reader::{P1Reader, ReaderStats};
pub use serial::{run, P1Port, SerialConfig, SerialParity};
pub use source::ByteSource;
pub use store::{Reading, ReadingStore};
pub use telegram::{parse_telegram, ObisReading, ParsedTelegram};
