//! Tests for telegram framing: boundary detection, resynchronisation and the
//! checksum gate.

use p1_dsmr::constants::DSMR_MAX_BUFFER;
use p1_dsmr::dsmr::frame::{FrameDetector, FrameEvent, TelegramFrame};
use p1_dsmr::DsmrError;

const SAMPLE: &[u8] = b"/ISk5\\2MT382-1000\r\n1-0:1.8.0(00001.234*kWh)\r\n!BA6C";

fn frames(detector: &mut FrameDetector, data: &[u8]) -> Vec<FrameEvent> {
    data.iter()
        .map(|&b| detector.feed(b))
        .filter(|e| !matches!(e, FrameEvent::NeedMore))
        .collect()
}

/// The checksummed body covers `/` through `!`, excluding the hex digits.
#[test]
fn test_frame_body_bounds() {
    let mut detector = FrameDetector::new();
    match frames(&mut detector, SAMPLE).as_slice() {
        [FrameEvent::FrameReady(frame)] => {
            assert_eq!(frame.body().first(), Some(&b'/'));
            assert_eq!(frame.body().last(), Some(&b'!'));
            assert_eq!(frame.body().len(), SAMPLE.len() - 4);
        }
        other => panic!("unexpected events {other:?}"),
    }
}

/// Lowercase checksum digits are accepted.
#[test]
fn test_lowercase_checksum() {
    let mut data = SAMPLE.to_vec();
    let n = data.len();
    data[n - 4..].copy_from_slice(b"ba6c");
    let mut detector = FrameDetector::new();
    match frames(&mut detector, &data).as_slice() {
        [FrameEvent::FrameReady(frame)] => assert!(frame.verify().is_ok()),
        other => panic!("unexpected events {other:?}"),
    }
}

/// A non-hex trailer is not an end pattern; the telegram keeps accumulating.
#[test]
fn test_non_hex_trailer_needs_more() {
    let mut detector = FrameDetector::new();
    let events = frames(&mut detector, b"/X\r\n1(2)\r\n!\r\n12");
    assert!(events.is_empty());
    assert_eq!(detector.buffered(), 15);
}

/// Noise longer than the ceiling is flushed and the next telegram still decodes.
#[test]
fn test_resync_after_overflow() {
    let mut detector = FrameDetector::new();
    let mut data = vec![b'#'; DSMR_MAX_BUFFER + 1];
    data.extend_from_slice(SAMPLE);
    let events = frames(&mut detector, &data);
    assert_eq!(events.len(), 2);
    assert_eq!(
        events[0],
        FrameEvent::Overflow {
            len: DSMR_MAX_BUFFER + 1
        }
    );
    assert!(matches!(&events[1], FrameEvent::FrameReady(f) if f.verify().is_ok()));
}

/// A stray end pattern resets the buffer, and the following telegram decodes.
#[test]
fn test_resync_after_missing_start() {
    let mut detector = FrameDetector::new();
    let mut data = b"tail of a lost telegram\r\n!1A2B".to_vec();
    data.extend_from_slice(SAMPLE);
    let events = frames(&mut detector, &data);
    assert_eq!(events[0], FrameEvent::NoStart);
    assert!(matches!(&events[1], FrameEvent::FrameReady(f) if f.verify().is_ok()));
}

/// Flipping any byte of the checksummed range makes the gate reject the frame.
#[test]
fn test_checksum_gate_rejects_mutations() {
    let body = &SAMPLE[..SAMPLE.len() - 4];
    for i in 0..body.len() {
        let mut corrupted = body.to_vec();
        corrupted[i] ^= 0x01;
        let frame = TelegramFrame::new(corrupted.into(), 0xBA6C);
        assert!(matches!(
            frame.verify(),
            Err(DsmrError::ChecksumMismatch { received: 0xBA6C, .. })
        ));
    }
}

/// A frame that carries its recomputed checksum is accepted.
#[test]
fn test_checksum_gate_accepts_recomputed() {
    let mut body = SAMPLE[..SAMPLE.len() - 4].to_vec();
    body[25] = b'2';
    let crc = p1_dsmr::calculate_crc16(&body);
    let frame = TelegramFrame::new(body.into(), crc);
    assert!(frame.verify().is_ok());
}
