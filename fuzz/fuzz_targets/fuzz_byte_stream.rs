#![no_main]

use libfuzzer_sys::fuzz_target;
use p1_dsmr::constants::DSMR_MAX_BUFFER;
use p1_dsmr::{ManualClock, P1Reader};

fuzz_target!(|data: &[u8]| {
    let clock = ManualClock::new(1);
    let mut reader = P1Reader::with_clock(1_000, clock.clone());

    // Feed in uneven chunks to exercise resynchronisation
    for (i, chunk) in data.chunks(7).enumerate() {
        reader.feed(chunk);
        assert!(reader.buffered() <= DSMR_MAX_BUFFER);
        if i % 16 == 0 {
            clock.advance(250);
            reader.tick();
        }
    }

    let stats = reader.stats();
    assert_eq!(stats.bytes_received, data.len() as u64);
    assert!(stats.telegrams_valid >= stats.empty_telegrams);
});
