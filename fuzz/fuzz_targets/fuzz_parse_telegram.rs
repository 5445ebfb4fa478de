#![no_main]

use libfuzzer_sys::fuzz_target;
use p1_dsmr::dsmr::telegram::parse_telegram;

fuzz_target!(|data: &[u8]| {
    let telegram = parse_telegram(data);
    assert!(telegram.readings.len() <= telegram.lines);
    for reading in &telegram.readings {
        assert!(!reading.key.is_empty());
    }
});
