use criterion::{black_box, criterion_group, criterion_main, Criterion};
use p1_dsmr::dsmr::telegram::parse_telegram;
use p1_dsmr::{calculate_crc16, FrameDetector, ManualClock, P1Reader};

const TELEGRAM: &str = concat!(
    "/ISk5\\2MT382-1000\r\n",
    "\r\n",
    "1-3:0.2.8(50)\r\n",
    "0-0:1.0.0(101209113020W)\r\n",
    "0-0:96.1.1(4B384547303034303436333935353037)\r\n",
    "1-0:1.8.1(123456.789*kWh)\r\n",
    "1-0:1.8.2(123456.789*kWh)\r\n",
    "1-0:2.8.1(123456.789*kWh)\r\n",
    "1-0:2.8.2(123456.789*kWh)\r\n",
    "0-0:96.14.0(0002)\r\n",
    "1-0:1.7.0(01.193*kW)\r\n",
    "1-0:2.7.0(00.000*kW)\r\n",
    "0-0:96.7.21(00004)\r\n",
    "1-0:99.97.0(2)(0-0:96.7.19)(101208152415W)(0000000240*s)(101208151004W)(0000000301*s)\r\n",
    "1-0:32.7.0(220.1*V)\r\n",
    "1-0:31.7.0(001*A)\r\n",
    "0-1:24.1.0(003)\r\n",
    "0-1:96.1.0(3232323241424344313233343536373839)\r\n",
    "0-1:24.2.1(101209112500W)(12785.123*m3)\r\n",
    "!",
);

fn framed() -> Vec<u8> {
    let mut data = TELEGRAM.as_bytes().to_vec();
    let crc = calculate_crc16(&data);
    data.extend_from_slice(format!("{crc:04X}").as_bytes());
    data
}

fn benchmark_crc(c: &mut Criterion) {
    let body = TELEGRAM.as_bytes();
    c.bench_function("crc16_telegram", |b| {
        b.iter(|| black_box(calculate_crc16(black_box(body))))
    });
}

fn benchmark_frame_detector(c: &mut Criterion) {
    let data = framed();
    c.bench_function("frame_detector", |b| {
        b.iter(|| {
            let mut detector = FrameDetector::new();
            for &byte in black_box(&data) {
                black_box(detector.feed(byte));
            }
        })
    });
}

fn benchmark_parse_telegram(c: &mut Criterion) {
    let body = TELEGRAM.as_bytes();
    c.bench_function("parse_telegram", |b| {
        b.iter(|| black_box(parse_telegram(black_box(body))))
    });
}

fn benchmark_reader(c: &mut Criterion) {
    let data = framed();
    let mut reader = P1Reader::with_clock(10_000, ManualClock::new(1));
    c.bench_function("reader_feed", |b| {
        b.iter(|| black_box(reader.feed(black_box(&data))))
    });
}

criterion_group!(
    benches,
    benchmark_crc,
    benchmark_frame_detector,
    benchmark_parse_telegram,
    benchmark_reader
);
criterion_main!(benches);
