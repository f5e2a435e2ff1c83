#[macro_use]
extern crate criterion;

use criterion::{black_box, Criterion};

use netrain_protocols::classify;

// Ethernet II + IPv4 (no options) + TCP 51514 -> 443, 24 bytes of TLS record payload
const TLS_FRAME: &[u8] = &[
    0x02, 0x00, 0x00, 0x00, 0x00, 0x01, // dst mac
    0x02, 0x00, 0x00, 0x00, 0x00, 0x02, // src mac
    0x08, 0x00, // IPv4
    0x45, 0x00, 0x00, 0x40, 0x1c, 0x46, 0x40, 0x00, 0x40, 0x06, 0x00, 0x00, // ip header
    0xc0, 0xa8, 0x01, 0x0a, // 192.168.1.10
    0x5d, 0xb8, 0xd8, 0x22, // 93.184.216.34
    0xc9, 0x3a, 0x01, 0xbb, // ports
    0x00, 0x00, 0x00, 0x01, 0x00, 0x00, 0x00, 0x00, // seq, ack
    0x50, 0x18, 0xff, 0xff, 0x00, 0x00, 0x00, 0x00, // offset, flags, window, csum, urg
    0x17, 0x03, 0x03, 0x00, 0x13, 0x8a, 0x4f, 0x21, 0x9c, 0x03, 0x77, 0x5e, // payload
    0xd1, 0x08, 0x6b, 0x2e, 0xf4, 0x90, 0x3c, 0x11, 0xa5, 0x62, 0x0e, 0x7d,
];

// Same frame cut inside the TCP header
const TRUNCATED_FRAME: &[u8] = &[
    0x02, 0x00, 0x00, 0x00, 0x00, 0x01, 0x02, 0x00, 0x00, 0x00, 0x00, 0x02, 0x08, 0x00, 0x45,
    0x00, 0x00, 0x40, 0x1c, 0x46, 0x40, 0x00, 0x40, 0x06, 0x00, 0x00, 0xc0, 0xa8, 0x01, 0x0a,
    0x5d, 0xb8, 0xd8, 0x22, 0xc9, 0x3a,
];

fn benchmark_tls_classification(c: &mut Criterion) {
    c.bench_function("classify_tls_frame", |b| {
        b.iter(|| {
            black_box(classify(black_box(TLS_FRAME), TLS_FRAME.len())).unwrap();
        })
    });
}

fn benchmark_truncated_classification(c: &mut Criterion) {
    c.bench_function("classify_truncated_frame", |b| {
        b.iter(|| {
            let _ = black_box(classify(black_box(TRUNCATED_FRAME), TRUNCATED_FRAME.len()));
        })
    });
}

criterion_group!(
    benches,
    benchmark_tls_classification,
    benchmark_truncated_classification
);
criterion_main!(benches);
