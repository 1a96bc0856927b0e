use criterion::{black_box, criterion_group, criterion_main, Criterion};
use ringcode::{Stream, Value};

fn bench_write_read(c: &mut Criterion) {
    let frame = [
        Value::TimeS(1_756_425_600),
        Value::Uv32(88_000),
        Value::Sv16(-40),
        Value::Str("telemetry.frame"),
        Value::Blob(&[0xA5; 32]),
    ];

    c.bench_function("write_frame", |b| {
        let mut buf = vec![0u8; 4096];
        let mut stream = Stream::create(&mut buf).unwrap();
        b.iter(|| {
            let hash = stream.write(black_box(&frame)).unwrap();
            stream.read_frame().unwrap();
            hash
        });
    });

    c.bench_function("peek_frame", |b| {
        let mut buf = vec![0u8; 4096];
        let mut stream = Stream::create(&mut buf).unwrap();
        stream.write(&frame).unwrap();
        b.iter(|| {
            stream.rewind();
            stream.peek_frame().unwrap()
        });
    });
}

criterion_group!(benches, bench_write_read);
criterion_main!(benches);
