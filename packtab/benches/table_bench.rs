use criterion::{black_box, criterion_group, criterion_main, Criterion};
use packtab::FixedMap;

fn keys(n: usize) -> Vec<String> {
    (0..n).map(|i| format!("param.{i:04}")).collect()
}

fn bench_insert(c: &mut Criterion) {
    let keys = keys(256);
    c.bench_function("insert_256", |b| {
        let mut arena = vec![0u8; 16 * 1024];
        b.iter(|| {
            let mut map = FixedMap::create(&mut arena, 256).unwrap();
            for key in &keys {
                map.insert(black_box(key), 0, key.as_bytes()).unwrap();
            }
        });
    });
}

fn bench_find(c: &mut Criterion) {
    let keys = keys(256);
    let mut arena = vec![0u8; 16 * 1024];
    let mut map = FixedMap::create(&mut arena, 256).unwrap();
    for key in &keys {
        map.insert(key, 0, key.as_bytes()).unwrap();
    }
    c.bench_function("find_hit", |b| {
        b.iter(|| map.find(black_box("param.0100")));
    });
    c.bench_function("find_miss", |b| {
        b.iter(|| map.find(black_box("param.9999")));
    });
}

criterion_group!(benches, bench_insert, bench_find);
criterion_main!(benches);
