use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use hdc_mph::Table;
use rand::prelude::*;
use std::collections::HashMap;

fn gen_keys(n: usize, seed: u64) -> Vec<Vec<u8>> {
    let mut rng = StdRng::seed_from_u64(seed);
    (0..n)
        .map(|i| {
            let mut buf = (i as u64).to_le_bytes().to_vec();
            buf.extend((0..rng.gen_range(0..16)).map(|_| rng.r#gen::<u8>()));
            buf
        })
        .collect()
}

fn bench_build(c: &mut Criterion) {
    let mut group = c.benchmark_group("build");
    group.sample_size(10);

    for size in [1_000, 10_000, 100_000] {
        let keys = gen_keys(size, 42);
        group.bench_with_input(BenchmarkId::new("Table", size), &keys, |b, keys| {
            b.iter(|| black_box(Table::build(keys).unwrap()));
        });
    }

    group.finish();
}

fn bench_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("lookup");

    for size in [1_000, 100_000] {
        let keys = gen_keys(size, 7);
        let table = Table::build(&keys).unwrap();
        let map: HashMap<&[u8], u32> = keys
            .iter()
            .enumerate()
            .map(|(i, k)| (k.as_slice(), i as u32))
            .collect();

        group.bench_with_input(BenchmarkId::new("Table", size), &keys, |b, keys| {
            b.iter(|| {
                let mut acc = 0u32;
                for k in keys {
                    acc ^= table.lookup(k).0;
                }
                black_box(acc)
            });
        });

        group.bench_with_input(BenchmarkId::new("HashMap", size), &keys, |b, keys| {
            b.iter(|| {
                let mut acc = 0u32;
                for k in keys {
                    acc ^= map[k.as_slice()];
                }
                black_box(acc)
            });
        });
    }

    group.finish();
}

criterion_group!(benches, bench_build, bench_lookup);
criterion_main!(benches);
