use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use cuckoo_table::{Config, Item, KeyHash};

fn hash_key(c: &mut Criterion) {
    let key = nanoid::nanoid!();

    c.bench_function("hash key", |b| {
        b.iter(|| KeyHash::compute(key.as_bytes(), 0xFFFF));
    });
}

fn insert_fill(c: &mut Criterion) {
    let mut group = c.benchmark_group("insert until 90% full");

    for (bucket_size, max_depth) in [(1, 8), (2, 4), (4, 2), (8, 1)] {
        let keys = (0..(2 * 1_024 * usize::from(bucket_size) * 9 / 10))
            .map(|_| nanoid::nanoid!())
            .collect::<Vec<_>>();

        group.bench_function(format!("bucket size {bucket_size}, depth {max_depth}"), |b| {
            b.iter_batched(
                || {
                    Config::new(10)
                        .bucket_size(bucket_size)
                        .max_depth(max_depth)
                        .build()
                        .unwrap()
                },
                |mut table| {
                    for (idx, key) in keys.iter().enumerate() {
                        let _ = table.insert(Item::new(key, idx as u64));
                    }
                    table
                },
                BatchSize::LargeInput,
            );
        });
    }
}

fn lookup(c: &mut Criterion) {
    let mut table = Config::new(14).bucket_size(4).max_depth(4).build().unwrap();

    let keys = (0..80_000).map(|_| nanoid::nanoid!()).collect::<Vec<_>>();

    for (idx, key) in keys.iter().enumerate() {
        table.insert(Item::new(key, idx as u64)).unwrap();
    }

    let mut rng = rand::rng();

    c.bench_function("lookup, hit", |b| {
        b.iter(|| {
            use rand::seq::IndexedRandom;

            let key = keys.choose(&mut rng).unwrap();
            assert!(table.lookup(key).unwrap().is_some());
        });
    });

    c.bench_function("lookup, miss", |b| {
        b.iter(|| {
            let key = nanoid::nanoid!();
            assert!(table.lookup(&key).unwrap().is_none());
        });
    });
}

criterion_group!(benches, hash_key, insert_fill, lookup);
criterion_main!(benches);
