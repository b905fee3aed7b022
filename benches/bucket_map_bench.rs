use bucketmap::BucketMap;
use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use std::time::Duration;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        Some(s)
    })
}

fn key(n: u64) -> String {
    format!("k{:016x}", n)
}

fn bench_insert(c: &mut Criterion) {
    c.bench_function("bucketmap_insert_10k", |b| {
        b.iter_batched(
            || BucketMap::<String, u64>::with_capacity(1 << 16),
            |mut m| {
                for (i, x) in lcg(1).take(10_000).enumerate() {
                    m.insert(key(x), i as u64);
                }
                black_box(m)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_get_hit(c: &mut Criterion) {
    c.bench_function("bucketmap_get_hit", |b| {
        let mut m = BucketMap::with_capacity(1 << 16);
        let keys: Vec<_> = lcg(7).take(20_000).map(key).collect();
        for (i, k) in keys.iter().cloned().enumerate() {
            m.insert(k, i as u64);
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            black_box(m.get(k.as_str()));
        })
    });
}

fn bench_get_miss(c: &mut Criterion) {
    c.bench_function("bucketmap_get_miss", |b| {
        let mut m = BucketMap::with_capacity(1 << 16);
        for (i, x) in lcg(11).take(10_000).enumerate() {
            m.insert(key(x), i as u64);
        }
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            // keys from a disjoint stream, almost surely absent
            let k = key(miss.next().unwrap());
            black_box(m.get(k.as_str()));
        })
    });
}

fn bench_remove_reinsert(c: &mut Criterion) {
    c.bench_function("bucketmap_remove_reinsert", |b| {
        let mut m = BucketMap::with_capacity(1 << 16);
        let keys: Vec<_> = lcg(23).take(10_000).map(key).collect();
        for (i, k) in keys.iter().cloned().enumerate() {
            m.insert(k, i as u64);
        }
        let mut it = keys.iter().cycle();
        b.iter(|| {
            let k = it.next().unwrap();
            let (k, v) = m.remove(k.as_str()).unwrap();
            m.insert(k, v);
        })
    });
}

fn bench_iterate(c: &mut Criterion) {
    c.bench_function("bucketmap_iterate_10k", |b| {
        let mut m = BucketMap::with_capacity(1 << 16);
        for (i, x) in lcg(31).take(10_000).enumerate() {
            m.insert(key(x), i as u64);
        }
        b.iter(|| {
            let mut acc = 0u64;
            for (_, _, v) in m.iter() {
                acc = acc.wrapping_add(*v);
            }
            black_box(acc)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .measurement_time(Duration::from_secs(3))
        .warm_up_time(Duration::from_millis(500))
}

criterion_group! {
    name = benches;
    config = bench_config();
    targets = bench_insert, bench_get_hit, bench_get_miss, bench_remove_reinsert, bench_iterate
}
criterion_main!(benches);
