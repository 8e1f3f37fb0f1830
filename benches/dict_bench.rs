use criterion::{black_box, criterion_group, criterion_main, BatchSize, Criterion};
use rehash_dict::{BytesType, Dict, DictType};
use std::time::Duration;

type D = Dict<BytesType<u64>>;

fn lcg(mut s: u64) -> impl Iterator<Item = u64> {
    std::iter::from_fn(move || {
        s = s.wrapping_mul(6364136223846793005).wrapping_add(1);
        Some(s)
    })
}

fn key(n: u64) -> Vec<u8> {
    format!("k{:016x}", n).into_bytes()
}

fn new_dict() -> D {
    Dict::new(rehash_dict::hash::DEFAULT_SEED)
}

fn filled(seed: u64, n: usize) -> (D, Vec<Vec<u8>>) {
    let mut d = new_dict();
    let keys: Vec<_> = lcg(seed).take(n).map(key).collect();
    for (i, k) in keys.iter().enumerate() {
        d.add(k.clone(), i as u64).unwrap();
    }
    finish_rehash(&mut d);
    (d, keys)
}

fn finish_rehash<T: DictType>(d: &mut Dict<T>) {
    while d.rehash(100) {}
}

fn bench_add_fresh_100k(c: &mut Criterion) {
    c.bench_function("dict::add_fresh_100k", |b| {
        b.iter_batched(
            new_dict,
            |mut d| {
                for (i, x) in lcg(1).take(100_000).enumerate() {
                    let _ = d.add(key(x), i as u64).unwrap();
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_add_presized_100k(c: &mut Criterion) {
    c.bench_function("dict::add_presized_100k", |b| {
        b.iter_batched(
            || Dict::<BytesType<u64>>::with_capacity(rehash_dict::hash::DEFAULT_SEED, 100_000),
            |mut d| {
                for (i, x) in lcg(3).take(100_000).enumerate() {
                    let _ = d.add(key(x), i as u64).unwrap();
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_remove_random_10k(c: &mut Criterion) {
    c.bench_function("dict::remove_random_10k_of_110k", |b| {
        b.iter_batched(
            || {
                let (d, keys) = filled(5, 110_000);
                // Precompute 10k unique indices via LCG
                let n = keys.len();
                let mut sel = std::collections::HashSet::with_capacity(10_000);
                let mut s = 0x9e3779b97f4a7c15u64;
                while sel.len() < 10_000 {
                    s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                    sel.insert((s as usize) % n);
                }
                let to_remove: Vec<Vec<u8>> = sel.into_iter().map(|i| keys[i].clone()).collect();
                (d, to_remove)
            },
            |(mut d, to_remove)| {
                for k in &to_remove {
                    let _ = d.remove(k);
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_find_hit_10k(c: &mut Criterion) {
    c.bench_function("dict::find_hit_10k_on_100k", |b| {
        let (mut d, keys) = filled(7, 100_000);
        let n = keys.len();
        let mut s = 0x9e3779b97f4a7c15u64;
        let queries: Vec<Vec<u8>> = (0..10_000)
            .map(|_| {
                s = s.wrapping_mul(2862933555777941757).wrapping_add(3037000493);
                keys[(s as usize) % n].clone()
            })
            .collect();
        b.iter(|| {
            for k in &queries {
                black_box(d.fetch_value(k));
            }
        })
    });
}

fn bench_find_miss_10k(c: &mut Criterion) {
    c.bench_function("dict::find_miss_10k_on_100k", |b| {
        let (mut d, _) = filled(11, 100_000);
        let mut miss = lcg(0xdead_beef);
        b.iter(|| {
            for _ in 0..10_000 {
                let k = key(miss.next().unwrap());
                black_box(d.fetch_value(&k));
            }
        })
    });
}

// Cost of finishing a grow from 64k to 128k buckets in timed batches.
fn bench_rehash_for(c: &mut Criterion) {
    c.bench_function("dict::rehash_for_1ms_grow_64k", |b| {
        b.iter_batched(
            || {
                let (mut d, _) = filled(13, 60_000);
                d.expand(131_072).unwrap();
                d
            },
            |mut d| {
                while d.is_rehashing() {
                    black_box(d.rehash_for(Duration::from_millis(1)));
                }
                black_box(d)
            },
            BatchSize::SmallInput,
        )
    });
}

fn bench_sampling(c: &mut Criterion) {
    c.bench_function("dict::random_entry_10k_on_100k", |b| {
        let (mut d, _) = filled(17, 100_000);
        b.iter(|| {
            for _ in 0..10_000 {
                black_box(d.random_entry().map(|e| *e.value()));
            }
        })
    });

    c.bench_function("dict::sample_entries_16x1k_on_100k", |b| {
        let (mut d, _) = filled(19, 100_000);
        b.iter(|| {
            for _ in 0..1_000 {
                black_box(d.sample_entries(16));
            }
        })
    });
}

fn bench_iter_and_scan(c: &mut Criterion) {
    let (d, _) = filled(999, 100_000);
    c.bench_function("dict::iter_all_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            for (_k, v) in d.iter() {
                sum = sum.wrapping_add(*v);
            }
            black_box(sum)
        })
    });

    c.bench_function("dict::scan_all_100k", |b| {
        b.iter(|| {
            let mut sum = 0u64;
            let mut cursor = 0;
            loop {
                cursor = d.scan(cursor, |_, v| sum = sum.wrapping_add(*v));
                if cursor == 0 {
                    break;
                }
            }
            black_box(sum)
        })
    });
}

fn bench_config() -> Criterion {
    Criterion::default()
        .sample_size(12)
        .measurement_time(Duration::from_secs(5))
        .warm_up_time(Duration::from_secs(1))
}

criterion_group! {
    name = benches_insert;
    config = bench_config();
    targets = bench_add_fresh_100k, bench_add_presized_100k
}
criterion_group! {
    name = benches_ops;
    config = bench_config();
    targets = bench_remove_random_10k,
              bench_find_hit_10k,
              bench_find_miss_10k,
              bench_rehash_for,
              bench_sampling,
              bench_iter_and_scan
}
criterion_main!(benches_insert, benches_ops);
