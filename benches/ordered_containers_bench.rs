//! Criterion benchmarks for the ordered containers
//!
//! Measures the containers against their std counterparts and pins the
//! claims the implementations make: O(log n) range counting against a
//! full scan, queue throughput against `VecDeque`, and hashing rates.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use std::collections::{BTreeMap, VecDeque};

use ordena::{Deque, HashRing, OrderedMap, OrderedQueue, RingMember, SkipList};

const SMALL_SIZE: usize = 1_000;
const MEDIUM_SIZE: usize = 10_000;
const LARGE_SIZE: usize = 100_000;
const SIZES: &[usize] = &[SMALL_SIZE, MEDIUM_SIZE, LARGE_SIZE];

/// Deterministic key scatter, same multiplier the randomized tests use.
fn scattered_keys(n: usize) -> Vec<u64> {
    let mut state = 0x5eed_cafe_u64;
    (0..n)
        .map(|_| {
            state = state
                .wrapping_mul(6364136223846793005)
                .wrapping_add(1442695040888963407);
            state >> 16
        })
        .collect()
}

// =============================================================================
// ORDERED MAP BENCHMARKS
// =============================================================================

fn bench_ordered_map_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_map_insert");

    for &size in SIZES {
        let keys = scattered_keys(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("OrderedMap", size), &keys, |b, keys| {
            b.iter(|| {
                let mut map = OrderedMap::new();
                for &k in keys {
                    map.insert(black_box(k), k);
                }
                black_box(map)
            });
        });

        group.bench_with_input(BenchmarkId::new("std::BTreeMap", size), &keys, |b, keys| {
            b.iter(|| {
                let mut map = BTreeMap::new();
                for &k in keys {
                    map.insert(black_box(k), k);
                }
                black_box(map)
            });
        });
    }

    group.finish();
}

fn bench_ordered_map_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("ordered_map_lookup");

    for &size in SIZES {
        let keys = scattered_keys(size);
        let map: OrderedMap<u64, u64> = keys.iter().map(|&k| (k, k)).collect();
        let model: BTreeMap<u64, u64> = keys.iter().map(|&k| (k, k)).collect();
        group.throughput(Throughput::Elements(1000));

        group.bench_with_input(BenchmarkId::new("OrderedMap", size), &keys, |b, keys| {
            b.iter(|| {
                for k in keys.iter().step_by(keys.len() / 1000 + 1) {
                    black_box(map.get(black_box(k)));
                }
            });
        });

        group.bench_with_input(BenchmarkId::new("std::BTreeMap", size), &keys, |b, keys| {
            b.iter(|| {
                for k in keys.iter().step_by(keys.len() / 1000 + 1) {
                    black_box(model.get(black_box(k)));
                }
            });
        });
    }

    group.finish();
}

/// Subtree counts make view sizing O(log n); compare against counting by
/// iteration over the same window.
fn bench_range_count(c: &mut Criterion) {
    let mut group = c.benchmark_group("range_count");

    for &size in &[MEDIUM_SIZE, LARGE_SIZE] {
        let map: OrderedMap<u64, u64> = (0..size as u64).map(|k| (k, k)).collect();
        let model: BTreeMap<u64, u64> = (0..size as u64).map(|k| (k, k)).collect();
        // A window covering the middle tenth of the keys.
        let from = (size as u64) * 45 / 100;
        let to = (size as u64) * 55 / 100;
        let view = map.range(from, true, to, false).unwrap();

        group.bench_with_input(BenchmarkId::new("view_len", size), &size, |b, _| {
            b.iter(|| black_box(view.len(&map)));
        });

        group.bench_with_input(BenchmarkId::new("view_iter_count", size), &size, |b, _| {
            b.iter(|| black_box(view.iter(&map).count()));
        });

        group.bench_with_input(BenchmarkId::new("btree_range_count", size), &size, |b, _| {
            b.iter(|| black_box(model.range(from..to).count()));
        });
    }

    group.finish();
}

// =============================================================================
// SKIP LIST BENCHMARKS
// =============================================================================

fn bench_skip_list(c: &mut Criterion) {
    let mut group = c.benchmark_group("skip_list");

    for &size in &[SMALL_SIZE, MEDIUM_SIZE] {
        let keys = scattered_keys(size);
        group.throughput(Throughput::Elements(size as u64));

        group.bench_with_input(BenchmarkId::new("insert", size), &keys, |b, keys| {
            b.iter(|| {
                let mut list = SkipList::with_seed(42);
                for &k in keys {
                    list.insert(black_box(k), k);
                }
                black_box(list)
            });
        });

        let list: SkipList<u64, u64> = {
            let mut list = SkipList::with_seed(42);
            for &k in &keys {
                list.insert(k, k);
            }
            list
        };
        group.bench_with_input(BenchmarkId::new("lookup", size), &keys, |b, keys| {
            b.iter(|| {
                for k in keys.iter().take(1000) {
                    black_box(list.get(black_box(k)));
                }
            });
        });
    }

    group.finish();
}

// =============================================================================
// QUEUE AND DEQUE BENCHMARKS
// =============================================================================

fn bench_queue_throughput(c: &mut Criterion) {
    let mut group = c.benchmark_group("queue_throughput");
    group.throughput(Throughput::Elements(MEDIUM_SIZE as u64));

    group.bench_function("OrderedQueue", |b| {
        b.iter(|| {
            let mut queue = OrderedQueue::new();
            for i in 0..MEDIUM_SIZE as u64 {
                queue.enqueue(black_box(i));
                if i % 3 == 0 {
                    black_box(queue.try_dequeue());
                }
            }
            while let Some(v) = queue.try_dequeue() {
                black_box(v);
            }
        });
    });

    group.bench_function("std::VecDeque", |b| {
        b.iter(|| {
            let mut queue = VecDeque::new();
            for i in 0..MEDIUM_SIZE as u64 {
                queue.push_back(black_box(i));
                if i % 3 == 0 {
                    black_box(queue.pop_front());
                }
            }
            while let Some(v) = queue.pop_front() {
                black_box(v);
            }
        });
    });

    group.finish();
}

fn bench_deque_mixed_ends(c: &mut Criterion) {
    let mut group = c.benchmark_group("deque_mixed_ends");
    group.throughput(Throughput::Elements(MEDIUM_SIZE as u64));

    group.bench_function("Deque", |b| {
        b.iter(|| {
            let mut deque = Deque::new();
            for i in 0..MEDIUM_SIZE as u64 {
                if i % 2 == 0 {
                    deque.push_back(black_box(i));
                } else {
                    deque.push_front(black_box(i));
                }
                if i % 5 == 0 {
                    black_box(deque.try_pop_front());
                }
            }
            black_box(deque.len())
        });
    });

    group.bench_function("std::VecDeque", |b| {
        b.iter(|| {
            let mut deque = VecDeque::new();
            for i in 0..MEDIUM_SIZE as u64 {
                if i % 2 == 0 {
                    deque.push_back(black_box(i));
                } else {
                    deque.push_front(black_box(i));
                }
                if i % 5 == 0 {
                    black_box(deque.pop_front());
                }
            }
            black_box(deque.len())
        });
    });

    group.finish();
}

// =============================================================================
// HASHING BENCHMARKS
// =============================================================================

fn bench_jenkins_hash(c: &mut Criterion) {
    let mut group = c.benchmark_group("jenkins_hash");

    for &len in &[4usize, 24, 64, 1024] {
        let payload: Vec<u8> = (0..len as u32).map(|i| (i * 31) as u8).collect();
        group.throughput(Throughput::Bytes(len as u64));
        group.bench_with_input(BenchmarkId::new("hash_bytes", len), &payload, |b, payload| {
            b.iter(|| black_box(ordena::jenkins::hash_bytes(black_box(payload))));
        });
    }

    group.throughput(Throughput::Bytes(24));
    group.bench_function("hash_words", |b| {
        b.iter(|| {
            black_box(ordena::jenkins::hash_words(
                black_box(0x0123456789abcdef),
                black_box(0xfedcba9876543210),
                black_box(0x0f1e2d3c4b5a6978),
            ))
        });
    });

    group.finish();
}

#[derive(Debug, Clone, PartialEq)]
struct Silo(u32);

impl RingMember for Silo {
    fn uniform_hash(&self) -> u32 {
        self.0.wrapping_mul(0x9e3779b9)
    }
}

fn bench_hash_ring_lookup(c: &mut Criterion) {
    let mut group = c.benchmark_group("hash_ring_lookup");

    for &members in &[8usize, 100, 1000] {
        let ring: HashRing<Silo> = (0..members as u32).map(Silo).collect();
        group.throughput(Throughput::Elements(1000));
        group.bench_with_input(BenchmarkId::new("responsible_for", members), &ring, |b, ring| {
            b.iter(|| {
                for q in (0..1000u32).map(|q| q.wrapping_mul(0x1234567)) {
                    black_box(ring.responsible_for(black_box(q)));
                }
            });
        });
    }

    group.finish();
}

criterion_group!(
    benches,
    bench_ordered_map_insert,
    bench_ordered_map_lookup,
    bench_range_count,
    bench_skip_list,
    bench_queue_throughput,
    bench_deque_mixed_ends,
    bench_jenkins_hash,
    bench_hash_ring_lookup,
);
criterion_main!(benches);
