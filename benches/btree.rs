//! Index benchmarks: insert throughput in both key orders, and range scan
//! throughput over a populated tree.

use std::hint::black_box;
use std::path::Path;
use std::sync::Arc;

use criterion::{criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use tempfile::tempdir;

use taproot::{BTreeIndex, BufferPool, Datatype, HeapFile, Operator, RecordId};

fn open_index(dir: &Path) -> BTreeIndex {
    HeapFile::create(dir.join("rel"), 8).unwrap();
    let pool = Arc::new(BufferPool::new(256).unwrap());
    BTreeIndex::open(dir, "rel", 0, Datatype::Integer, pool)
        .unwrap()
        .0
}

fn rid(key: i32) -> RecordId {
    RecordId::new(key as u32, key as u16)
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_insert");

    for count in [1_000, 10_000].iter() {
        group.throughput(Throughput::Elements(*count as u64));

        group.bench_with_input(BenchmarkId::new("ascending", count), count, |b, &count| {
            b.iter_with_setup(
                || {
                    let dir = tempdir().unwrap();
                    let index = open_index(dir.path());
                    (dir, index)
                },
                |(dir, mut index)| {
                    for k in 0..count {
                        index.insert(k, rid(k)).unwrap();
                    }
                    (dir, index)
                },
            );
        });

        group.bench_with_input(BenchmarkId::new("descending", count), count, |b, &count| {
            b.iter_with_setup(
                || {
                    let dir = tempdir().unwrap();
                    let index = open_index(dir.path());
                    (dir, index)
                },
                |(dir, mut index)| {
                    for k in (0..count).rev() {
                        index.insert(k, rid(k)).unwrap();
                    }
                    (dir, index)
                },
            );
        });
    }

    group.finish();
}

fn bench_scan(c: &mut Criterion) {
    let mut group = c.benchmark_group("index_scan");

    for count in [10_000].iter() {
        let dir = tempdir().unwrap();
        let mut index = open_index(dir.path());
        for k in 0..*count {
            index.insert(k, rid(k)).unwrap();
        }

        group.throughput(Throughput::Elements(*count as u64));
        group.bench_with_input(BenchmarkId::new("full_range", count), count, |b, &count| {
            b.iter(|| {
                index
                    .start_scan(0, Operator::Ge, count, Operator::Le)
                    .unwrap();
                let mut scanned = 0u32;
                while let Ok(rid) = index.scan_next() {
                    black_box(rid);
                    scanned += 1;
                }
                index.end_scan().unwrap();
                scanned
            });
        });

        drop(dir);
    }

    group.finish();
}

criterion_group!(benches, bench_insert, bench_scan);
criterion_main!(benches);
