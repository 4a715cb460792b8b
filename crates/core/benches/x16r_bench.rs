//! Benchmarks for the chain and the nonce scanner

use std::sync::atomic::AtomicBool;
use std::sync::{Arc, Mutex};

use criterion::{BenchmarkId, Criterion, Throughput, black_box, criterion_group, criterion_main};
use x16r_core::{DigestSuite, HeaderTemplate, Scanner, Solution, Target, hash_header};

fn bench_hash_header(c: &mut Criterion) {
    let header = HeaderTemplate::default();

    c.bench_function("x16r_single", |b| {
        let mut nonce: u32 = 0;
        b.iter(|| {
            nonce = nonce.wrapping_add(1);
            hash_header(&DigestSuite, black_box(&header.with_nonce(nonce)))
        })
    });
}

fn bench_scan_widths(c: &mut Criterion) {
    let header = HeaderTemplate::default();
    let cancel = AtomicBool::new(false);
    let found = Mutex::new(Vec::<Solution>::new());
    let batch: u32 = 64;

    let mut group = c.benchmark_group("x16r_scan");
    group.throughput(Throughput::Elements(batch as u64));
    for lanes in [1usize, 4, 16] {
        let mut scanner = Scanner::new(Arc::new(DigestSuite), lanes).unwrap();
        group.bench_with_input(BenchmarkId::from_parameter(lanes), &lanes, |b, _| {
            let mut base: u32 = 0;
            b.iter(|| {
                let summary = scanner.scan(
                    &header,
                    base..=base + batch - 1,
                    &Target::BENCHMARK,
                    &cancel,
                    &found,
                );
                base = base.wrapping_add(batch) % (u32::MAX - batch);
                summary
            })
        });
    }
    group.finish();
}

criterion_group!(benches, bench_hash_header, bench_scan_widths);
criterion_main!(benches);
