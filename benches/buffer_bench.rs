//! Benchmarks for buffer allocation and shape queries

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use stridebuf::{Buffer, ElementType};

/// Benchmark allocate + release for varying buffer sizes
fn bench_allocate_release(c: &mut Criterion) {
    let mut group = c.benchmark_group("allocate_release");

    for &side in &[1, 64, 256, 1024] {
        group.throughput(Throughput::Bytes((side * side) as u64));
        group.bench_function(format!("{}x{}_u8", side, side), |b| {
            b.iter(|| {
                let mut buf = Buffer::new(ElementType::UINT8, &[side, side]).unwrap();
                black_box(buf.raw_handle());
                buf.release();
            })
        });
    }

    group.finish();
}

/// Benchmark the checked per-dimension path
fn bench_queries(c: &mut Criterion) {
    let buf = Buffer::new(ElementType::FLOAT32, &[640, 480, 3]).unwrap();

    c.bench_function("extent_checked", |b| {
        b.iter(|| {
            let mut total = 0i64;
            for i in 0..buf.dimensions() {
                total += buf.extent(black_box(i)).unwrap() as i64;
            }
            black_box(total)
        })
    });

    c.bench_function("extent_out_of_bounds", |b| {
        b.iter(|| black_box(buf.extent(black_box(3)).is_err()))
    });

    c.bench_function("read_only_data", |b| {
        b.iter(|| black_box(buf.read_only_data().len()))
    });
}

criterion_group!(benches, bench_allocate_release, bench_queries);
criterion_main!(benches);
