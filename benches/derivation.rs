//! Benchmarks for mid-price derivation and output.

use criterion::{black_box, criterion_group, criterion_main, Criterion, Throughput};
use lob_midprice::{mid_price_series, mid_prices, render_series, LobMatrix, SeriesFormat};

fn create_test_matrix(rows: usize, depth: usize) -> LobMatrix {
    let base_price: i64 = 75_000;
    let mut matrix = LobMatrix::with_capacity(depth, rows).unwrap();

    for i in 0..rows {
        let drift = ((i % 200) as i64) - 100;
        let mut row = Vec::with_capacity(1 + 4 * depth);
        row.push(1_584_403_200_000 + i as i64);
        for level in 0..depth as i64 {
            row.push(base_price + drift - level); // bid price
            row.push(((i + 1) % 50) as i64 + 1); // bid size
            row.push(base_price + drift + 1 + level); // ask price
            row.push(((i + 7) % 50) as i64 + 1); // ask size
        }
        matrix.push_row(&row).unwrap();
    }

    matrix
}

fn bench_derivation(c: &mut Criterion) {
    let matrix = create_test_matrix(100_000, 5);

    let mut group = c.benchmark_group("derivation");
    group.throughput(Throughput::Elements(matrix.n_rows() as u64));

    group.bench_function("mid_prices", |b| {
        b.iter(|| black_box(mid_prices(&matrix)))
    });

    group.bench_function("mid_price_series", |b| {
        b.iter(|| black_box(mid_price_series(&matrix)))
    });

    group.bench_function("truncate_depth_1", |b| {
        b.iter(|| black_box(matrix.truncate_depth(1)))
    });

    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let series = mid_price_series(&create_test_matrix(10_000, 1)).unwrap();

    let mut group = c.benchmark_group("render");
    group.throughput(Throughput::Elements(series.len() as u64));

    group.bench_function("csv", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(256 * 1024);
            render_series(&series, SeriesFormat::Csv, &mut out).unwrap();
            black_box(out)
        })
    });

    group.bench_function("json", |b| {
        b.iter(|| {
            let mut out = Vec::with_capacity(256 * 1024);
            render_series(&series, SeriesFormat::Json, &mut out).unwrap();
            black_box(out)
        })
    });

    group.finish();
}

criterion_group!(benches, bench_derivation, bench_render);
criterion_main!(benches);
