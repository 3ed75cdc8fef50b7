use criterion::{BenchmarkId, Criterion, black_box, criterion_group, criterion_main};
use querykit::qb::{self, QueryBuilder};
use querykit::Record;

/// SELECT col0, col1, ... FROM t WHERE col0 = ? AND col1 = ? ...
fn build_select(n: usize) -> QueryBuilder<'static> {
    let columns: Vec<String> = (0..n).map(|i| format!("col{i}")).collect();
    let mut q = qb::table("t").select(columns);
    for i in 0..n {
        q = q.where_eq(&format!("col{i}"), i as i64);
    }
    q
}

fn bench_to_sql(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/to_sql");

    for n in [1, 5, 10, 50, 100] {
        let q = build_select(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &q, |b, q| {
            b.iter(|| black_box(q.to_sql()));
        });
    }

    group.finish();
}

fn bench_build_and_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/build_and_render");

    for n in [1, 5, 10, 50, 100] {
        group.bench_with_input(BenchmarkId::from_parameter(n), &n, |b, &n| {
            b.iter(|| black_box(build_select(n).build()));
        });
    }

    group.finish();
}

fn bench_where_in(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/where_in");

    for n in [5, 20, 100, 500] {
        let values: Vec<i64> = (0..n).collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &values, |b, values| {
            b.iter(|| black_box(qb::table("t").where_in("id", values.iter().copied()).build()));
        });
    }

    group.finish();
}

fn bench_multi_row_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("render/multi_row_insert");

    for n in [1, 10, 100] {
        let rows: Vec<Record> = (0..n)
            .map(|i| Record::new().set("id", i).set("name", format!("user{i}")))
            .collect();
        group.bench_with_input(BenchmarkId::from_parameter(n), &rows, |b, rows| {
            b.iter(|| black_box(qb::table("users").insert_sql(rows.clone())));
        });
    }

    group.finish();
}

fn bench_interpolate(c: &mut Criterion) {
    let q = build_select(50);
    c.bench_function("render/interpolate_50", |b| {
        b.iter(|| black_box(q.to_interpolated_sql()));
    });
}

criterion_group!(
    benches,
    bench_to_sql,
    bench_build_and_render,
    bench_where_in,
    bench_multi_row_insert,
    bench_interpolate
);
criterion_main!(benches);
