//! Benchmarks for statement extraction and dialect rewriting.

use criterion::{criterion_group, criterion_main, Criterion, Throughput};
use mssql2pg::rewriter::{IdentifierCase, Rewriter};
use mssql2pg::scanner::{extract, ExtractStrategy};
use mssql2pg::tables::TableMapping;
use std::hint::black_box;

/// Generate a T-SQL export in the SSMS one-statement-per-batch shape.
fn generate_export(rows: usize) -> String {
    let mut data = String::new();
    data.push_str("USE [TbmDb]\nGO\nSET IDENTITY_INSERT [dbo].[Teams] ON \nGO\n");
    for r in 0..rows {
        data.push_str(&format!(
            "INSERT [dbo].[Teams] ([TeamID], [TeamName], [CreatedAt]) VALUES ({r}, N'Team {r}', CAST(N'2024-01-01T00:00:00' AS DateTime2))\nGO\n"
        ));
    }
    data.push_str("SET IDENTITY_INSERT [dbo].[Teams] OFF\nGO\n");
    data
}

fn bench_rewrite(c: &mut Criterion) {
    let stmt = "INSERT [dbo].[Teams] ([TeamID], [TeamName], [CreatedAt]) VALUES (1, N'Kitchen', CAST(N'2024-01-01T00:00:00' AS DateTime2))";
    let mut group = c.benchmark_group("rewrite");
    group.throughput(Throughput::Bytes(stmt.len() as u64));

    let quoted = Rewriter::new(IdentifierCase::Quoted);
    group.bench_function("quoted", |b| b.iter(|| quoted.rewrite(black_box(stmt))));

    let snake = Rewriter::new(IdentifierCase::Snake);
    group.bench_function("snake", |b| b.iter(|| snake.rewrite(black_box(stmt))));

    group.finish();
}

fn bench_extract(c: &mut Criterion) {
    let export = generate_export(1000);
    let tables = TableMapping::default();
    let mut group = c.benchmark_group("extract");
    group.throughput(Throughput::Bytes(export.len() as u64));

    group.bench_function("document", |b| {
        b.iter(|| extract(black_box(&export), &tables, ExtractStrategy::WholeDocument))
    });
    group.bench_function("line", |b| {
        b.iter(|| extract(black_box(&export), &tables, ExtractStrategy::LineOriented))
    });

    group.finish();
}

criterion_group!(benches, bench_rewrite, bench_extract);
criterion_main!(benches);
