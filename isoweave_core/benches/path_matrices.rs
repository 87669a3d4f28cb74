// Benchmarks for the all-pairs solver and level generation.
//
// `floyd_warshall` runs once per tentative placement on a 4n-node graph, so
// its cost dominates generation. Run with `cargo bench -p isoweave_core`.

use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use isoweave_core::config::GridConfig;
use isoweave_core::grid::Grid;
use isoweave_core::pathfinding::{EdgeMatrix, floyd_warshall};
use std::hint::black_box;

/// Ring with a chord every few nodes, roughly the density of a level's
/// combined graph.
fn ring_with_chords(n: usize) -> EdgeMatrix {
    let mut edges = EdgeMatrix::new(n);
    for i in 0..n {
        edges.add_edge(i, (i + 1) % n);
        edges.add_edge((i + 1) % n, i);
        if i % 4 == 0 {
            edges.add_edge(i, (i + n / 2) % n);
        }
    }
    edges
}

fn bench_floyd_warshall(c: &mut Criterion) {
    let mut group = c.benchmark_group("floyd_warshall");
    for n in [24, 48, 96] {
        let edges = ring_with_chords(n);
        group.bench_with_input(BenchmarkId::from_parameter(n), &edges, |b, edges| {
            b.iter(|| floyd_warshall(black_box(edges)))
        });
    }
    group.finish();
}

fn bench_generation(c: &mut Criterion) {
    c.bench_function("generate_level_0", |b| {
        b.iter(|| Grid::generate(GridConfig::default(), black_box(42)))
    });

    c.bench_function("advance_to_level_4", |b| {
        b.iter(|| {
            let mut grid = Grid::generate(GridConfig::default(), black_box(7)).ok()?;
            for _ in 0..4 {
                grid.advance_level();
            }
            Some(grid.cell_count())
        })
    });
}

criterion_group!(benches, bench_floyd_warshall, bench_generation);
criterion_main!(benches);
