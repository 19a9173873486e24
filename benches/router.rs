use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use smartstep::{DiagramSnapshot, EdgeRouter, RouterConfig, render_svg};
use std::hint::black_box;

/// One container holding a grid of obstacle nodes between two endpoints,
/// so every obstacle lands in the edge's relevant subset.
fn scattered_snapshot_json(columns: usize, rows: usize) -> String {
    let width = 240.0 + columns as f32 * 120.0;
    let height = 80.0 + rows as f32 * 100.0;
    let mut nodes = vec![
        format!(
            "{{ \"id\": \"container\", \"x\": 0, \"y\": 0, \"width\": {width}, \"height\": {height} }}"
        ),
        format!(
            "{{ \"id\": \"src\", \"parent\": \"container\", \"x\": 20, \"y\": {}, \"width\": 80, \"height\": 50 }}",
            height / 2.0 - 25.0
        ),
        format!(
            "{{ \"id\": \"dst\", \"parent\": \"container\", \"x\": {}, \"y\": {}, \"width\": 80, \"height\": 50 }}",
            width - 100.0,
            height / 2.0 - 25.0
        ),
    ];
    for row in 0..rows {
        for column in 0..columns {
            nodes.push(format!(
                "{{ \"id\": \"ob{}_{}\", \"parent\": \"container\", \"x\": {}, \"y\": {}, \"width\": 60, \"height\": 40 }}",
                column,
                row,
                140.0 + column as f32 * 120.0,
                40.0 + row as f32 * 100.0
            ));
        }
    }
    format!(
        "{{ \"nodes\": [{}], \"edges\": [{{ \"source\": \"src\", \"target\": \"dst\", \"sourceSide\": \"right\", \"targetSide\": \"left\", \"markerEnd\": \"arrow\" }}] }}",
        nodes.join(", ")
    )
}

fn scattered_snapshot(columns: usize, rows: usize) -> DiagramSnapshot {
    DiagramSnapshot::from_json(&scattered_snapshot_json(columns, rows)).expect("snapshot build failed")
}

fn bench_resolve_cold(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_cold");
    for (columns, rows) in [(4usize, 3usize), (8, 6), (12, 9)] {
        let name = format!("grid_{}x{}", columns, rows);
        let snapshot = scattered_snapshot(columns, rows);
        let edge = snapshot.edges[0].clone();
        group.bench_with_input(BenchmarkId::from_parameter(name), &snapshot, |b, snap| {
            b.iter(|| {
                let mut router = EdgeRouter::new(RouterConfig::default());
                let geometry = router.resolve(black_box(snap), &edge).expect("resolve failed");
                black_box(geometry.svg_path.len());
            });
        });
    }
    group.finish();
}

fn bench_resolve_warm(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_warm");
    for (columns, rows) in [(4usize, 3usize), (8, 6), (12, 9)] {
        let name = format!("grid_{}x{}", columns, rows);
        let snapshot = scattered_snapshot(columns, rows);
        let edge = snapshot.edges[0].clone();
        let mut router = EdgeRouter::new(RouterConfig::default());
        router.resolve(&snapshot, &edge).expect("resolve failed");
        group.bench_with_input(BenchmarkId::from_parameter(name), &snapshot, |b, snap| {
            b.iter(|| {
                let geometry = router.resolve(black_box(snap), &edge).expect("resolve failed");
                black_box(geometry.routed);
            });
        });
    }
    group.finish();
}

fn bench_resolve_after_move(c: &mut Criterion) {
    let mut group = c.benchmark_group("resolve_after_move");
    for (columns, rows) in [(4usize, 3usize), (8, 6)] {
        let name = format!("grid_{}x{}", columns, rows);
        let mut snapshot = scattered_snapshot(columns, rows);
        let edge = snapshot.edges[0].clone();
        let mut router = EdgeRouter::new(RouterConfig::default());
        let mut nudged = false;
        group.bench_function(BenchmarkId::from_parameter(name), |b| {
            b.iter(|| {
                // Alternate one relevant obstacle between two positions so
                // every iteration invalidates the cached route.
                let x = if nudged { 140.0 } else { 150.0 };
                nudged = !nudged;
                snapshot.move_node("ob0_0", x, 40.0);
                let geometry = router
                    .resolve(black_box(&snapshot), &edge)
                    .expect("resolve failed");
                black_box(geometry.svg_path.len());
            });
        });
    }
    group.finish();
}

fn bench_render(c: &mut Criterion) {
    let mut group = c.benchmark_group("render_svg");
    let config = RouterConfig::default();
    for (columns, rows) in [(4usize, 3usize), (8, 6), (12, 9)] {
        let name = format!("grid_{}x{}", columns, rows);
        let snapshot = scattered_snapshot(columns, rows);
        let mut router = EdgeRouter::new(config.clone());
        let edges = router.resolve_all(&snapshot);
        group.bench_with_input(BenchmarkId::from_parameter(name), &edges, |b, resolved| {
            b.iter(|| {
                let svg = render_svg(&snapshot, black_box(resolved), &config);
                black_box(svg.len());
            });
        });
    }
    group.finish();
}

criterion_group!(
    name = benches;
    config = Criterion::default();
    targets = bench_resolve_cold, bench_resolve_warm, bench_resolve_after_move, bench_render
);
criterion_main!(benches);
