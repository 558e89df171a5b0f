//! Benchmarks for geodesic distance computation.

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use gdist::prelude::*;
use nalgebra::Point3;

/// Gently curved grid so that windows actually bend at vertices.
fn create_bumpy_grid(n: usize) -> GeodesicMesh {
    let mut vertices = Vec::with_capacity((n + 1) * (n + 1));
    let mut faces = Vec::with_capacity(n * n * 2);

    for j in 0..=n {
        for i in 0..=n {
            let (x, y) = (i as f64 / n as f64, j as f64 / n as f64);
            let z = 0.1 * (3.0 * x).sin() * (2.0 * y).cos();
            vertices.push(Point3::new(x, y, z));
        }
    }

    for j in 0..n {
        for i in 0..n {
            let v00 = j * (n + 1) + i;
            let v10 = v00 + 1;
            let v01 = v00 + (n + 1);
            let v11 = v01 + 1;

            faces.push([v00, v10, v11]);
            faces.push([v00, v11, v01]);
        }
    }

    build_from_triangles(&vertices, &faces).unwrap()
}

fn bench_mesh_construction(c: &mut Criterion) {
    let mesh = create_bumpy_grid(100);
    let (vertices, faces) = to_face_vertex(&mesh);

    c.bench_function("build_grid_100x100", |b| {
        b.iter(|| build_from_triangles(black_box(&vertices), black_box(&faces)).unwrap());
    });
}

fn bench_distance_query(c: &mut Criterion) {
    let mesh = create_bumpy_grid(60);
    let center = 30 * 61 + 30;
    let all: Vec<usize> = (0..mesh.num_vertices()).collect();

    c.bench_function("single_source_all_targets_60x60", |b| {
        let mut query = DistanceQuery::new(&mesh);
        b.iter(|| query.query(&[center], &all, DEFAULT_MAX_DISTANCE).unwrap());
    });

    c.bench_function("single_source_one_target_60x60", |b| {
        let mut query = DistanceQuery::new(&mesh);
        b.iter(|| query.query(&[center], &[center + 5], DEFAULT_MAX_DISTANCE).unwrap());
    });
}

fn bench_local_matrix(c: &mut Criterion) {
    let mesh = create_bumpy_grid(30);
    let mut group = c.benchmark_group("local_matrix_30x30");
    group.sample_size(10);

    for radius in [0.1, 0.2] {
        group.bench_with_input(BenchmarkId::new("parallel", radius), &radius, |b, &r| {
            b.iter(|| LocalMatrixBuilder::new(&mesh).with_max_distance(r).build().unwrap());
        });
        group.bench_with_input(BenchmarkId::new("sequential", radius), &radius, |b, &r| {
            b.iter(|| {
                LocalMatrixBuilder::new(&mesh)
                    .with_max_distance(r)
                    .with_parallel(false)
                    .build()
                    .unwrap()
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_mesh_construction, bench_distance_query, bench_local_matrix);
criterion_main!(benches);
