//! Properties every geodesic distance computation must satisfy.

use std::cmp::Reverse;
use std::collections::{BinaryHeap, HashMap};

use approx::assert_abs_diff_eq;
use gdist::prelude::*;
use nalgebra::Point3;

/// Grid of `n x n` vertices with the given spacing, lifted by `height`.
fn heightfield(n: usize, spacing: f64, height: impl Fn(f64, f64) -> f64) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut vertices = Vec::with_capacity(n * n);
    let mut faces = Vec::with_capacity(2 * (n - 1) * (n - 1));

    for j in 0..n {
        for i in 0..n {
            let (x, y) = (i as f64 * spacing, j as f64 * spacing);
            vertices.push(Point3::new(x, y, height(x, y)));
        }
    }
    for j in 0..n - 1 {
        for i in 0..n - 1 {
            let v00 = j * n + i;
            let v10 = v00 + 1;
            let v01 = v00 + n;
            let v11 = v01 + 1;
            // Alternate the diagonal so the mesh has no preferred direction
            if (i + j) % 2 == 0 {
                faces.push([v00, v10, v11]);
                faces.push([v00, v11, v01]);
            } else {
                faces.push([v00, v10, v01]);
                faces.push([v10, v11, v01]);
            }
        }
    }
    (vertices, faces)
}

fn flat_grid() -> GeodesicMesh {
    let (vertices, faces) = heightfield(11, 0.2, |_, _| 0.0);
    build_from_triangles(&vertices, &faces).unwrap()
}

fn bumpy_mesh() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    heightfield(9, 0.25, |x, y| 0.3 * (2.5 * x).sin() * (1.7 * y + 0.4).cos())
}

/// Split every triangle into four at its edge midpoints.
///
/// Original vertices keep their indices; midpoints are appended.
fn subdivide(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut vertices = vertices.to_vec();
    let mut midpoints: HashMap<(usize, usize), usize> = HashMap::new();
    let mut midpoint = |a: usize, b: usize, vertices: &mut Vec<Point3<f64>>| {
        *midpoints.entry((a.min(b), a.max(b))).or_insert_with(|| {
            let mid = nalgebra::center(&vertices[a], &vertices[b]);
            vertices.push(mid);
            vertices.len() - 1
        })
    };

    let mut refined = Vec::with_capacity(4 * faces.len());
    for &[a, b, c] in faces {
        let ab = midpoint(a, b, &mut vertices);
        let bc = midpoint(b, c, &mut vertices);
        let ca = midpoint(c, a, &mut vertices);
        refined.extend([[a, ab, ca], [ab, b, bc], [ca, bc, c], [ab, bc, ca]]);
    }
    (vertices, refined)
}

/// Twice-subdivided icosahedron on the unit sphere (162 vertices).
fn icosphere() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let t = (1.0 + 5.0_f64.sqrt()) / 2.0;
    let vertices = vec![
        Point3::new(-1.0, t, 0.0),
        Point3::new(1.0, t, 0.0),
        Point3::new(-1.0, -t, 0.0),
        Point3::new(1.0, -t, 0.0),
        Point3::new(0.0, -1.0, t),
        Point3::new(0.0, 1.0, t),
        Point3::new(0.0, -1.0, -t),
        Point3::new(0.0, 1.0, -t),
        Point3::new(t, 0.0, -1.0),
        Point3::new(t, 0.0, 1.0),
        Point3::new(-t, 0.0, -1.0),
        Point3::new(-t, 0.0, 1.0),
    ];
    let faces = vec![
        [0, 11, 5],
        [0, 5, 1],
        [0, 1, 7],
        [0, 7, 10],
        [0, 10, 11],
        [1, 5, 9],
        [5, 11, 4],
        [11, 10, 2],
        [10, 7, 6],
        [7, 1, 8],
        [3, 9, 4],
        [3, 4, 2],
        [3, 2, 6],
        [3, 6, 8],
        [3, 8, 9],
        [4, 9, 5],
        [2, 4, 11],
        [6, 2, 10],
        [8, 6, 7],
        [9, 8, 1],
    ];

    let (vertices, faces) = subdivide(&vertices, &faces);
    let (vertices, faces) = subdivide(&vertices, &faces);
    let vertices = vertices.iter().map(|p| Point3::from(p.coords.normalize())).collect();
    (vertices, faces)
}

/// Closed non-convex surface: an icosphere with spikes and dents.
fn hedgehog() -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let (mut vertices, faces) = icosphere();
    for (i, p) in vertices.iter_mut().enumerate() {
        if i % 7 == 0 {
            *p = Point3::from(p.coords * 1.6);
        }
        if i % 5 == 0 {
            *p = Point3::from(p.coords * 0.8);
        }
    }
    (vertices, faces)
}

/// Shortest paths along mesh edges only.
fn edge_graph_distances(mesh: &GeodesicMesh, source: usize) -> Vec<f64> {
    let mut adjacency = vec![Vec::new(); mesh.num_vertices()];
    for e in mesh.edge_ids() {
        let edge = mesh.edge(e);
        let [a, b] = edge.vertices.map(|v| v.index());
        adjacency[a].push((b, edge.length));
        adjacency[b].push((a, edge.length));
    }

    let mut dist = vec![f64::INFINITY; mesh.num_vertices()];
    let mut heap = BinaryHeap::new();
    dist[source] = 0.0;
    heap.push(Reverse((0u64, source)));
    while let Some(Reverse((bits, v))) = heap.pop() {
        let d = f64::from_bits(bits);
        if d > dist[v] {
            continue;
        }
        for &(w, len) in &adjacency[v] {
            let nd = d + len;
            if nd < dist[w] {
                dist[w] = nd;
                // Non-negative floats order like their bit patterns
                heap.push(Reverse((nd.to_bits(), w)));
            }
        }
    }
    dist
}

#[test]
fn flat_grid_neighbor_distance() {
    let mesh = flat_grid();
    assert_eq!(mesh.num_vertices(), 121);
    assert_eq!(mesh.num_faces(), 200);

    let d = compute_distances(&mesh, &[1], &[2], DEFAULT_MAX_DISTANCE).unwrap();
    assert_abs_diff_eq!(d[0], 0.2, epsilon = 1e-6);
}

#[test]
fn flat_grid_matrix_respects_cutoff_and_symmetry() {
    let mesh = flat_grid();
    let matrix = LocalMatrixBuilder::new(&mesh).with_max_distance(0.3).build().unwrap();
    assert!(!matrix.is_empty());
    assert!(matrix.values().iter().all(|&d| d > 0.0 && d <= 0.3));

    let csc = matrix.to_csc().unwrap();
    assert_eq!((csc.nrows(), csc.ncols()), (121, 121));
    assert!(csc.max_asymmetry() < 1e-9);
}

#[test]
fn flat_grid_matches_euclidean() {
    let (vertices, faces) = heightfield(11, 0.2, |_, _| 0.0);
    let mesh = build_from_triangles(&vertices, &faces).unwrap();
    let targets: Vec<usize> = (0..vertices.len()).collect();

    for source in [0, 27, 60] {
        let d = compute_distances(&mesh, &[source], &targets, DEFAULT_MAX_DISTANCE).unwrap();
        for (t, &dt) in d.iter().enumerate() {
            let euclidean = (vertices[t] - vertices[source]).norm();
            assert_abs_diff_eq!(dt, euclidean, epsilon = 1e-9);
        }
    }
}

#[test]
fn bumpy_distances_are_symmetric() {
    let (vertices, faces) = bumpy_mesh();
    let mesh = build_from_triangles(&vertices, &faces).unwrap();
    let n = mesh.num_vertices();
    let all: Vec<usize> = (0..n).collect();

    let rows: Vec<Vec<f64>> = (0..n)
        .map(|s| compute_distances(&mesh, &[s], &all, DEFAULT_MAX_DISTANCE).unwrap())
        .collect();
    for i in 0..n {
        assert_eq!(rows[i][i], 0.0);
        for j in 0..i {
            assert_abs_diff_eq!(rows[i][j], rows[j][i], epsilon = 1e-9);
        }
    }
}

#[test]
fn bumpy_distances_are_bounded() {
    let (vertices, faces) = bumpy_mesh();
    let mesh = build_from_triangles(&vertices, &faces).unwrap();
    let all: Vec<usize> = (0..mesh.num_vertices()).collect();

    for source in [0, 13, 40, 80] {
        let d = compute_distances(&mesh, &[source], &all, DEFAULT_MAX_DISTANCE).unwrap();
        let graph = edge_graph_distances(&mesh, source);
        for t in 0..all.len() {
            let straight = (vertices[t] - vertices[source]).norm();
            assert!(d[t] >= straight - 1e-9, "{} -> {}: {} < {}", source, t, d[t], straight);
            assert!(d[t] <= graph[t] + 1e-9, "{} -> {}: {} > {}", source, t, d[t], graph[t]);
        }
    }
}

#[test]
fn matrix_thresholds_are_nested() {
    let (vertices, faces) = bumpy_mesh();
    let mesh = build_from_triangles(&vertices, &faces).unwrap();

    let small = LocalMatrixBuilder::new(&mesh).with_max_distance(0.4).build().unwrap();
    let large = LocalMatrixBuilder::new(&mesh).with_max_distance(0.7).build().unwrap();
    assert!(small.len() < large.len());
    assert!(large.values().iter().all(|&d| d <= 0.7));

    let large = large.to_csc().unwrap();
    for (i, j, d) in small.triplets() {
        assert!(d <= 0.4);
        let wider = large.get(i, j).unwrap();
        assert_abs_diff_eq!(wider, d, epsilon = 1e-9);
    }
}

#[test]
fn rebuild_is_bit_identical() {
    let (vertices, faces) = bumpy_mesh();
    let a = build_from_triangles(&vertices, &faces).unwrap();
    let b = build_from_triangles(&vertices, &faces).unwrap();

    let ma = LocalMatrixBuilder::new(&a).with_max_distance(0.5).build().unwrap();
    let mb = LocalMatrixBuilder::new(&b).with_max_distance(0.5).build().unwrap();
    assert_eq!(ma.rows(), mb.rows());
    assert_eq!(ma.cols(), mb.cols());
    let bits = |m: &LocalMatrix| m.values().iter().map(|d| d.to_bits()).collect::<Vec<_>>();
    assert_eq!(bits(&ma), bits(&mb));
}

#[test]
fn multiple_sources_take_the_minimum() {
    let (vertices, faces) = bumpy_mesh();
    let mesh = build_from_triangles(&vertices, &faces).unwrap();
    let all: Vec<usize> = (0..mesh.num_vertices()).collect();

    let d0 = compute_distances(&mesh, &[0], &all, DEFAULT_MAX_DISTANCE).unwrap();
    let d1 = compute_distances(&mesh, &[80], &all, DEFAULT_MAX_DISTANCE).unwrap();
    let both = compute_distances(&mesh, &[0, 80], &all, DEFAULT_MAX_DISTANCE).unwrap();
    for t in 0..all.len() {
        assert_abs_diff_eq!(both[t], d0[t].min(d1[t]), epsilon = 1e-9);
    }
}

#[test]
fn hedgehog_distances_are_symmetric() {
    let (vertices, faces) = hedgehog();
    let mesh = build_from_triangles(&vertices, &faces).unwrap();
    assert_eq!(mesh.num_vertices(), 162);
    assert_eq!(mesh.num_faces(), 320);
    assert_eq!(mesh.num_boundary_edges(), 0);

    let n = mesh.num_vertices();
    let all: Vec<usize> = (0..n).collect();
    let rows: Vec<Vec<f64>> = (0..n)
        .map(|s| compute_distances(&mesh, &[s], &all, DEFAULT_MAX_DISTANCE).unwrap())
        .collect();
    for i in 0..n {
        assert_eq!(rows[i][i], 0.0);
        for j in 0..i {
            assert_abs_diff_eq!(rows[i][j], rows[j][i], epsilon = 1e-9);
        }
    }

    // Spot-check the triangle inequality through a few intermediate vertices
    for k in [0, 35, 81, 140] {
        for i in 0..n {
            for j in 0..n {
                assert!(rows[i][j] <= rows[i][k] + rows[k][j] + 1e-9);
            }
        }
    }
}

#[test]
fn hedgehog_matrix_respects_cutoff_and_symmetry() {
    let (vertices, faces) = hedgehog();
    let mesh = build_from_triangles(&vertices, &faces).unwrap();

    let matrix = LocalMatrixBuilder::new(&mesh).with_max_distance(1.45).build().unwrap();
    assert!(!matrix.is_empty());
    assert!(matrix.values().iter().all(|&d| d > 0.0 && d <= 1.45));

    let csc = matrix.to_csc().unwrap();
    assert_eq!(csc.nnz(), matrix.len());
    assert!(csc.max_asymmetry() < 1e-6);
}

#[test]
fn flat_subdivision_preserves_distances() {
    let (vertices, faces) = hedgehog();
    let coarse = build_from_triangles(&vertices, &faces).unwrap();
    let (fine_vertices, fine_faces) = subdivide(&vertices, &faces);
    let fine = build_from_triangles(&fine_vertices, &fine_faces).unwrap();
    assert_eq!(fine.num_faces(), 4 * coarse.num_faces());

    // Same surface, so distances between the original vertices must not move
    let originals: Vec<usize> = (0..coarse.num_vertices()).collect();
    for source in [0, 7, 50, 123] {
        let d_coarse = compute_distances(&coarse, &[source], &originals, DEFAULT_MAX_DISTANCE).unwrap();
        let d_fine = compute_distances(&fine, &[source], &originals, DEFAULT_MAX_DISTANCE).unwrap();
        for (a, b) in d_coarse.iter().zip(&d_fine) {
            assert_abs_diff_eq!(*a, *b, epsilon = 1e-9);
        }
    }
}
