//! Mesh construction and validation.
//!
//! This module builds a [`GeodesicMesh`] from face-vertex lists, either as
//! point/triangle arrays or as the flat `3·V` / `3·F` buffers handed over by
//! foreign callers. Construction validates the input, skips zero-area
//! triangles, and derives the edge table used for unfolding.

use std::collections::HashMap;

use nalgebra::Point3;

use super::geodesic_mesh::{Edge, EdgeSide, Face, GeodesicMesh, Vertex};
use super::index::{EdgeId, FaceId, VertexId, MAX_INDEX_COUNT};
use crate::error::{GeodesicError, Result};

/// Twice-area threshold, relative to the squared longest edge, below which
/// a triangle counts as degenerate.
const DEGENERATE_RATIO: f64 = 1e-12;

/// Build a geodesic mesh from vertex positions and triangles.
///
/// # Arguments
/// * `vertices` - List of vertex positions
/// * `faces` - List of triangles, each as `[v0, v1, v2]` indices
///
/// # Errors
/// - [`GeodesicError::EmptyInput`] if there are no vertices or no triangles
/// - [`GeodesicError::InvalidMesh`] for non-finite coordinates
/// - [`GeodesicError::InvalidVertexIndex`] for out-of-range triangle indices
/// - [`GeodesicError::NonManifoldEdge`] if an edge has more than two triangles
/// - [`GeodesicError::DegenerateGeometry`] if every triangle has zero area
///
/// Individual zero-area triangles are skipped (treated as holes) and listed
/// in [`GeodesicMesh::degenerate_faces`].
///
/// # Example
/// ```
/// use gdist::mesh::build_from_triangles;
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(0.5, 1.0, 0.0),
/// ];
/// let faces = vec![[0, 1, 2]];
///
/// let mesh = build_from_triangles(&vertices, &faces).unwrap();
/// assert_eq!(mesh.num_vertices(), 3);
/// assert_eq!(mesh.num_edges(), 3);
/// ```
pub fn build_from_triangles(vertices: &[Point3<f64>], faces: &[[usize; 3]]) -> Result<GeodesicMesh> {
    if vertices.is_empty() {
        return Err(GeodesicError::EmptyInput { what: "vertices" });
    }
    if faces.is_empty() {
        return Err(GeodesicError::EmptyInput { what: "triangles" });
    }
    check_index_capacity(vertices.len(), faces.len())?;

    for (vi, p) in vertices.iter().enumerate() {
        if !(p.x.is_finite() && p.y.is_finite() && p.z.is_finite()) {
            return Err(GeodesicError::invalid_mesh(format!(
                "vertex {} has a non-finite coordinate",
                vi
            )));
        }
    }

    // Validate vertex indices before touching any geometry
    for (fi, face) in faces.iter().enumerate() {
        for &vi in face {
            if vi >= vertices.len() {
                return Err(GeodesicError::InvalidVertexIndex { face: fi, vertex: vi });
            }
        }
    }

    let mut mesh = GeodesicMesh {
        vertices: vertices.iter().map(|&p| Vertex::new(p)).collect(),
        edges: Vec::new(),
        faces: Vec::with_capacity(faces.len()),
        degenerate_faces: Vec::new(),
    };

    // Map from sorted vertex pair to edge ID
    let mut edge_map: HashMap<(usize, usize), EdgeId> = HashMap::with_capacity(faces.len() * 3 / 2);

    for (fi, tri) in faces.iter().enumerate() {
        let Some(angles) = triangle_angles(vertices, tri) else {
            log::warn!("skipping degenerate triangle {} {:?}", fi, tri);
            mesh.degenerate_faces.push(fi);
            continue;
        };

        let face_id = FaceId::new(mesh.faces.len());
        let mut edges = [EdgeId::invalid(); 3];

        for k in 0..3 {
            let (a, b) = (tri[k], tri[(k + 1) % 3]);
            let key = (a.min(b), a.max(b));
            let edge_id = *edge_map.entry(key).or_insert_with(|| {
                let id = EdgeId::new(mesh.edges.len());
                let length = (vertices[key.1] - vertices[key.0]).norm();
                mesh.edges.push(Edge::new(VertexId::new(key.0), VertexId::new(key.1), length));
                id
            });

            let edge = &mut mesh.edges[edge_id.index()];
            let slot = edge.face_count();
            if slot == 2 {
                return Err(GeodesicError::NonManifoldEdge {
                    v0: key.0,
                    v1: key.1,
                    faces: 3,
                });
            }

            // Corner k sits at `a`, corner k+1 at `b`, corner k+2 is the apex
            let (angle_a, angle_b) = (angles[k], angles[(k + 1) % 3]);
            let (angle_v0, angle_v1) = if a == key.0 { (angle_a, angle_b) } else { (angle_b, angle_a) };
            let opposite = tri[(k + 2) % 3];
            let side_len = (vertices[opposite] - vertices[key.0]).norm();

            edge.sides[slot] = EdgeSide {
                face: face_id,
                opposite: VertexId::new(opposite),
                angles: [angle_v0, angle_v1],
                apex: [side_len * angle_v0.cos(), side_len * angle_v0.sin()],
            };
            edges[k] = edge_id;
        }

        for k in 0..3 {
            let vertex = &mut mesh.vertices[tri[k]];
            vertex.faces.push(face_id);
            vertex.total_angle += angles[k];
        }

        mesh.faces.push(Face {
            vertices: [VertexId::new(tri[0]), VertexId::new(tri[1]), VertexId::new(tri[2])],
            edges,
            angles,
            source_index: fi,
        });
    }

    if mesh.faces.is_empty() {
        return Err(GeodesicError::DegenerateGeometry {
            degenerate: mesh.degenerate_faces.len(),
            total: faces.len(),
        });
    }
    if !mesh.degenerate_faces.is_empty() {
        log::warn!(
            "{} of {} triangles are degenerate and were skipped",
            mesh.degenerate_faces.len(),
            faces.len()
        );
    }

    mark_boundary_vertices(&mut mesh);

    Ok(mesh)
}

/// Build a geodesic mesh from flat coordinate and index buffers.
///
/// `vertices` holds `3·V` coordinates (`x0 y0 z0 x1 ...`) and `triangles`
/// holds `3·F` vertex indices.
///
/// # Example
/// ```
/// use gdist::mesh::build_from_flat;
///
/// let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
/// let triangles = [0, 1, 2];
/// let mesh = build_from_flat(&vertices, &triangles).unwrap();
/// assert_eq!(mesh.num_faces(), 1);
/// ```
pub fn build_from_flat(vertices: &[f64], triangles: &[usize]) -> Result<GeodesicMesh> {
    if vertices.len() % 3 != 0 {
        return Err(GeodesicError::invalid_mesh(format!(
            "vertex buffer length {} is not a multiple of 3",
            vertices.len()
        )));
    }
    if triangles.len() % 3 != 0 {
        return Err(GeodesicError::invalid_mesh(format!(
            "triangle buffer length {} is not a multiple of 3",
            triangles.len()
        )));
    }

    let points: Vec<Point3<f64>> = vertices
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect();
    let faces: Vec<[usize; 3]> = triangles
        .chunks_exact(3)
        .map(|c| [c[0], c[1], c[2]])
        .collect();

    build_from_triangles(&points, &faces)
}

/// Reject meshes whose vertices, faces or edges would not fit in 32-bit ids.
///
/// A mesh has at most three edges per face, so bounding `3 * faces` bounds
/// the edge count too.
fn check_index_capacity(num_vertices: usize, num_faces: usize) -> Result<()> {
    if num_vertices >= MAX_INDEX_COUNT {
        return Err(GeodesicError::invalid_mesh(format!(
            "{} vertices exceed the limit of {}",
            num_vertices,
            MAX_INDEX_COUNT - 1
        )));
    }
    if num_faces.saturating_mul(3) >= MAX_INDEX_COUNT {
        return Err(GeodesicError::invalid_mesh(format!(
            "{} triangles exceed the limit of {}",
            num_faces,
            (MAX_INDEX_COUNT - 1) / 3
        )));
    }
    Ok(())
}

/// Convert a mesh back to face-vertex lists (non-degenerate triangles only).
pub fn to_face_vertex(mesh: &GeodesicMesh) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let vertices = mesh.vertices.iter().map(|v| v.position).collect();
    let faces = mesh
        .faces
        .iter()
        .map(|f| [f.vertices[0].index(), f.vertices[1].index(), f.vertices[2].index()])
        .collect();
    (vertices, faces)
}

/// Interior angles of a triangle, or `None` if it has zero area.
fn triangle_angles(vertices: &[Point3<f64>], tri: &[usize; 3]) -> Option<[f64; 3]> {
    if tri[0] == tri[1] || tri[1] == tri[2] || tri[0] == tri[2] {
        return None;
    }

    let p = [vertices[tri[0]], vertices[tri[1]], vertices[tri[2]]];
    // lengths[k] is the side opposite corner k
    let lengths = [
        (p[2] - p[1]).norm(),
        (p[0] - p[2]).norm(),
        (p[1] - p[0]).norm(),
    ];
    let longest = lengths.iter().cloned().fold(0.0, f64::max);
    let twice_area = (p[1] - p[0]).cross(&(p[2] - p[0])).norm();
    if longest <= 0.0 || twice_area <= DEGENERATE_RATIO * longest * longest {
        return None;
    }

    let mut angles = [0.0; 3];
    for k in 0..3 {
        let a = lengths[k];
        let b = lengths[(k + 1) % 3];
        let c = lengths[(k + 2) % 3];
        // Law of cosines
        let cos = ((b * b + c * c - a * a) / (2.0 * b * c)).clamp(-1.0, 1.0);
        angles[k] = cos.acos();
    }
    Some(angles)
}

/// Flag vertices incident to boundary edges.
fn mark_boundary_vertices(mesh: &mut GeodesicMesh) {
    for e in 0..mesh.edges.len() {
        if mesh.edges[e].is_boundary() {
            let [v0, v1] = mesh.edges[e].vertices;
            mesh.vertices[v0.index()].boundary = true;
            mesh.vertices[v1.index()].boundary = true;
        }
    }
}
