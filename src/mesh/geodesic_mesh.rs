//! Immutable triangle mesh with the adjacency needed for geodesic unfolding.
//!
//! # Structure
//!
//! - Vertices, edges, and faces are stored in dense arenas and addressed by
//!   [`VertexId`], [`EdgeId`], and [`FaceId`]. The triangle/edge/triangle
//!   adjacency is cyclic, so nothing holds a reference to anything else.
//! - Every undirected edge stores its length and one [`EdgeSide`] per incident
//!   triangle: the vertex opposite the edge, the two base angles, and the
//!   apex position in the edge's local 2D frame.
//! - Every vertex stores its incident faces, its total angle, and whether it
//!   is a saddle or boundary vertex.
//!
//! # Edge Frames
//!
//! The local frame of an edge puts `vertices[0]` at the origin and
//! `vertices[1]` at `(length, 0)`. An incident triangle, unfolded into that
//! frame, has its apex at `(b cos α0, b sin α0)` with `b = |v0 apex|` and `α0`
//! the base angle at `vertices[0]`. Both incident triangles are described on
//! the `+y` side; callers mirror one of them when laying out a pair.

use std::f64::consts::PI;

use nalgebra::{Point3, Vector3};

use super::index::{EdgeId, FaceId, VertexId};

/// Total angle above which an interior vertex is treated as a saddle.
///
/// Flat vertices (total angle `2π`) fall into this class so that geodesics
/// passing exactly through them are handled by vertex pseudo-sources.
pub const SADDLE_ANGLE_THRESHOLD: f64 = 2.0 * PI - 1e-5;

/// A vertex of the mesh.
#[derive(Debug, Clone)]
pub struct Vertex {
    /// The 3D position of this vertex.
    pub position: Point3<f64>,

    /// Non-degenerate faces incident to this vertex.
    pub(crate) faces: Vec<FaceId>,

    /// Sum of the interior angles of the incident faces at this vertex.
    pub(crate) total_angle: f64,

    /// Whether the vertex lies on a boundary edge.
    pub(crate) boundary: bool,
}

impl Vertex {
    pub(crate) fn new(position: Point3<f64>) -> Self {
        Self {
            position,
            faces: Vec::new(),
            total_angle: 0.0,
            boundary: false,
        }
    }

    /// Whether geodesics can bend around this vertex.
    ///
    /// True for boundary vertices and for interior vertices whose total angle
    /// is at least [`SADDLE_ANGLE_THRESHOLD`].
    #[inline]
    pub fn is_saddle_or_boundary(&self) -> bool {
        !self.faces.is_empty() && (self.boundary || self.total_angle >= SADDLE_ANGLE_THRESHOLD)
    }
}

/// One incident triangle of an edge, as seen from that edge.
#[derive(Debug, Clone, Copy)]
pub struct EdgeSide {
    /// The incident face.
    pub face: FaceId,
    /// The face vertex not on the edge.
    pub opposite: VertexId,
    /// Interior angles of the face at the edge's `vertices[0]` and `vertices[1]`.
    pub angles: [f64; 2],
    /// Position of `opposite` in the edge frame, on the `+y` side.
    pub apex: [f64; 2],
}

impl Default for EdgeSide {
    fn default() -> Self {
        Self {
            face: FaceId::invalid(),
            opposite: VertexId::invalid(),
            angles: [0.0; 2],
            apex: [0.0; 2],
        }
    }
}

/// An undirected edge with its one or two incident triangles.
#[derive(Debug, Clone)]
pub struct Edge {
    /// Endpoints, with `vertices[0] < vertices[1]`.
    pub vertices: [VertexId; 2],
    /// Euclidean length.
    pub length: f64,
    /// Incident triangles; the second side is unset on boundary edges.
    pub(crate) sides: [EdgeSide; 2],
}

impl Edge {
    pub(crate) fn new(v0: VertexId, v1: VertexId, length: f64) -> Self {
        Self {
            vertices: [v0, v1],
            length,
            sides: [EdgeSide::default(); 2],
        }
    }

    /// Number of incident triangles (1 or 2).
    #[inline]
    pub fn face_count(&self) -> usize {
        self.sides.iter().filter(|s| s.face.is_valid()).count()
    }

    /// Check if this edge has a single incident triangle.
    #[inline]
    pub fn is_boundary(&self) -> bool {
        !self.sides[1].face.is_valid()
    }

    /// The incident sides that are set.
    pub fn sides(&self) -> impl Iterator<Item = &EdgeSide> + '_ {
        self.sides.iter().filter(|s| s.face.is_valid())
    }

    /// The side belonging to `face`, if `face` is incident.
    #[inline]
    pub fn side(&self, face: FaceId) -> Option<&EdgeSide> {
        self.sides().find(|s| s.face == face)
    }

    /// The incident face other than `face`, or an invalid id on the boundary.
    #[inline]
    pub fn other_face(&self, face: FaceId) -> FaceId {
        if self.sides[0].face == face {
            self.sides[1].face
        } else {
            self.sides[0].face
        }
    }

    /// Check if `v` is an endpoint.
    #[inline]
    pub fn has_vertex(&self, v: VertexId) -> bool {
        self.vertices[0] == v || self.vertices[1] == v
    }
}

/// A non-degenerate triangle.
#[derive(Debug, Clone, Copy)]
pub struct Face {
    /// Corner vertices in input order.
    pub vertices: [VertexId; 3],
    /// `edges[k]` joins `vertices[k]` and `vertices[(k + 1) % 3]`.
    pub edges: [EdgeId; 3],
    /// Interior angle at each corner.
    pub angles: [f64; 3],
    /// Index of the triangle in the caller's input array.
    pub source_index: usize,
}

impl Face {
    /// The edge of this face that does not touch `v`.
    #[inline]
    pub fn opposite_edge(&self, v: VertexId) -> Option<EdgeId> {
        let k = self.vertices.iter().position(|&x| x == v)?;
        Some(self.edges[(k + 1) % 3])
    }
}

/// Immutable triangulated surface shared by all geodesic queries.
///
/// Built once with [`build_from_triangles`](super::build_from_triangles) or
/// [`build_from_flat`](super::build_from_flat). It is `Send + Sync` and never
/// mutated, so any number of queries may borrow it concurrently.
#[derive(Debug, Clone)]
pub struct GeodesicMesh {
    pub(crate) vertices: Vec<Vertex>,
    pub(crate) edges: Vec<Edge>,
    pub(crate) faces: Vec<Face>,
    /// Input triangles skipped because they have zero area.
    pub(crate) degenerate_faces: Vec<usize>,
}

impl GeodesicMesh {
    // ==================== Counts ====================

    /// Get the number of vertices.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of edges.
    #[inline]
    pub fn num_edges(&self) -> usize {
        self.edges.len()
    }

    /// Get the number of (non-degenerate) faces.
    #[inline]
    pub fn num_faces(&self) -> usize {
        self.faces.len()
    }

    // ==================== Element access ====================

    /// Get a vertex by ID.
    #[inline]
    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id.index()]
    }

    /// Get an edge by ID.
    #[inline]
    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id.index()]
    }

    /// Get a face by ID.
    #[inline]
    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id.index()]
    }

    /// Get the position of a vertex.
    #[inline]
    pub fn position(&self, v: VertexId) -> &Point3<f64> {
        &self.vertices[v.index()].position
    }

    /// Faces incident to a vertex.
    #[inline]
    pub fn vertex_faces(&self, v: VertexId) -> &[FaceId] {
        &self.vertices[v.index()].faces
    }

    /// Total angle around a vertex.
    #[inline]
    pub fn total_angle(&self, v: VertexId) -> f64 {
        self.vertices[v.index()].total_angle
    }

    /// Check if a vertex lies on the boundary.
    #[inline]
    pub fn is_boundary_vertex(&self, v: VertexId) -> bool {
        self.vertices[v.index()].boundary
    }

    /// Check if a vertex is a saddle or boundary vertex.
    #[inline]
    pub fn is_saddle_or_boundary(&self, v: VertexId) -> bool {
        self.vertices[v.index()].is_saddle_or_boundary()
    }

    /// Input indices of triangles skipped as degenerate.
    #[inline]
    pub fn degenerate_faces(&self) -> &[usize] {
        &self.degenerate_faces
    }

    // ==================== Iteration ====================

    /// Iterate over all vertex IDs.
    pub fn vertex_ids(&self) -> impl Iterator<Item = VertexId> + '_ {
        (0..self.vertices.len()).map(VertexId::new)
    }

    /// Iterate over all edge IDs.
    pub fn edge_ids(&self) -> impl Iterator<Item = EdgeId> + '_ {
        (0..self.edges.len()).map(EdgeId::new)
    }

    /// Iterate over all face IDs.
    pub fn face_ids(&self) -> impl Iterator<Item = FaceId> + '_ {
        (0..self.faces.len()).map(FaceId::new)
    }

    // ==================== Geometry ====================

    /// Get the area of a face.
    pub fn face_area(&self, f: FaceId) -> f64 {
        let [a, b, c] = self.faces[f.index()].vertices;
        let ab: Vector3<f64> = self.position(b) - self.position(a);
        let ac: Vector3<f64> = self.position(c) - self.position(a);
        0.5 * ab.cross(&ac).norm()
    }

    /// Total surface area.
    pub fn surface_area(&self) -> f64 {
        self.face_ids().map(|f| self.face_area(f)).sum()
    }

    /// Mean edge length, or 0 for a mesh without edges.
    pub fn average_edge_length(&self) -> f64 {
        if self.edges.is_empty() {
            return 0.0;
        }
        self.edges.iter().map(|e| e.length).sum::<f64>() / self.edges.len() as f64
    }

    /// Number of edges with a single incident triangle.
    pub fn num_boundary_edges(&self) -> usize {
        self.edges.iter().filter(|e| e.is_boundary()).count()
    }

    /// Number of saddle or boundary vertices.
    pub fn num_saddle_or_boundary(&self) -> usize {
        self.vertices.iter().filter(|v| v.is_saddle_or_boundary()).count()
    }

    /// Axis-aligned bounding box, or `None` for an empty mesh.
    pub fn bounding_box(&self) -> Option<(Point3<f64>, Point3<f64>)> {
        let first = self.vertices.first()?.position;
        let (mut min, mut max) = (first, first);
        for v in &self.vertices {
            let p = v.position;
            min = Point3::new(min.x.min(p.x), min.y.min(p.y), min.z.min(p.z));
            max = Point3::new(max.x.max(p.x), max.y.max(p.y), max.z.max(p.z));
        }
        Some((min, max))
    }
}
