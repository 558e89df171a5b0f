//! Core mesh data structures.
//!
//! This module provides the immutable surface representation used by the
//! geodesic algorithms, together with its construction from face-vertex lists.
//!
//! # Overview
//!
//! The primary type is [`GeodesicMesh`]. It stores vertex positions, an
//! undirected edge table with one [`EdgeSide`] per incident triangle, and the
//! per-vertex angle data that decides where geodesics may bend.
//!
//! # Index Types
//!
//! Mesh elements are identified by type-safe index wrappers:
//! - [`VertexId`] - Identifies a vertex
//! - [`EdgeId`] - Identifies an undirected edge
//! - [`FaceId`] - Identifies a triangle
//!
//! # Construction
//!
//! ```
//! use gdist::mesh::{build_from_triangles, GeodesicMesh};
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(0.5, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2]];
//!
//! let mesh: GeodesicMesh = build_from_triangles(&vertices, &faces).unwrap();
//! ```

mod builder;
mod geodesic_mesh;
mod index;

pub use builder::{build_from_flat, build_from_triangles, to_face_vertex};
pub use geodesic_mesh::{Edge, EdgeSide, Face, GeodesicMesh, Vertex, SADDLE_ANGLE_THRESHOLD};
pub use index::{EdgeId, FaceId, VertexId};
