//! # gdist
//!
//! Exact geodesic distances on triangle meshes.
//!
//! gdist computes shortest-path distances along a polyhedral surface with
//! the continuous Dijkstra method of Mitchell, Mount and Papadimitriou:
//! intervals of each edge ("windows") remember which unfolded source they
//! are visible from, and are propagated across faces in order of their
//! minimum distance. The result is exact for the piecewise-flat surface,
//! unlike graph distances along edges.
//!
//! ## Features
//!
//! - **Point queries**: distances from a set of source vertices to a set of
//!   target vertices, with an optional cutoff
//! - **Local distance matrices**: all vertex pairs within a radius, built in
//!   parallel with one propagation per vertex
//! - **Mesh loading**: PLY, STL and plain-text vertex/triangle files
//! - **C ABI**: handle-based functions for embedding from other languages
//!
//! ## Quick Start
//!
//! ```no_run
//! use gdist::prelude::*;
//!
//! let mesh = gdist::io::load("lh.pial.ply").unwrap();
//!
//! // Distance from vertex 0 to a few targets
//! let d = compute_distances(&mesh, &[0], &[10, 20, 30], DEFAULT_MAX_DISTANCE).unwrap();
//! println!("{:?}", d);
//!
//! // Every pair closer than 10 units
//! let matrix = LocalMatrixBuilder::new(&mesh)
//!     .with_max_distance(10.0)
//!     .build()
//!     .unwrap();
//! println!("{} entries", matrix.len());
//! ```
//!
//! ## Building Meshes Programmatically
//!
//! ```
//! use gdist::prelude::*;
//! use nalgebra::Point3;
//!
//! let vertices = vec![
//!     Point3::new(0.0, 0.0, 0.0),
//!     Point3::new(1.0, 0.0, 0.0),
//!     Point3::new(1.0, 1.0, 0.0),
//!     Point3::new(0.0, 1.0, 0.0),
//! ];
//! let faces = vec![[0, 1, 2], [0, 2, 3]];
//!
//! let mesh: GeodesicMesh = build_from_triangles(&vertices, &faces).unwrap();
//!
//! // Across the shared diagonal the path is straight
//! let d = compute_distances(&mesh, &[1], &[3], DEFAULT_MAX_DISTANCE).unwrap();
//! assert!((d[0] - 2.0_f64.sqrt()).abs() < 1e-12);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod algo;
pub mod error;
pub mod ffi;
pub mod io;
pub mod mesh;

/// Prelude module for convenient imports.
///
/// This module re-exports the most commonly used types and functions:
///
/// ```
/// use gdist::prelude::*;
/// ```
pub mod prelude {
    pub use crate::algo::geodesic::{
        compute_distances, distance_field, DistanceField, DistanceQuery, LocalMatrix, LocalMatrixBuilder,
        PropagationOptions, DEFAULT_MAX_DISTANCE,
    };
    pub use crate::error::{GeodesicError, Result};
    pub use crate::mesh::{
        build_from_flat, build_from_triangles, to_face_vertex, EdgeId, FaceId, GeodesicMesh, VertexId,
    };
}

// Re-export nalgebra types for convenience
pub use nalgebra;
