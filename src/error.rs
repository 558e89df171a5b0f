//! Error types for gdist.
//!
//! This module defines all error types used throughout the library.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias using [`GeodesicError`].
pub type Result<T> = std::result::Result<T, GeodesicError>;

/// Errors that can occur while building meshes or running geodesic queries.
#[derive(Error, Debug)]
pub enum GeodesicError {
    /// A required input was empty (no vertices, no triangles, no sources).
    #[error("empty input: {what}")]
    EmptyInput {
        /// Which input was empty.
        what: &'static str,
    },

    /// The raw mesh buffers are malformed.
    #[error("invalid mesh: {reason}")]
    InvalidMesh {
        /// Description of the problem.
        reason: String,
    },

    /// A triangle references a vertex index outside `[0, vertex_count)`.
    #[error("triangle {face} references invalid vertex index {vertex}")]
    InvalidVertexIndex {
        /// The triangle index.
        face: usize,
        /// The invalid vertex index.
        vertex: usize,
    },

    /// An edge has more than two incident triangles.
    #[error("edge ({v0}, {v1}) has {faces} incident triangles (at most 2 allowed)")]
    NonManifoldEdge {
        /// First vertex of the edge.
        v0: usize,
        /// Second vertex of the edge.
        v1: usize,
        /// Number of incident triangles seen.
        faces: usize,
    },

    /// Every triangle of the mesh is degenerate, leaving nothing to propagate over.
    #[error("all {total} triangles are degenerate ({degenerate} zero-area)")]
    DegenerateGeometry {
        /// Number of degenerate triangles.
        degenerate: usize,
        /// Total number of triangles.
        total: usize,
    },

    /// A query source or target index is outside the mesh.
    #[error("vertex index {index} out of range (mesh has {vertex_count} vertices)")]
    IndexOutOfRange {
        /// The offending index.
        index: usize,
        /// Number of vertices in the mesh.
        vertex_count: usize,
    },

    /// Invalid parameter value.
    #[error("invalid parameter: {name} = {value} ({reason})")]
    InvalidParameter {
        /// Parameter name.
        name: &'static str,
        /// The invalid value (as string).
        value: String,
        /// Reason the value is invalid.
        reason: &'static str,
    },

    /// File I/O error.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Error loading mesh from file.
    #[error("failed to load mesh from {path}: {message}")]
    LoadError {
        /// The file path.
        path: PathBuf,
        /// Error message.
        message: String,
    },

    /// Unsupported file format.
    #[error("unsupported file format: {extension}")]
    UnsupportedFormat {
        /// The file extension.
        extension: String,
    },
}

impl GeodesicError {
    /// Create an invalid parameter error.
    pub fn invalid_param<T: std::fmt::Display>(
        name: &'static str,
        value: T,
        reason: &'static str,
    ) -> Self {
        GeodesicError::InvalidParameter {
            name,
            value: value.to_string(),
            reason,
        }
    }

    /// Create an invalid mesh error.
    pub fn invalid_mesh(reason: impl Into<String>) -> Self {
        GeodesicError::InvalidMesh {
            reason: reason.into(),
        }
    }
}
