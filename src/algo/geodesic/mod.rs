//! Exact geodesic distances on triangle meshes.
//!
//! Distances are computed with continuous Dijkstra window propagation:
//! shortest paths are tracked as intervals on edges ("windows") that unfold
//! straight-line distance functions across faces, bending only at saddle
//! and boundary vertices. Results are exact up to floating-point rounding.
//!
//! # Queries
//!
//! - [`compute_distances`] / [`DistanceQuery`]: distances from a source set
//!   to a target set under a cutoff.
//! - [`distance_field`]: distances, best sources, and finalization status
//!   for every vertex.
//! - [`LocalMatrixBuilder`]: all pairwise distances up to a radius, as
//!   sparse triplets or a [`CscMatrix`](crate::algo::sparse::CscMatrix).
//!
//! The lower-level [`WindowPropagation`] engine is exposed for callers that
//! need their own [`StopPredicate`].
//!
//! # Example
//!
//! ```
//! use gdist::algo::geodesic::compute_distances;
//! use gdist::mesh::build_from_flat;
//!
//! // A unit square split along its diagonal
//! let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
//! let triangles = [0, 1, 2, 0, 2, 3];
//! let mesh = build_from_flat(&vertices, &triangles).unwrap();
//!
//! let d = compute_distances(&mesh, &[1], &[3, 0], 10.0).unwrap();
//! assert!((d[0] - 2.0_f64.sqrt()).abs() < 1e-12);
//! assert!((d[1] - 1.0).abs() < 1e-12);
//! ```

mod matrix;
mod propagation;
mod query;
mod window;

pub use matrix::{LocalMatrix, LocalMatrixBuilder};
pub use propagation::{
    DistanceLimit, PropagationStats, StopPredicate, TargetsReached, VertexDistanceTable,
    WindowPropagation,
};
pub use query::{compute_distances, distance_field, DistanceQuery, PropagationOptions};
pub use window::{Crossings, Window};

use crate::mesh::VertexId;

/// Cutoff used when the caller asks for unbounded propagation.
///
/// Large but finite, so that it can be passed through foreign interfaces
/// and returned as the unreached sentinel. It is only ever compared against,
/// never used in arithmetic.
pub const DEFAULT_MAX_DISTANCE: f64 = 1e100;

/// Distances from a source set to every vertex.
///
/// Vertices that no window reached before the propagation stopped report
/// `f64::INFINITY`.
#[derive(Debug, Clone)]
pub struct DistanceField {
    distances: Vec<f64>,
    sources: Vec<VertexId>,
    frontier: f64,
    stats: PropagationStats,
}

impl DistanceField {
    pub(crate) fn from_table(table: &VertexDistanceTable, stats: PropagationStats) -> Self {
        Self {
            distances: table.distances().to_vec(),
            sources: table.sources().to_vec(),
            frontier: table.frontier(),
            stats,
        }
    }

    /// Get the distance to a vertex.
    ///
    /// Returns `f64::INFINITY` if the vertex was not reached.
    #[inline]
    pub fn distance(&self, v: VertexId) -> f64 {
        self.distances[v.index()]
    }

    /// Get all distances as a slice.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// The source vertex whose distance reaches `v` first.
    #[inline]
    pub fn source(&self, v: VertexId) -> Option<VertexId> {
        self.sources[v.index()].valid()
    }

    /// Check if a vertex's distance is provably minimal.
    ///
    /// Always true when propagation ran to completion; with a cutoff or
    /// targets, only vertices inside the explored region are final.
    #[inline]
    pub fn is_finalized(&self, v: VertexId) -> bool {
        self.distances[v.index()] <= self.frontier
    }

    /// Distance below which every vertex is final.
    #[inline]
    pub fn frontier(&self) -> f64 {
        self.frontier
    }

    /// Counters from the propagation that produced this field.
    #[inline]
    pub fn stats(&self) -> &PropagationStats {
        &self.stats
    }

    /// Get the number of vertices.
    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Check if empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Find the vertex with the maximum finite distance from the source(s).
    ///
    /// Returns `None` if no vertex was reached. Ties go to the lowest index.
    pub fn farthest_vertex(&self) -> Option<(VertexId, f64)> {
        let mut best: Option<(VertexId, f64)> = None;
        for (i, &d) in self.distances.iter().enumerate() {
            if d.is_finite() && best.map_or(true, |(_, b)| d > b) {
                best = Some((VertexId::new(i), d));
            }
        }
        best
    }

    /// Check if a vertex was reached.
    #[inline]
    pub fn is_reachable(&self, v: VertexId) -> bool {
        self.distances[v.index()].is_finite()
    }

    /// Count the number of reached vertices.
    pub fn reachable_count(&self) -> usize {
        self.distances.iter().filter(|d| d.is_finite()).count()
    }

    /// Iterate over all vertices with their distances.
    pub fn iter(&self) -> impl Iterator<Item = (VertexId, f64)> + '_ {
        self.distances
            .iter()
            .enumerate()
            .map(|(i, &d)| (VertexId::new(i), d))
    }
}
