//! Local geodesic distance matrices.
//!
//! Every row is an independent single-source propagation cut off at the
//! matrix radius, so rows run in parallel with one engine per worker.

use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;

use rayon::prelude::*;

use crate::algo::progress::Progress;
use crate::algo::sparse::CscMatrix;
use crate::error::{GeodesicError, Result};
use crate::mesh::{GeodesicMesh, VertexId};

use super::propagation::{DistanceLimit, WindowPropagation};
use super::query::validate_max_distance;
use super::DEFAULT_MAX_DISTANCE;

/// Sparse triplets of a local distance matrix.
///
/// Entries are ordered by row, then by column. The diagonal is never
/// stored.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct LocalMatrix {
    num_vertices: usize,
    rows: Vec<usize>,
    cols: Vec<usize>,
    values: Vec<f64>,
}

impl LocalMatrix {
    /// Side length of the (square) matrix.
    #[inline]
    pub fn num_vertices(&self) -> usize {
        self.num_vertices
    }

    /// Get the number of stored entries.
    #[inline]
    pub fn len(&self) -> usize {
        self.values.len()
    }

    /// Check if no entries are stored.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Row index of each entry.
    #[inline]
    pub fn rows(&self) -> &[usize] {
        &self.rows
    }

    /// Column index of each entry.
    #[inline]
    pub fn cols(&self) -> &[usize] {
        &self.cols
    }

    /// Distance of each entry.
    #[inline]
    pub fn values(&self) -> &[f64] {
        &self.values
    }

    /// Iterate over entries as `(row, col, distance)`.
    pub fn triplets(&self) -> impl Iterator<Item = (usize, usize, f64)> + '_ {
        self.rows
            .iter()
            .zip(&self.cols)
            .zip(&self.values)
            .map(|((&r, &c), &v)| (r, c, v))
    }

    /// Split into `(rows, cols, values)`.
    pub fn into_parts(self) -> (Vec<usize>, Vec<usize>, Vec<f64>) {
        (self.rows, self.cols, self.values)
    }

    /// Assemble into a `num_vertices x num_vertices` CSC matrix.
    pub fn to_csc(&self) -> Result<CscMatrix> {
        CscMatrix::from_triplets(self.num_vertices, self.num_vertices, self.triplets())
    }
}

/// Builder for local geodesic distance matrices.
///
/// # Example
///
/// ```
/// use gdist::algo::geodesic::LocalMatrixBuilder;
/// use gdist::mesh::build_from_flat;
///
/// let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
/// let mesh = build_from_flat(&vertices, &[0, 1, 2, 0, 2, 3]).unwrap();
///
/// let matrix = LocalMatrixBuilder::new(&mesh)
///     .with_max_distance(1.2)
///     .build()
///     .unwrap();
///
/// // Four sides of the square, in both directions
/// assert_eq!(matrix.len(), 8);
/// assert!(matrix.values().iter().all(|&d| d <= 1.2));
/// ```
#[derive(Debug)]
pub struct LocalMatrixBuilder<'m> {
    mesh: &'m GeodesicMesh,
    max_distance: f64,
    parallel: bool,
    progress: Progress,
}

impl<'m> LocalMatrixBuilder<'m> {
    /// Create a builder with no effective cutoff, running in parallel.
    pub fn new(mesh: &'m GeodesicMesh) -> Self {
        Self {
            mesh,
            max_distance: DEFAULT_MAX_DISTANCE,
            parallel: true,
            progress: Progress::none(),
        }
    }

    /// Keep only pairs at most this far apart.
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = max_distance;
        self
    }

    /// Run rows on the rayon thread pool (default) or sequentially.
    pub fn with_parallel(mut self, parallel: bool) -> Self {
        self.parallel = parallel;
        self
    }

    /// Report completed rows to `progress`.
    pub fn with_progress(mut self, progress: Progress) -> Self {
        self.progress = progress;
        self
    }

    /// Compute every row of the matrix.
    pub fn build(&self) -> Result<LocalMatrix> {
        let rows: Vec<usize> = (0..self.mesh.num_vertices()).collect();
        self.build_rows(&rows)
    }

    /// Compute only the given rows, in the given order.
    ///
    /// Useful for splitting one matrix across processes; concatenating the
    /// parts for a partition of the vertices gives the full matrix.
    ///
    /// # Errors
    ///
    /// - [`GeodesicError::IndexOutOfRange`] for a row outside the mesh
    /// - [`GeodesicError::InvalidParameter`] for a NaN or negative cutoff
    pub fn build_rows(&self, rows: &[usize]) -> Result<LocalMatrix> {
        validate_max_distance(self.max_distance)?;
        let n = self.mesh.num_vertices();
        if let Some(&bad) = rows.iter().find(|&&i| i >= n) {
            return Err(GeodesicError::IndexOutOfRange {
                index: bad,
                vertex_count: n,
            });
        }

        log::info!(
            "building local distance matrix: {} rows, max distance {}",
            rows.len(),
            self.max_distance
        );
        let start = Instant::now();
        let total = rows.len();
        let done = AtomicUsize::new(0);
        let radius = self.max_distance;

        let row_entries = |engine: &mut WindowPropagation<'m>, i: usize| {
            let entries = local_row(engine, i, radius);
            let finished = done.fetch_add(1, Ordering::Relaxed) + 1;
            self.progress.report(finished, total, "Computing distance rows");
            entries
        };

        let per_row: Vec<Vec<(usize, f64)>> = if self.parallel {
            rows.par_iter()
                .map_init(|| WindowPropagation::new(self.mesh), |engine, &i| row_entries(engine, i))
                .collect::<Result<_>>()?
        } else {
            let mut engine = WindowPropagation::new(self.mesh);
            rows.iter()
                .map(|&i| row_entries(&mut engine, i))
                .collect::<Result<_>>()?
        };

        let nnz: usize = per_row.iter().map(Vec::len).sum();
        let mut matrix = LocalMatrix {
            num_vertices: n,
            rows: Vec::with_capacity(nnz),
            cols: Vec::with_capacity(nnz),
            values: Vec::with_capacity(nnz),
        };
        for (&i, entries) in rows.iter().zip(per_row) {
            for (j, d) in entries {
                matrix.rows.push(i);
                matrix.cols.push(j);
                matrix.values.push(d);
            }
        }

        log::info!(
            "local distance matrix done: {} entries in {:.2?}",
            matrix.len(),
            start.elapsed()
        );
        Ok(matrix)
    }
}

/// Off-diagonal entries `(j, d)` of row `i` with `0 < d <= radius`, sorted by `j`.
fn local_row(engine: &mut WindowPropagation<'_>, i: usize, radius: f64) -> Result<Vec<(usize, f64)>> {
    engine.propagate(&[VertexId::new(i)], &mut DistanceLimit(radius))?;
    let mut entries: Vec<(usize, f64)> = engine
        .table()
        .reached()
        .filter(|&(v, d)| v.index() != i && d > 0.0 && d <= radius)
        .map(|(v, d)| (v.index(), d))
        .collect();
    entries.sort_unstable_by_key(|&(j, _)| j);
    Ok(entries)
}
