//! Source-to-target distance queries.

use crate::error::{GeodesicError, Result};
use crate::mesh::{GeodesicMesh, VertexId};

use super::propagation::{DistanceLimit, PropagationStats, TargetsReached, WindowPropagation};
use super::DistanceField;

/// Options for [`distance_field`].
#[derive(Debug, Clone, Default)]
pub struct PropagationOptions {
    /// Stop expanding beyond this distance. `None` propagates over the whole
    /// connected component.
    pub max_distance: Option<f64>,

    /// Stop as soon as all of these vertices are final.
    pub targets: Option<Vec<VertexId>>,
}

impl PropagationOptions {
    /// Set maximum distance to explore.
    pub fn with_max_distance(mut self, max_distance: f64) -> Self {
        self.max_distance = Some(max_distance);
        self
    }

    /// Set target vertices for early termination.
    pub fn with_targets(mut self, targets: Vec<VertexId>) -> Self {
        self.targets = Some(targets);
        self
    }
}

/// Reject NaN and negative cutoffs.
pub(crate) fn validate_max_distance(max_distance: f64) -> Result<()> {
    if max_distance.is_nan() || max_distance < 0.0 {
        return Err(GeodesicError::invalid_param(
            "max_distance",
            max_distance,
            "must be a non-negative number",
        ));
    }
    Ok(())
}

fn validate_indices(mesh: &GeodesicMesh, indices: &[usize]) -> Result<Vec<VertexId>> {
    let n = mesh.num_vertices();
    indices
        .iter()
        .map(|&i| {
            if i < n {
                Ok(VertexId::new(i))
            } else {
                Err(GeodesicError::IndexOutOfRange {
                    index: i,
                    vertex_count: n,
                })
            }
        })
        .collect()
}

/// Repeated distance queries against one mesh.
///
/// Keeps its propagation buffers between calls; every call is still
/// independent of the previous ones.
#[derive(Debug)]
pub struct DistanceQuery<'m> {
    engine: WindowPropagation<'m>,
}

impl<'m> DistanceQuery<'m> {
    /// Create a query context for `mesh`.
    pub fn new(mesh: &'m GeodesicMesh) -> Self {
        Self {
            engine: WindowPropagation::new(mesh),
        }
    }

    /// Distances from the nearest of `sources` to each of `targets`.
    ///
    /// The output matches `targets` in length and order. A target farther
    /// than `max_distance` (or unreachable) reports `max_distance` itself.
    ///
    /// # Errors
    ///
    /// - [`GeodesicError::EmptyInput`] if `sources` is empty
    /// - [`GeodesicError::IndexOutOfRange`] for an index outside the mesh
    /// - [`GeodesicError::InvalidParameter`] for a NaN or negative cutoff
    pub fn query(&mut self, sources: &[usize], targets: &[usize], max_distance: f64) -> Result<Vec<f64>> {
        validate_max_distance(max_distance)?;
        if sources.is_empty() {
            return Err(GeodesicError::EmptyInput { what: "sources" });
        }
        let mesh = self.engine.mesh();
        let sources = validate_indices(mesh, sources)?;
        let targets = validate_indices(mesh, targets)?;
        if targets.is_empty() {
            return Ok(Vec::new());
        }

        let mut stop = TargetsReached::new(&targets, max_distance);
        self.engine.propagate(&sources, &mut stop)?;

        let table = self.engine.table();
        Ok(targets
            .iter()
            .map(|&t| {
                let d = table.distance(t);
                if d <= max_distance {
                    d
                } else {
                    max_distance
                }
            })
            .collect())
    }

    /// Counters from the last query.
    pub fn stats(&self) -> PropagationStats {
        self.engine.stats()
    }
}

/// Distances from the nearest of `sources` to each of `targets`.
///
/// One-shot form of [`DistanceQuery::query`]; unreached targets report
/// `max_distance`. Pass [`DEFAULT_MAX_DISTANCE`](super::DEFAULT_MAX_DISTANCE) for no effective cutoff.
pub fn compute_distances(
    mesh: &GeodesicMesh,
    sources: &[usize],
    targets: &[usize],
    max_distance: f64,
) -> Result<Vec<f64>> {
    DistanceQuery::new(mesh).query(sources, targets, max_distance)
}

/// Distances from `sources` to every vertex of the mesh.
///
/// Unlike [`compute_distances`], unreached vertices report `f64::INFINITY`
/// and the field records which source each distance belongs to.
///
/// # Example
///
/// ```
/// use gdist::algo::geodesic::{distance_field, PropagationOptions};
/// use gdist::mesh::{build_from_flat, VertexId};
///
/// let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 1.0, 1.0, 0.0, 0.0, 1.0, 0.0];
/// let mesh = build_from_flat(&vertices, &[0, 1, 2, 0, 2, 3]).unwrap();
///
/// let field = distance_field(&mesh, &[VertexId::new(0)], &PropagationOptions::default()).unwrap();
/// let (far, d) = field.farthest_vertex().unwrap();
/// assert_eq!(far, VertexId::new(2));
/// assert!((d - 2.0_f64.sqrt()).abs() < 1e-12);
/// ```
pub fn distance_field(
    mesh: &GeodesicMesh,
    sources: &[VertexId],
    options: &PropagationOptions,
) -> Result<DistanceField> {
    let max_distance = options.max_distance.unwrap_or(f64::INFINITY);
    validate_max_distance(max_distance)?;
    if sources.is_empty() {
        return Err(GeodesicError::EmptyInput { what: "sources" });
    }

    let mut engine = WindowPropagation::new(mesh);
    match &options.targets {
        Some(targets) => {
            let n = mesh.num_vertices();
            if let Some(bad) = targets.iter().find(|t| t.index() >= n) {
                return Err(GeodesicError::IndexOutOfRange {
                    index: bad.index(),
                    vertex_count: n,
                });
            }
            engine.propagate(sources, &mut TargetsReached::new(targets, max_distance))?;
        }
        None => engine.propagate(sources, &mut DistanceLimit(max_distance))?,
    }
    Ok(DistanceField::from_table(engine.table(), engine.stats()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::geodesic::DEFAULT_MAX_DISTANCE;
    use crate::mesh::build_from_triangles;
    use approx::assert_abs_diff_eq;
    use nalgebra::Point3;

    fn create_grid_mesh(n: usize, spacing: f64) -> GeodesicMesh {
        let mut vertices = Vec::new();
        for j in 0..n {
            for i in 0..n {
                vertices.push(Point3::new(i as f64 * spacing, j as f64 * spacing, 0.0));
            }
        }
        let mut faces = Vec::new();
        for j in 0..n - 1 {
            for i in 0..n - 1 {
                let v00 = j * n + i;
                faces.push([v00, v00 + 1, v00 + n + 1]);
                faces.push([v00, v00 + n + 1, v00 + n]);
            }
        }
        build_from_triangles(&vertices, &faces).unwrap()
    }

    #[test]
    fn test_adjacent_grid_vertices() {
        let mesh = create_grid_mesh(11, 0.2);
        assert_eq!(mesh.num_vertices(), 121);
        assert_eq!(mesh.num_faces(), 200);

        let d = compute_distances(&mesh, &[1], &[2], DEFAULT_MAX_DISTANCE).unwrap();
        assert_abs_diff_eq!(d[0], 0.2, epsilon = 1e-6);
        let d = compute_distances(&mesh, &[1], &[0], DEFAULT_MAX_DISTANCE).unwrap();
        assert_abs_diff_eq!(d[0], 0.2, epsilon = 1e-6);
    }

    #[test]
    fn test_output_follows_target_order() {
        let mesh = create_grid_mesh(5, 1.0);
        let d = compute_distances(&mesh, &[0], &[4, 0, 24, 4], DEFAULT_MAX_DISTANCE).unwrap();
        assert_eq!(d.len(), 4);
        assert_abs_diff_eq!(d[0], 4.0, epsilon = 1e-9);
        assert_eq!(d[1], 0.0);
        assert_abs_diff_eq!(d[2], 32.0_f64.sqrt(), epsilon = 1e-9);
        assert_eq!(d[0], d[3]);
    }

    #[test]
    fn test_unreached_targets_report_cutoff() {
        let mesh = create_grid_mesh(5, 1.0);
        let d = compute_distances(&mesh, &[0], &[1, 24], 1.5).unwrap();
        assert_abs_diff_eq!(d[0], 1.0, epsilon = 1e-12);
        assert_eq!(d[1], 1.5);
    }

    #[test]
    fn test_disconnected_component_reports_cutoff() {
        let vertices = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(0.0, 1.0, 0.0),
            Point3::new(5.0, 0.0, 0.0),
            Point3::new(6.0, 0.0, 0.0),
            Point3::new(5.0, 1.0, 0.0),
        ];
        let mesh = build_from_triangles(&vertices, &[[0, 1, 2], [3, 4, 5]]).unwrap();
        let d = compute_distances(&mesh, &[0], &[2, 4], 100.0).unwrap();
        assert_abs_diff_eq!(d[0], 1.0, epsilon = 1e-12);
        assert_eq!(d[1], 100.0);
    }

    #[test]
    fn test_multi_source_minimum() {
        let mesh = create_grid_mesh(5, 1.0);
        let d = compute_distances(&mesh, &[0, 4], &[2, 3], DEFAULT_MAX_DISTANCE).unwrap();
        assert_abs_diff_eq!(d[0], 2.0, epsilon = 1e-9);
        assert_abs_diff_eq!(d[1], 1.0, epsilon = 1e-9);
    }

    #[test]
    fn test_input_validation() {
        let mesh = create_grid_mesh(3, 1.0);

        let err = compute_distances(&mesh, &[], &[1], 1.0).unwrap_err();
        assert!(matches!(err, GeodesicError::EmptyInput { what: "sources" }));

        assert!(compute_distances(&mesh, &[0], &[], 1.0).unwrap().is_empty());

        let err = compute_distances(&mesh, &[0], &[9], 1.0).unwrap_err();
        assert!(matches!(err, GeodesicError::IndexOutOfRange { index: 9, .. }));

        let err = compute_distances(&mesh, &[10], &[0], 1.0).unwrap_err();
        assert!(matches!(err, GeodesicError::IndexOutOfRange { index: 10, .. }));

        assert!(compute_distances(&mesh, &[0], &[1], f64::NAN).is_err());
        assert!(compute_distances(&mesh, &[0], &[1], -1.0).is_err());
    }

    #[test]
    fn test_zero_cutoff() {
        let mesh = create_grid_mesh(3, 1.0);
        let d = compute_distances(&mesh, &[4], &[4, 5], 0.0).unwrap();
        assert_eq!(d, vec![0.0, 0.0]);
    }

    #[test]
    fn test_query_context_reuse() {
        let mesh = create_grid_mesh(6, 0.5);
        let mut query = DistanceQuery::new(&mesh);
        let first = query.query(&[0], &[35], DEFAULT_MAX_DISTANCE).unwrap();
        let _ = query.query(&[7], &[20], DEFAULT_MAX_DISTANCE).unwrap();
        let again = query.query(&[0], &[35], DEFAULT_MAX_DISTANCE).unwrap();
        assert_eq!(first, again);
        assert!(query.stats().windows_created > 0);
    }

    #[test]
    fn test_distance_field() {
        let mesh = create_grid_mesh(5, 1.0);
        let sources = [VertexId::new(0), VertexId::new(24)];
        let field = distance_field(&mesh, &sources, &PropagationOptions::default()).unwrap();

        assert_eq!(field.len(), 25);
        assert_eq!(field.reachable_count(), 25);
        assert!(field.iter().all(|(v, _)| field.is_finalized(v)));
        assert_eq!(field.source(VertexId::new(1)), Some(VertexId::new(0)));
        assert_eq!(field.source(VertexId::new(23)), Some(VertexId::new(24)));

        let (_, far) = field.farthest_vertex().unwrap();
        // Corners (4,0) and (0,4) are 4 away from either source
        assert_abs_diff_eq!(far, 4.0, epsilon = 1e-9);
    }

    #[test]
    fn test_distance_field_with_cutoff() {
        let mesh = create_grid_mesh(5, 1.0);
        let options = PropagationOptions::default().with_max_distance(1.0);
        let field = distance_field(&mesh, &[VertexId::new(0)], &options).unwrap();

        assert!(field.is_reachable(VertexId::new(1)));
        assert!(field.is_finalized(VertexId::new(1)));
        assert!(!field.is_reachable(VertexId::new(24)));
        assert!(field.reachable_count() < 25);
    }

    #[test]
    fn test_distance_field_with_targets() {
        let mesh = create_grid_mesh(8, 1.0);
        let options = PropagationOptions::default().with_targets(vec![VertexId::new(9)]);
        let field = distance_field(&mesh, &[VertexId::new(0)], &options).unwrap();
        assert!(field.is_finalized(VertexId::new(9)));
        assert_abs_diff_eq!(field.distance(VertexId::new(9)), 2.0_f64.sqrt(), epsilon = 1e-12);
        assert!(!field.is_finalized(VertexId::new(63)));
    }
}
