//! C ABI for embedding the library in other languages.
//!
//! Every mesh is an explicit handle owned by the caller: create it with
//! [`gdist_mesh_new`], pass it to any number of queries (from any number of
//! threads), and release it with [`gdist_mesh_free`]. Buffers returned by
//! [`gdist_local_matrix`] are owned by the caller and must be released with
//! [`gdist_free_buffer`]; the library keeps no reference to them.
//!
//! Functions return a [`GdistStatus`] instead of unwinding. Output
//! parameters are left untouched on failure.

use std::panic::{self, AssertUnwindSafe};
use std::ptr;
use std::slice;

use crate::algo::geodesic::{compute_distances, LocalMatrixBuilder};
use crate::error::{GeodesicError, Result};
use crate::mesh::{build_from_flat, GeodesicMesh};

/// Outcome of a C ABI call.
#[repr(C)]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GdistStatus {
    /// Success.
    Ok = 0,
    /// No vertices, no triangles, or no sources.
    EmptyInput = 1,
    /// Malformed buffers, out-of-range triangle index, or non-manifold edge.
    InvalidMesh = 2,
    /// Every triangle is degenerate.
    DegenerateGeometry = 3,
    /// A source or target index is outside the mesh.
    IndexOutOfRange = 4,
    /// NaN or negative cutoff.
    InvalidParameter = 5,
    /// A required pointer was null.
    NullPointer = 6,
    /// An unexpected internal failure.
    Internal = 7,
}

impl From<&GeodesicError> for GdistStatus {
    fn from(err: &GeodesicError) -> Self {
        match err {
            GeodesicError::EmptyInput { .. } => GdistStatus::EmptyInput,
            GeodesicError::InvalidMesh { .. }
            | GeodesicError::InvalidVertexIndex { .. }
            | GeodesicError::NonManifoldEdge { .. } => GdistStatus::InvalidMesh,
            GeodesicError::DegenerateGeometry { .. } => GdistStatus::DegenerateGeometry,
            GeodesicError::IndexOutOfRange { .. } => GdistStatus::IndexOutOfRange,
            GeodesicError::InvalidParameter { .. } => GdistStatus::InvalidParameter,
            GeodesicError::Io(_) | GeodesicError::LoadError { .. } | GeodesicError::UnsupportedFormat { .. } => {
                GdistStatus::Internal
            }
        }
    }
}

/// Run `f`, mapping errors and panics to a status code.
fn guard(f: impl FnOnce() -> Result<()>) -> GdistStatus {
    match panic::catch_unwind(AssertUnwindSafe(f)) {
        Ok(Ok(())) => GdistStatus::Ok,
        Ok(Err(err)) => {
            log::debug!("C ABI call failed: {}", err);
            GdistStatus::from(&err)
        }
        Err(_) => GdistStatus::Internal,
    }
}

/// View `len` elements at `data`, allowing a null pointer when `len == 0`.
unsafe fn input<'a, T>(data: *const T, len: usize) -> Option<&'a [T]> {
    if len == 0 {
        return Some(&[]);
    }
    if data.is_null() {
        return None;
    }
    // SAFETY: the caller guarantees `data` points to `len` readable elements
    Some(unsafe { slice::from_raw_parts(data, len) })
}

/// Build a mesh from flat buffers.
///
/// `vertices` holds `num_vertex_values` doubles (`x y z` per vertex) and
/// `triangles` holds `num_triangle_values` indices (three per triangle). On
/// success `*out_mesh` receives a handle to release with [`gdist_mesh_free`].
///
/// # Safety
///
/// The buffers must be readable for the given lengths and `out_mesh` must be
/// writable.
#[no_mangle]
pub unsafe extern "C" fn gdist_mesh_new(
    vertices: *const f64,
    num_vertex_values: usize,
    triangles: *const u32,
    num_triangle_values: usize,
    out_mesh: *mut *mut GeodesicMesh,
) -> GdistStatus {
    if out_mesh.is_null() {
        return GdistStatus::NullPointer;
    }
    let (Some(vertices), Some(triangles)) = (
        unsafe { input(vertices, num_vertex_values) },
        unsafe { input(triangles, num_triangle_values) },
    ) else {
        return GdistStatus::NullPointer;
    };

    guard(|| {
        let indices: Vec<usize> = triangles.iter().map(|&i| i as usize).collect();
        let mesh = build_from_flat(vertices, &indices)?;
        // SAFETY: checked non-null above
        unsafe { *out_mesh = Box::into_raw(Box::new(mesh)) };
        Ok(())
    })
}

/// Release a mesh created by [`gdist_mesh_new`]. Null is ignored.
///
/// # Safety
///
/// `mesh` must come from [`gdist_mesh_new`] and not have been freed.
#[no_mangle]
pub unsafe extern "C" fn gdist_mesh_free(mesh: *mut GeodesicMesh) {
    if !mesh.is_null() {
        // SAFETY: the pointer came from Box::into_raw in gdist_mesh_new
        drop(unsafe { Box::from_raw(mesh) });
    }
}

/// Number of vertices in a mesh, or 0 for a null handle.
///
/// # Safety
///
/// `mesh` must be null or a live handle.
#[no_mangle]
pub unsafe extern "C" fn gdist_mesh_num_vertices(mesh: *const GeodesicMesh) -> usize {
    // SAFETY: null or a live handle
    unsafe { mesh.as_ref() }.map_or(0, GeodesicMesh::num_vertices)
}

/// Distances from the nearest source to each target.
///
/// Writes `num_targets` doubles to `out_distances`, in target order.
/// Targets farther than `max_distance` receive `max_distance`.
///
/// # Safety
///
/// `mesh` must be a live handle, the index buffers readable for their
/// lengths, and `out_distances` writable for `num_targets` doubles.
#[no_mangle]
pub unsafe extern "C" fn gdist_compute_distances(
    mesh: *const GeodesicMesh,
    sources: *const u32,
    num_sources: usize,
    targets: *const u32,
    num_targets: usize,
    max_distance: f64,
    out_distances: *mut f64,
) -> GdistStatus {
    // SAFETY: null or a live handle
    let Some(mesh) = (unsafe { mesh.as_ref() }) else {
        return GdistStatus::NullPointer;
    };
    let (Some(sources), Some(targets)) = (unsafe { input(sources, num_sources) }, unsafe {
        input(targets, num_targets)
    }) else {
        return GdistStatus::NullPointer;
    };
    if num_targets > 0 && out_distances.is_null() {
        return GdistStatus::NullPointer;
    }

    guard(|| {
        let sources: Vec<usize> = sources.iter().map(|&i| i as usize).collect();
        let targets: Vec<usize> = targets.iter().map(|&i| i as usize).collect();
        let distances = compute_distances(mesh, &sources, &targets, max_distance)?;
        if !distances.is_empty() {
            // SAFETY: the caller provides room for num_targets doubles
            unsafe { ptr::copy_nonoverlapping(distances.as_ptr(), out_distances, distances.len()) };
        }
        Ok(())
    })
}

/// All vertex pairs at most `max_distance` apart.
///
/// On success `*out_len` receives the number of entries `n` and `*out_data`
/// a buffer of `3 * n` doubles: the `n` row indices, then the `n` column
/// indices, then the `n` distances. Release it with
/// `gdist_free_buffer(data, 3 * n)`. When `n == 0` the buffer is null.
///
/// # Safety
///
/// `mesh` must be a live handle; `out_len` and `out_data` must be writable.
#[no_mangle]
pub unsafe extern "C" fn gdist_local_matrix(
    mesh: *const GeodesicMesh,
    max_distance: f64,
    out_len: *mut usize,
    out_data: *mut *mut f64,
) -> GdistStatus {
    // SAFETY: null or a live handle
    let Some(mesh) = (unsafe { mesh.as_ref() }) else {
        return GdistStatus::NullPointer;
    };
    if out_len.is_null() || out_data.is_null() {
        return GdistStatus::NullPointer;
    }

    guard(|| {
        let matrix = LocalMatrixBuilder::new(mesh).with_max_distance(max_distance).build()?;
        let n = matrix.len();
        let (rows, cols, values) = matrix.into_parts();

        let data = if n == 0 {
            ptr::null_mut()
        } else {
            let mut buffer = Vec::with_capacity(3 * n);
            buffer.extend(rows.iter().map(|&i| i as f64));
            buffer.extend(cols.iter().map(|&j| j as f64));
            buffer.extend(values);
            Box::into_raw(buffer.into_boxed_slice()) as *mut f64
        };
        // SAFETY: checked non-null above
        unsafe {
            *out_len = n;
            *out_data = data;
        }
        Ok(())
    })
}

/// Release a buffer returned by [`gdist_local_matrix`]. Null is ignored.
///
/// # Safety
///
/// `data` must come from [`gdist_local_matrix`] with `len` equal to three
/// times the reported entry count, and not have been freed.
#[no_mangle]
pub unsafe extern "C" fn gdist_free_buffer(data: *mut f64, len: usize) {
    if !data.is_null() {
        // SAFETY: the buffer was a boxed slice of exactly `len` doubles
        drop(unsafe { Box::from_raw(ptr::slice_from_raw_parts_mut(data, len)) });
    }
}
