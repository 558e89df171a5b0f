//! STL (stereolithography) format support.
//!
//! STL stores every triangle with its own copies of its corners, so corners
//! are welded back into shared vertices before the mesh is built. Without
//! welding every triangle would be its own connected component.

use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

use nalgebra::Point3;

use crate::error::{GeodesicError, Result};
use crate::mesh::{build_from_triangles, GeodesicMesh};

/// Load a mesh from an STL file.
///
/// Automatically detects binary vs ASCII format. Corners with bit-identical
/// coordinates become one vertex.
///
/// # Example
///
/// ```no_run
/// use gdist::io::stl;
///
/// let mesh = stl::load("skull.stl").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<GeodesicMesh> {
    let path = path.as_ref();
    let mut file = File::open(path)?;

    let stl = stl_io::read_stl(&mut file).map_err(|e| GeodesicError::LoadError {
        path: path.to_path_buf(),
        message: e.to_string(),
    })?;

    let corners = stl.faces.iter().map(|tri| {
        tri.vertices.map(|k| {
            let v = &stl.vertices[k];
            [v[0], v[1], v[2]]
        })
    });
    let (vertices, faces) = weld(corners);

    if faces.is_empty() {
        return Err(GeodesicError::LoadError {
            path: path.to_path_buf(),
            message: "STL file contains no valid triangles".to_string(),
        });
    }

    build_from_triangles(&vertices, &faces)
}

/// Merge corners with identical coordinates and drop triangles that
/// collapse to fewer than three distinct vertices.
fn weld(triangles: impl Iterator<Item = [[f32; 3]; 3]>) -> (Vec<Point3<f64>>, Vec<[usize; 3]>) {
    let mut lookup: HashMap<[u32; 3], usize> = HashMap::new();
    let mut vertices: Vec<Point3<f64>> = Vec::new();
    let mut faces: Vec<[usize; 3]> = Vec::new();

    for corners in triangles {
        let [i0, i1, i2] = corners.map(|c| {
            // -0.0 and 0.0 weld together
            let key = c.map(|x| if x == 0.0 { 0 } else { x.to_bits() });
            *lookup.entry(key).or_insert_with(|| {
                vertices.push(Point3::new(c[0] as f64, c[1] as f64, c[2] as f64));
                vertices.len() - 1
            })
        });

        if i0 != i1 && i1 != i2 && i0 != i2 {
            faces.push([i0, i1, i2]);
        }
    }

    (vertices, faces)
}
