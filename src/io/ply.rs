//! PLY (Stanford polygon) format support.
//!
//! Both ASCII and binary PLY files are read through `ply-rs`. Polygons with
//! more than three corners are fan-triangulated.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use nalgebra::Point3;
use ply_rs::parser::Parser;
use ply_rs::ply::{DefaultElement, Property};

use crate::error::{GeodesicError, Result};
use crate::mesh::{build_from_triangles, GeodesicMesh};

/// Load a mesh from a PLY file.
///
/// # Example
///
/// ```no_run
/// use gdist::io::ply;
///
/// let mesh = ply::load("lh.pial.ply").unwrap();
/// println!("{} vertices", mesh.num_vertices());
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<GeodesicMesh> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut reader = BufReader::new(file);

    let (vertices, faces) = read(&mut reader).map_err(|message| GeodesicError::LoadError {
        path: path.to_path_buf(),
        message,
    })?;
    build_from_triangles(&vertices, &faces)
}

/// Parse vertex positions and triangles from PLY data.
pub(crate) fn read<R: BufRead>(reader: &mut R) -> std::result::Result<(Vec<Point3<f64>>, Vec<[usize; 3]>), String> {
    let parser = Parser::<DefaultElement>::new();
    let ply = parser.read_ply(reader).map_err(|e| e.to_string())?;

    let vertex_element = ply
        .payload
        .get("vertex")
        .ok_or_else(|| "PLY file has no vertex element".to_string())?;

    let mut vertices: Vec<Point3<f64>> = Vec::with_capacity(vertex_element.len());
    for (i, vertex) in vertex_element.iter().enumerate() {
        let coord = |name: &str| {
            get_float_property(vertex, name).ok_or_else(|| format!("vertex {} missing {} coordinate", i, name))
        };
        vertices.push(Point3::new(coord("x")?, coord("y")?, coord("z")?));
    }

    let face_element = ply
        .payload
        .get("face")
        .ok_or_else(|| "PLY file has no face element".to_string())?;

    let mut faces: Vec<[usize; 3]> = Vec::with_capacity(face_element.len());
    for (i, face) in face_element.iter().enumerate() {
        let indices = get_list_property(face, "vertex_indices")
            .or_else(|| get_list_property(face, "vertex_index"))
            .ok_or_else(|| format!("face {} missing vertex_indices property", i))?;

        if indices.len() < 3 {
            return Err(format!("face {} has only {} vertices", i, indices.len()));
        }
        // Fan triangulation for polygons
        for k in 1..indices.len() - 1 {
            faces.push([indices[0], indices[k], indices[k + 1]]);
        }
    }

    if faces.is_empty() {
        return Err("PLY file contains no faces".to_string());
    }
    Ok((vertices, faces))
}

fn get_float_property(element: &DefaultElement, name: &str) -> Option<f64> {
    match element.get(name)? {
        Property::Float(v) => Some(*v as f64),
        Property::Double(v) => Some(*v),
        Property::Int(v) => Some(*v as f64),
        Property::UInt(v) => Some(*v as f64),
        Property::Short(v) => Some(*v as f64),
        Property::UShort(v) => Some(*v as f64),
        Property::Char(v) => Some(*v as f64),
        Property::UChar(v) => Some(*v as f64),
        _ => None,
    }
}

fn get_list_property(element: &DefaultElement, name: &str) -> Option<Vec<usize>> {
    // Negative indices wrap to huge values and are rejected by the mesh builder
    match element.get(name)? {
        Property::ListInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUInt(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUShort(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        Property::ListUChar(v) => Some(v.iter().map(|&x| x as usize).collect()),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SQUARE: &str = "ply
format ascii 1.0
element vertex 4
property float x
property float y
property float z
element face 1
property list uchar int vertex_indices
end_header
0 0 0
1 0 0
1 1 0
0 1 0
4 0 1 2 3
";

    #[test]
    fn test_read_ascii_quad() {
        let (vertices, faces) = read(&mut SQUARE.as_bytes()).unwrap();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[2], Point3::new(1.0, 1.0, 0.0));
        assert_eq!(faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_read_rejects_missing_faces() {
        let text = "ply
format ascii 1.0
element vertex 1
property float x
property float y
property float z
end_header
0 0 0
";
        assert!(read(&mut text.as_bytes()).is_err());
    }
}
