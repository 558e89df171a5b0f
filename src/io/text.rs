//! Plain-text mesh and matrix formats.
//!
//! Surface datasets for geodesic smoothing usually ship as whitespace
//! separated text, in one of two layouts:
//!
//! - a single file whose first line holds the vertex and triangle counts
//!   (`V F`), followed by `V` rows of `x y z` and `F` rows of `i j k`;
//! - a pair of files, one with `x y z` rows and one with `i j k` rows.
//!
//! Triangle indices written by numeric tools often come out as floats
//! (`1.000000000000000000e+00`); integral float values are accepted.
//! Blank lines and lines starting with `#` are ignored.

use std::fs;
use std::io::{self, Write};
use std::path::Path;

use nalgebra::Point3;

use crate::algo::geodesic::LocalMatrix;
use crate::error::{GeodesicError, Result};
use crate::mesh::{build_from_triangles, GeodesicMesh};

/// Load a mesh from a single text file with a `V F` header line.
///
/// # Example
///
/// ```no_run
/// use gdist::io::text;
///
/// let mesh = text::load("flat_triangular_mesh.txt").unwrap();
/// ```
pub fn load<P: AsRef<Path>>(path: P) -> Result<GeodesicMesh> {
    let path = path.as_ref();
    let content = fs::read_to_string(path)?;
    let (vertices, faces) = parse_mesh(&content).map_err(|message| load_error(path, message))?;
    build_from_triangles(&vertices, &faces)
}

/// Load a mesh from separate vertex and triangle files.
pub fn load_pair<P: AsRef<Path>, Q: AsRef<Path>>(vertices_path: P, triangles_path: Q) -> Result<GeodesicMesh> {
    let (vertices_path, triangles_path) = (vertices_path.as_ref(), triangles_path.as_ref());

    let content = fs::read_to_string(vertices_path)?;
    let vertices = rows(&content)
        .map(|(line, fields)| parse_point(line, &fields))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|message| load_error(vertices_path, message))?;

    let content = fs::read_to_string(triangles_path)?;
    let faces = rows(&content)
        .map(|(line, fields)| parse_triangle(line, &fields))
        .collect::<std::result::Result<Vec<_>, _>>()
        .map_err(|message| load_error(triangles_path, message))?;

    build_from_triangles(&vertices, &faces)
}

/// Parse the single-file layout.
pub(crate) fn parse_mesh(content: &str) -> std::result::Result<(Vec<Point3<f64>>, Vec<[usize; 3]>), String> {
    let mut lines = rows(content);
    let (line, header) = lines.next().ok_or_else(|| "file is empty".to_string())?;
    if header.len() != 2 {
        return Err(format!(
            "line {}: expected header with vertex and triangle counts, found {} fields",
            line,
            header.len()
        ));
    }
    let num_vertices = parse_index(line, header[0])?;
    let num_faces = parse_index(line, header[1])?;

    let mut vertices = Vec::with_capacity(num_vertices);
    let mut faces = Vec::with_capacity(num_faces);
    for (line, fields) in lines {
        if vertices.len() < num_vertices {
            vertices.push(parse_point(line, &fields)?);
        } else if faces.len() < num_faces {
            faces.push(parse_triangle(line, &fields)?);
        } else {
            return Err(format!("line {}: unexpected data after {} triangles", line, num_faces));
        }
    }

    if vertices.len() < num_vertices || faces.len() < num_faces {
        return Err(format!(
            "expected {} vertices and {} triangles, found {} and {}",
            num_vertices,
            num_faces,
            vertices.len(),
            faces.len()
        ));
    }
    Ok((vertices, faces))
}

/// Write matrix entries as `row col distance` lines.
pub fn write_matrix<W: Write>(writer: &mut W, matrix: &LocalMatrix) -> io::Result<()> {
    for (i, j, d) in matrix.triplets() {
        writeln!(writer, "{} {} {:.17e}", i, j, d)?;
    }
    Ok(())
}

/// Write one `vertex distance` line per entry.
pub fn write_distances<W: Write>(writer: &mut W, vertices: &[usize], distances: &[f64]) -> io::Result<()> {
    for (v, d) in vertices.iter().zip(distances) {
        writeln!(writer, "{} {:.17e}", v, d)?;
    }
    Ok(())
}

fn load_error(path: &Path, message: String) -> GeodesicError {
    GeodesicError::LoadError {
        path: path.to_path_buf(),
        message,
    }
}

/// Non-empty, non-comment lines split into fields, with 1-based line numbers.
fn rows(content: &str) -> impl Iterator<Item = (usize, Vec<&str>)> {
    content
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('#'))
        .map(|(i, l)| (i, l.split_whitespace().collect()))
}

fn parse_point(line: usize, fields: &[&str]) -> std::result::Result<Point3<f64>, String> {
    let [x, y, z] = fields else {
        return Err(format!("line {}: expected 3 coordinates, found {}", line, fields.len()));
    };
    let coord = |s: &str| {
        s.parse::<f64>()
            .map_err(|_| format!("line {}: invalid coordinate '{}'", line, s))
    };
    Ok(Point3::new(coord(*x)?, coord(*y)?, coord(*z)?))
}

fn parse_triangle(line: usize, fields: &[&str]) -> std::result::Result<[usize; 3], String> {
    let [i, j, k] = fields else {
        return Err(format!("line {}: expected 3 vertex indices, found {}", line, fields.len()));
    };
    Ok([parse_index(line, *i)?, parse_index(line, *j)?, parse_index(line, *k)?])
}

fn parse_index(line: usize, s: &str) -> std::result::Result<usize, String> {
    if let Ok(i) = s.parse::<usize>() {
        return Ok(i);
    }
    match s.parse::<f64>() {
        Ok(x) if x >= 0.0 && x.fract() == 0.0 && x < usize::MAX as f64 => Ok(x as usize),
        _ => Err(format!("line {}: invalid index '{}'", line, s)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::algo::geodesic::LocalMatrixBuilder;

    const SQUARE: &str = "4 2
0.0 0.0 0.0
1.0 0.0 0.0
1.0 1.0 0.0
0.0 1.0 0.0
0 1 2
0.000000000000000000e+00 2.000000000000000000e+00 3.000000000000000000e+00
";

    #[test]
    fn test_parse_single_file() {
        let (vertices, faces) = parse_mesh(SQUARE).unwrap();
        assert_eq!(vertices.len(), 4);
        assert_eq!(vertices[3], Point3::new(0.0, 1.0, 0.0));
        assert_eq!(faces, vec![[0, 1, 2], [0, 2, 3]]);
    }

    #[test]
    fn test_parse_skips_comments_and_blank_lines() {
        let text = "# square\n\n4 2\n0 0 0\n1 0 0\n\n1 1 0\n0 1 0\n0 1 2\n0 2 3\n";
        let (vertices, faces) = parse_mesh(text).unwrap();
        assert_eq!(vertices.len(), 4);
        assert_eq!(faces.len(), 2);
    }

    #[test]
    fn test_parse_errors() {
        assert!(parse_mesh("").is_err());
        assert!(parse_mesh("1 2 3\n").is_err());
        // Truncated
        assert!(parse_mesh("4 2\n0 0 0\n").is_err());
        // Negative and fractional indices
        assert!(parse_mesh("3 1\n0 0 0\n1 0 0\n0 1 0\n0 1 -2\n").is_err());
        assert!(parse_mesh("3 1\n0 0 0\n1 0 0\n0 1 0\n0 1 1.5\n").is_err());
        // Bad coordinate
        let err = parse_mesh("3 1\n0 0 0\n1 x 0\n0 1 0\n0 1 2\n").unwrap_err();
        assert!(err.contains("line 3"));
    }

    #[test]
    fn test_load_files() {
        let dir = std::env::temp_dir().join(format!("gdist-text-{}", std::process::id()));
        fs::create_dir_all(&dir).unwrap();

        let single = dir.join("square.txt");
        fs::write(&single, SQUARE).unwrap();
        let mesh = load(&single).unwrap();
        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);

        let vertices = dir.join("vertices.txt");
        let triangles = dir.join("triangles.txt");
        fs::write(&vertices, "0 0 0\n1 0 0\n1 1 0\n0 1 0\n").unwrap();
        fs::write(&triangles, "0 1 2\n0 2 3\n").unwrap();
        let pair = load_pair(&vertices, &triangles).unwrap();
        assert_eq!(pair.num_edges(), mesh.num_edges());

        fs::write(&triangles, "0 1\n").unwrap();
        let err = load_pair(&vertices, &triangles).unwrap_err();
        assert!(matches!(err, GeodesicError::LoadError { .. }));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_write_matrix() {
        let (vertices, faces) = parse_mesh(SQUARE).unwrap();
        let mesh = build_from_triangles(&vertices, &faces).unwrap();
        let matrix = LocalMatrixBuilder::new(&mesh)
            .with_max_distance(1.0)
            .build()
            .unwrap();

        let mut out = Vec::new();
        write_matrix(&mut out, &matrix).unwrap();
        let text = String::from_utf8(out).unwrap();
        assert_eq!(text.lines().count(), 8);
        let first: Vec<&str> = text.lines().next().unwrap().split(' ').collect();
        assert_eq!(&first[..2], &["0", "1"]);
        assert!((first[2].parse::<f64>().unwrap() - 1.0).abs() < 1e-12);

        let mut out = Vec::new();
        write_distances(&mut out, &[3], &[0.5]).unwrap();
        assert_eq!(String::from_utf8(out).unwrap(), "3 5.00000000000000000e-1\n");
    }
}
