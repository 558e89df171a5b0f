//! Mesh file I/O.
//!
//! # Supported Formats
//!
//! | Format | Extension | Notes |
//! |--------|-----------|-------|
//! | PLY | `.ply` | ASCII and binary, polygons fan-triangulated |
//! | STL | `.stl` | ASCII and binary, corners welded |
//! | Text | `.txt` | `V F` header, then vertex and triangle rows |
//!
//! Meshes stored as separate vertex and triangle text files are loaded with
//! [`text::load_pair`].
//!
//! # Usage
//!
//! ```no_run
//! use gdist::io::load;
//!
//! // Load with automatic format detection
//! let mesh = load("hedgehog_mesh.txt").unwrap();
//! ```

pub mod ply;
pub mod stl;
pub mod text;

use std::path::Path;

use crate::error::{GeodesicError, Result};
use crate::mesh::GeodesicMesh;

/// Supported mesh file formats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Format {
    /// PLY (Stanford polygon) format.
    Ply,
    /// STL (stereolithography) format.
    Stl,
    /// Whitespace separated text with a `V F` header.
    Text,
}

impl Format {
    /// Detect format from file extension.
    pub fn from_extension(ext: &str) -> Option<Format> {
        match ext.to_lowercase().as_str() {
            "ply" => Some(Format::Ply),
            "stl" => Some(Format::Stl),
            "txt" => Some(Format::Text),
            _ => None,
        }
    }

    /// Detect format from file path.
    pub fn from_path<P: AsRef<Path>>(path: P) -> Option<Format> {
        path.as_ref()
            .extension()
            .and_then(|ext| ext.to_str())
            .and_then(Format::from_extension)
    }
}

/// Load a mesh from a file with automatic format detection.
///
/// The format is determined by the file extension.
pub fn load<P: AsRef<Path>>(path: P) -> Result<GeodesicMesh> {
    let path = path.as_ref();
    let format = Format::from_path(path).ok_or_else(|| GeodesicError::UnsupportedFormat {
        extension: path
            .extension()
            .and_then(|e| e.to_str())
            .unwrap_or("(none)")
            .to_string(),
    })?;

    load_as(path, format)
}

/// Load a mesh from a file in the given format, ignoring its extension.
pub fn load_as<P: AsRef<Path>>(path: P, format: Format) -> Result<GeodesicMesh> {
    match format {
        Format::Ply => ply::load(path),
        Format::Stl => stl::load(path),
        Format::Text => text::load(path),
    }
}
