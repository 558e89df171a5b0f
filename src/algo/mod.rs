//! Geodesic algorithms and their supporting containers.
//!
//! - **Geodesics**: exact window propagation, distance queries, local
//!   distance matrices
//! - **Sparse**: compressed sparse column storage for distance matrices
//! - **Progress**: callbacks for long-running computations

pub mod geodesic;
pub mod progress;
pub mod sparse;
