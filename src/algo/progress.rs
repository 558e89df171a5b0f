//! Progress reporting for long-running computations.
//!
//! Building a local distance matrix runs one propagation per vertex, which
//! can take minutes on a full cortical surface. Callers that want feedback
//! pass a [`Progress`] callback to the builder.
//!
//! # Example
//!
//! ```
//! use gdist::algo::geodesic::LocalMatrixBuilder;
//! use gdist::algo::progress::Progress;
//! use gdist::mesh::build_from_flat;
//!
//! let vertices = [0.0, 0.0, 0.0, 1.0, 0.0, 0.0, 0.0, 1.0, 0.0];
//! let mesh = build_from_flat(&vertices, &[0, 1, 2]).unwrap();
//!
//! let progress = Progress::new(|current, total, message| {
//!     eprintln!("[{}/{}] {}", current, total, message);
//! });
//! let matrix = LocalMatrixBuilder::new(&mesh)
//!     .with_progress(progress)
//!     .build()
//!     .unwrap();
//! assert_eq!(matrix.len(), 6);
//! ```

/// A progress callback that receives updates during long-running operations.
///
/// The callback receives:
/// - `current`: Number of completed steps
/// - `total`: Total number of steps
/// - `message`: Description of the current operation
///
/// Callbacks may be invoked concurrently from worker threads, and completed
/// steps may be reported out of order.
pub struct Progress {
    callback: Box<dyn Fn(usize, usize, &str) + Send + Sync>,
}

impl Progress {
    /// Create a new progress reporter with the given callback.
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(usize, usize, &str) + Send + Sync + 'static,
    {
        Self {
            callback: Box::new(callback),
        }
    }

    /// Report progress.
    #[inline]
    pub fn report(&self, current: usize, total: usize, message: &str) {
        (self.callback)(current, total, message);
    }

    /// Create a no-op progress reporter that discards all updates.
    pub fn none() -> Self {
        Self::new(|_, _, _| {})
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::none()
    }
}

impl std::fmt::Debug for Progress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Progress").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[test]
    fn test_report_forwards_to_callback() {
        let calls = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&calls);
        let progress = Progress::new(move |current, total, message| {
            assert!(current <= total);
            assert_eq!(message, "rows");
            counter.fetch_add(1, Ordering::SeqCst);
        });

        for i in 1..=3 {
            progress.report(i, 3, "rows");
        }
        assert_eq!(calls.load(Ordering::SeqCst), 3);
    }

    #[test]
    fn test_none_is_silent() {
        let progress = Progress::default();
        progress.report(1, 2, "ignored");
        assert_eq!(format!("{:?}", progress), "Progress { .. }");
    }
}
