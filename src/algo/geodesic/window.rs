//! Windows: edge intervals carrying a planar distance function.
//!
//! A window lives on one edge and covers `[start, end]` in that edge's
//! local frame (`vertices[0]` at `x = 0`, `vertices[1]` at `x = length`).
//! Its pseudo-source sits at `(source_x, -source_depth)`: behind the edge,
//! on the side of the face the wavefront came from, with the face it moves
//! into (`to_face`) laid out on `+y`. The geodesic distance at `x` is
//!
//! ```text
//! sigma + sqrt((x - source_x)^2 + source_depth^2)
//! ```
//!
//! where `sigma` is the distance from the true source to the pseudo-source.

use crate::mesh::{EdgeId, FaceId, VertexId};

/// Relative tolerance used when comparing two distances.
///
/// A newcomer only displaces an existing distance if it is smaller by more
/// than this margin, so exact ties keep the earlier value.
pub(crate) const TIE_EPS: f64 = 1e-12;

/// Returns true if `candidate` beats `incumbent` by more than the tie margin.
#[inline]
pub(crate) fn strictly_less(candidate: f64, incumbent: f64) -> bool {
    candidate < incumbent - TIE_EPS * (1.0 + incumbent.abs())
}

/// An interval of an edge with a single winning pseudo-source.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Window {
    /// The edge this window lies on.
    pub edge: EdgeId,
    /// Start of the interval along the edge.
    pub start: f64,
    /// End of the interval along the edge.
    pub end: f64,
    /// Pseudo-source coordinate along the edge.
    pub source_x: f64,
    /// Pseudo-source distance from the edge line (non-negative).
    pub source_depth: f64,
    /// Geodesic distance from the true source to the pseudo-source.
    pub sigma: f64,
    /// The true source vertex this window's distances accrue to.
    pub source: VertexId,
    /// The face on the far side of the edge, or invalid on the boundary.
    pub to_face: FaceId,
    /// Smallest distance attained over `[start, end]`.
    pub min_distance: f64,
}

impl Window {
    /// Create a window and compute its minimum distance.
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        edge: EdgeId,
        start: f64,
        end: f64,
        source_x: f64,
        source_depth: f64,
        sigma: f64,
        source: VertexId,
        to_face: FaceId,
    ) -> Self {
        let mut window = Self {
            edge,
            start,
            end,
            source_x,
            source_depth,
            sigma,
            source,
            to_face,
            min_distance: 0.0,
        };
        window.min_distance = window.compute_min_distance();
        window
    }

    /// The same distance function restricted to `[start, end]`.
    pub fn with_bounds(&self, start: f64, end: f64) -> Self {
        let mut window = Self { start, end, ..*self };
        window.min_distance = window.compute_min_distance();
        window
    }

    /// Length of the interval.
    #[inline]
    pub fn len(&self) -> f64 {
        self.end - self.start
    }

    /// Check if the interval is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.end <= self.start
    }

    /// Geodesic distance at edge coordinate `x`.
    #[inline]
    pub fn distance_at(&self, x: f64) -> f64 {
        self.sigma + (x - self.source_x).hypot(self.source_depth)
    }

    fn compute_min_distance(&self) -> f64 {
        let dx = if self.source_x < self.start {
            self.start - self.source_x
        } else if self.source_x > self.end {
            self.source_x - self.end
        } else {
            0.0
        };
        self.sigma + dx.hypot(self.source_depth)
    }

    /// Points strictly inside `(lo, hi)` where this window's distance
    /// function may cross `other`'s, in increasing order.
    ///
    /// Squaring introduces spurious roots, so callers must re-evaluate both
    /// functions between consecutive crossings instead of trusting the
    /// ordering implied by the roots.
    pub fn crossings(&self, other: &Window, lo: f64, hi: f64) -> Crossings {
        let (s1, h1, s2, h2) = (self.source_x, self.source_depth, other.source_x, other.source_depth);
        let ds = other.sigma - self.sigma;
        // r1^2 - r2^2 = alpha * x + beta
        let alpha = 2.0 * (s2 - s1);
        let beta = s1 * s1 + h1 * h1 - s2 * s2 - h2 * h2;

        let mut out = Crossings::default();
        let scale = 1.0 + self.sigma.abs().max(other.sigma.abs());
        if ds.abs() <= TIE_EPS * scale {
            // Equal offsets: the functions cross where r1 == r2
            if alpha != 0.0 {
                out.push_inside(-beta / alpha, lo, hi);
            }
            return out;
        }

        // r1 - r2 = ds  =>  4 ds^2 r1^2 = (ds^2 + alpha x + beta)^2
        let ds2 = ds * ds;
        let k = ds2 + beta;
        let a = 4.0 * ds2 - alpha * alpha;
        let b = -8.0 * ds2 * s1 - 2.0 * alpha * k;
        let c = 4.0 * ds2 * (s1 * s1 + h1 * h1) - k * k;

        for root in solve_quadratic(a, b, c).into_iter().flatten() {
            out.push_inside(root, lo, hi);
        }
        out
    }
}

/// Up to two sorted crossing points.
#[derive(Debug, Clone, Copy, Default)]
pub struct Crossings {
    points: [f64; 2],
    len: usize,
}

impl Crossings {
    fn push_inside(&mut self, x: f64, lo: f64, hi: f64) {
        if !(x > lo && x < hi) || self.len == 2 {
            return;
        }
        if self.len == 1 && (self.points[0] - x).abs() <= f64::EPSILON * hi.abs().max(1.0) {
            return;
        }
        self.points[self.len] = x;
        self.len += 1;
        if self.len == 2 && self.points[0] > self.points[1] {
            self.points.swap(0, 1);
        }
    }

    /// The crossing points as a slice.
    pub fn as_slice(&self) -> &[f64] {
        &self.points[..self.len]
    }
}

/// Real roots of `a x^2 + b x + c = 0` using the cancellation-free form.
fn solve_quadratic(a: f64, b: f64, c: f64) -> [Option<f64>; 2] {
    let magnitude = b.abs().max(c.abs());
    if a.abs() <= 1e-14 * magnitude || a == 0.0 {
        // Effectively linear
        if b != 0.0 {
            return [Some(-c / b), None];
        }
        return [None, None];
    }

    let mut disc = b * b - 4.0 * a * c;
    if disc < 0.0 {
        // Tangency lost to rounding
        if disc > -1e-12 * b * b {
            disc = 0.0;
        } else {
            return [None, None];
        }
    }

    let q = -0.5 * (b + b.signum() * disc.sqrt());
    if q == 0.0 {
        // b == 0 and disc == 0 imply c == 0
        return [Some(0.0), None];
    }
    [Some(q / a), Some(c / q)]
}
