//! Continuous Dijkstra: window propagation over the mesh.
//!
//! The engine keeps, per edge, a sorted list of non-overlapping [`Window`]s
//! and a priority queue keyed by each window's minimum distance. Popping a
//! window unfolds the face on its far side and projects the window onto the
//! face's two other edges. Each projected candidate is merged into the
//! target edge, where it only keeps the pieces on which it is strictly
//! closer than the windows already there.
//!
//! Saddle and boundary vertices act as secondary pseudo-sources: when such a
//! vertex receives a better distance, a vertex event is queued and later
//! expands a fan of windows over the edges opposite the vertex.
//!
//! Superseded queue entries are never removed from the heap. Window entries
//! are recognised as stale through the window's state, vertex entries
//! through a per-vertex generation counter.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use crate::error::{GeodesicError, Result};
use crate::mesh::{EdgeId, GeodesicMesh, VertexId};

use super::window::{strictly_less, Window};

/// Windows shorter than this fraction of their edge are discarded.
const MIN_WINDOW_RATIO: f64 = 1e-10;

/// Pseudo-sources closer to the target edge line than this fraction of its
/// length produce grazing windows and are skipped.
const MIN_DEPTH_RATIO: f64 = 1e-12;

// ==================== Vertex distances ====================

/// Best known distance of every vertex during a propagation.
///
/// Distances only ever decrease. A vertex is finalized once the propagation
/// frontier has passed its distance.
#[derive(Debug, Clone)]
pub struct VertexDistanceTable {
    distances: Vec<f64>,
    sources: Vec<VertexId>,
    generations: Vec<u32>,
    /// Vertices with a finite distance, in the order they were first reached.
    reached: Vec<VertexId>,
    frontier: f64,
}

impl VertexDistanceTable {
    /// Create a table for `n` vertices, all unreached.
    pub fn new(n: usize) -> Self {
        Self {
            distances: vec![f64::INFINITY; n],
            sources: vec![VertexId::invalid(); n],
            generations: vec![0; n],
            reached: Vec::new(),
            frontier: 0.0,
        }
    }

    /// Forget every reached vertex. Costs time proportional to the number
    /// of vertices reached, not the size of the mesh.
    pub fn reset(&mut self) {
        for &v in &self.reached {
            self.distances[v.index()] = f64::INFINITY;
            self.sources[v.index()] = VertexId::invalid();
            self.generations[v.index()] = 0;
        }
        self.reached.clear();
        self.frontier = 0.0;
    }

    /// Number of vertices in the table.
    #[inline]
    pub fn len(&self) -> usize {
        self.distances.len()
    }

    /// Check if the table is empty.
    #[inline]
    pub fn is_empty(&self) -> bool {
        self.distances.is_empty()
    }

    /// Best known distance, `f64::INFINITY` if unreached.
    #[inline]
    pub fn distance(&self, v: VertexId) -> f64 {
        self.distances[v.index()]
    }

    /// The source the best known distance accrues to.
    #[inline]
    pub fn source(&self, v: VertexId) -> Option<VertexId> {
        self.sources[v.index()].valid()
    }

    /// All distances, indexed by vertex.
    #[inline]
    pub fn distances(&self) -> &[f64] {
        &self.distances
    }

    /// All best sources, indexed by vertex (invalid if unreached).
    #[inline]
    pub fn sources(&self) -> &[VertexId] {
        &self.sources
    }

    /// Smallest distance that may still be improved.
    ///
    /// Every vertex whose distance is at most the frontier is final.
    #[inline]
    pub fn frontier(&self) -> f64 {
        self.frontier
    }

    /// Check if a vertex's distance can no longer improve.
    #[inline]
    pub fn is_finalized(&self, v: VertexId) -> bool {
        self.distances[v.index()] <= self.frontier
    }

    /// Vertices with a finite distance and their distances.
    pub fn reached(&self) -> impl Iterator<Item = (VertexId, f64)> + '_ {
        self.reached.iter().map(|&v| (v, self.distances[v.index()]))
    }

    #[inline]
    pub(crate) fn generation(&self, v: VertexId) -> u32 {
        self.generations[v.index()]
    }

    /// Lower a vertex's distance. Returns true if `distance` beats the
    /// current value by more than the tie margin.
    pub(crate) fn improve(&mut self, v: VertexId, distance: f64, source: VertexId) -> bool {
        let i = v.index();
        let current = self.distances[i];
        if current.is_finite() {
            if !strictly_less(distance, current) {
                return false;
            }
        } else {
            self.reached.push(v);
        }
        self.distances[i] = distance;
        self.sources[i] = source;
        self.generations[i] = self.generations[i].wrapping_add(1);
        true
    }
}

// ==================== Stop predicates ====================

/// Decides when a propagation may stop early.
pub trait StopPredicate {
    /// Distance beyond which no window is expanded.
    fn max_distance(&self) -> f64 {
        f64::INFINITY
    }

    /// Called before the next queue entry is expanded. `frontier` is that
    /// entry's lower bound; every vertex at or below it is already final.
    fn should_stop(&mut self, frontier: f64, table: &VertexDistanceTable) -> bool;
}

/// Stop once the frontier passes a distance cutoff.
#[derive(Debug, Clone, Copy)]
pub struct DistanceLimit(pub f64);

impl StopPredicate for DistanceLimit {
    fn max_distance(&self) -> f64 {
        self.0
    }

    fn should_stop(&mut self, frontier: f64, _table: &VertexDistanceTable) -> bool {
        frontier > self.0
    }
}

/// Stop once every target is final, or the frontier passes a cutoff.
#[derive(Debug, Clone)]
pub struct TargetsReached {
    pending: Vec<VertexId>,
    limit: f64,
    /// Smallest pending distance at the last recheck.
    next_check: f64,
    since_check: usize,
}

impl TargetsReached {
    /// Wait for `targets` under the cutoff `limit`.
    pub fn new(targets: &[VertexId], limit: f64) -> Self {
        let mut pending = targets.to_vec();
        pending.sort_unstable();
        pending.dedup();
        Self {
            pending,
            limit,
            next_check: f64::NEG_INFINITY,
            since_check: 0,
        }
    }

    /// Targets not yet final at the last recheck.
    pub fn pending(&self) -> &[VertexId] {
        &self.pending
    }
}

impl StopPredicate for TargetsReached {
    fn max_distance(&self) -> f64 {
        self.limit
    }

    fn should_stop(&mut self, frontier: f64, table: &VertexDistanceTable) -> bool {
        if frontier > self.limit {
            return true;
        }
        // Pending distances may drop between rechecks, so also rescan
        // periodically; the interval keeps the amortized cost constant.
        self.since_check += 1;
        if frontier >= self.next_check || self.since_check > self.pending.len() / 8 {
            self.since_check = 0;
            self.pending.retain(|&v| table.distance(v) > frontier);
            self.next_check = self
                .pending
                .iter()
                .map(|&v| table.distance(v))
                .fold(f64::INFINITY, f64::min);
        }
        self.pending.is_empty()
    }
}

// ==================== Statistics ====================

/// Counters describing one propagation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PropagationStats {
    /// Windows stored on edges, including trimmed copies.
    pub windows_created: usize,
    /// Windows unfolded across a face.
    pub windows_propagated: usize,
    /// Candidates that lost everywhere to existing windows.
    pub windows_rejected: usize,
    /// Saddle or boundary vertices expanded as pseudo-sources.
    pub vertex_expansions: usize,
    /// Largest queue length seen, stale entries included.
    pub peak_queue_len: usize,
}

// ==================== Queue ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum WindowState {
    /// Waiting in the queue.
    Queued,
    /// Already unfolded across its far face.
    Propagated,
    /// Never expanded: beyond the cutoff, or on a boundary edge.
    Frozen,
    /// Superseded by other windows.
    Dead,
}

#[derive(Debug, Clone, Copy)]
enum Event {
    Window(usize),
    Vertex { vertex: VertexId, generation: u32 },
}

/// Entry in the propagation queue.
#[derive(Debug, Clone, Copy)]
struct QueueEntry {
    key: f64,
    /// Insertion order, for deterministic FIFO tie-breaking.
    seq: u64,
    event: Event,
}

impl PartialEq for QueueEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for QueueEntry {}

impl PartialOrd for QueueEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for QueueEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        // Reverse ordering for min-heap behavior
        other
            .key
            .total_cmp(&self.key)
            .then_with(|| other.seq.cmp(&self.seq))
    }
}

// ==================== Edge coverage ====================

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Owner {
    Existing(usize),
    Candidate,
}

#[derive(Debug, Clone, Copy)]
struct Segment {
    start: f64,
    end: f64,
    owner: Owner,
}

impl Segment {
    fn new(start: f64, end: f64, owner: Owner) -> Self {
        Self { start, end, owner }
    }
}

// ==================== Engine ====================

/// Exact geodesic propagation over one mesh.
///
/// An engine owns its windows, queue, and distance table, and borrows the
/// mesh immutably. Each call to [`propagate`](Self::propagate) starts from
/// scratch, so one engine can serve many independent queries in turn.
///
/// # Example
///
/// ```
/// use gdist::algo::geodesic::{DistanceLimit, WindowPropagation};
/// use gdist::mesh::{build_from_triangles, VertexId};
/// use nalgebra::Point3;
///
/// let vertices = vec![
///     Point3::new(0.0, 0.0, 0.0),
///     Point3::new(1.0, 0.0, 0.0),
///     Point3::new(1.0, 1.0, 0.0),
///     Point3::new(0.0, 1.0, 0.0),
/// ];
/// let mesh = build_from_triangles(&vertices, &[[0, 1, 2], [0, 2, 3]]).unwrap();
///
/// let mut engine = WindowPropagation::new(&mesh);
/// engine.propagate(&[VertexId::new(1)], &mut DistanceLimit(f64::INFINITY)).unwrap();
/// let d = engine.table().distance(VertexId::new(3));
/// assert!((d - 2.0_f64.sqrt()).abs() < 1e-12);
/// ```
#[derive(Debug)]
pub struct WindowPropagation<'m> {
    mesh: &'m GeodesicMesh,
    windows: Vec<Window>,
    states: Vec<WindowState>,
    edge_windows: Vec<Vec<usize>>,
    touched_edges: Vec<EdgeId>,
    queue: BinaryHeap<QueueEntry>,
    table: VertexDistanceTable,
    limit: f64,
    seq: u64,
    stats: PropagationStats,
    scratch: Vec<Segment>,
}

impl<'m> WindowPropagation<'m> {
    /// Create an engine for `mesh`.
    pub fn new(mesh: &'m GeodesicMesh) -> Self {
        Self {
            mesh,
            windows: Vec::new(),
            states: Vec::new(),
            edge_windows: vec![Vec::new(); mesh.num_edges()],
            touched_edges: Vec::new(),
            queue: BinaryHeap::new(),
            table: VertexDistanceTable::new(mesh.num_vertices()),
            limit: f64::INFINITY,
            seq: 0,
            stats: PropagationStats::default(),
            scratch: Vec::new(),
        }
    }

    /// The mesh this engine propagates over.
    #[inline]
    pub fn mesh(&self) -> &'m GeodesicMesh {
        self.mesh
    }

    /// Distances from the last propagation.
    #[inline]
    pub fn table(&self) -> &VertexDistanceTable {
        &self.table
    }

    /// Consume the engine, keeping only the distance table.
    pub fn into_table(self) -> VertexDistanceTable {
        self.table
    }

    /// Counters from the last propagation.
    #[inline]
    pub fn stats(&self) -> PropagationStats {
        self.stats
    }

    /// Live windows covering `edge`, sorted along the edge.
    pub fn edge_windows(&self, edge: EdgeId) -> impl Iterator<Item = &Window> + '_ {
        self.edge_windows[edge.index()]
            .iter()
            .map(move |&id| &self.windows[id])
    }

    /// Discard all state from a previous propagation.
    pub fn reset(&mut self) {
        for &e in &self.touched_edges {
            self.edge_windows[e.index()].clear();
        }
        self.touched_edges.clear();
        self.windows.clear();
        self.states.clear();
        self.queue.clear();
        self.table.reset();
        self.limit = f64::INFINITY;
        self.seq = 0;
        self.stats = PropagationStats::default();
    }

    /// Propagate from `sources` (all at distance 0) until `stop` says so or
    /// the queue runs dry.
    ///
    /// Duplicate sources are ignored. An empty source list leaves every
    /// vertex unreached.
    ///
    /// # Errors
    ///
    /// [`GeodesicError::IndexOutOfRange`] if a source is not a mesh vertex.
    /// Nothing is propagated in that case.
    pub fn propagate<P: StopPredicate>(&mut self, sources: &[VertexId], stop: &mut P) -> Result<()> {
        let n = self.mesh.num_vertices();
        if let Some(bad) = sources.iter().find(|v| v.index() >= n) {
            return Err(GeodesicError::IndexOutOfRange {
                index: bad.index(),
                vertex_count: n,
            });
        }

        self.reset();
        self.limit = stop.max_distance();

        for &s in sources {
            if self.table.improve(s, 0.0, s) {
                self.emit_fan(s, 0.0, s);
            }
        }

        loop {
            let Some(&top) = self.queue.peek() else {
                self.table.frontier = self.limit;
                break;
            };
            if !self.is_live(&top.event) {
                self.queue.pop();
                continue;
            }
            if stop.should_stop(top.key, &self.table) {
                self.table.frontier = self.table.frontier.max(top.key.min(self.limit));
                break;
            }
            self.queue.pop();
            self.table.frontier = self.table.frontier.max(top.key);

            match top.event {
                Event::Window(id) => self.propagate_window(id),
                Event::Vertex { vertex, .. } => {
                    self.stats.vertex_expansions += 1;
                    let distance = self.table.distance(vertex);
                    let source = self.table.sources[vertex.index()];
                    self.emit_fan(vertex, distance, source);
                }
            }
        }

        log::debug!(
            "propagated from {} source(s): {} windows created, {} propagated, {} rejected, \
             {} vertex expansions, peak queue {}",
            sources.len(),
            self.stats.windows_created,
            self.stats.windows_propagated,
            self.stats.windows_rejected,
            self.stats.vertex_expansions,
            self.stats.peak_queue_len,
        );
        Ok(())
    }

    fn is_live(&self, event: &Event) -> bool {
        match *event {
            Event::Window(id) => self.states[id] == WindowState::Queued,
            Event::Vertex { vertex, generation } => self.table.generation(vertex) == generation,
        }
    }

    fn push_event(&mut self, key: f64, event: Event) {
        self.queue.push(QueueEntry {
            key,
            seq: self.seq,
            event,
        });
        self.seq += 1;
        self.stats.peak_queue_len = self.stats.peak_queue_len.max(self.queue.len());
    }

    /// Emit windows from a point source at `v` onto the edge opposite `v`
    /// in every incident face.
    fn emit_fan(&mut self, v: VertexId, sigma: f64, source: VertexId) {
        let mesh = self.mesh;
        for &f in mesh.vertex_faces(v) {
            let Some(e) = mesh.face(f).opposite_edge(v) else {
                continue;
            };
            let edge = mesh.edge(e);
            let Some(side) = edge.side(f) else {
                continue;
            };
            // `v` is the apex of `f`; seen from the face beyond, it lies on -y
            let [x, y] = side.apex;
            let window = Window::new(e, 0.0, edge.length, x, y, sigma, source, edge.other_face(f));
            self.insert(window);
        }
    }

    /// Unfold the far face of a window and project it onto the face's other
    /// two edges.
    fn propagate_window(&mut self, id: usize) {
        self.states[id] = WindowState::Propagated;
        self.stats.windows_propagated += 1;

        let mesh = self.mesh;
        let window = self.windows[id];
        let face_id = window.to_face;
        let edge = mesh.edge(window.edge);
        let Some(side) = edge.side(face_id) else {
            return;
        };

        // The far face laid out in the window's edge frame
        let corners = [
            (edge.vertices[0], [0.0, 0.0]),
            (edge.vertices[1], [edge.length, 0.0]),
            (side.opposite, side.apex),
        ];
        let locate = |v: VertexId| corners.iter().find(|(c, _)| *c == v).map(|&(_, p)| p);

        for &target_id in &mesh.face(face_id).edges {
            if target_id == window.edge {
                continue;
            }
            let target = mesh.edge(target_id);
            let (Some(q0), Some(q1)) = (locate(target.vertices[0]), locate(target.vertices[1])) else {
                continue;
            };
            let Some(third) = corners
                .iter()
                .find(|(c, _)| !target.has_vertex(*c))
                .map(|&(_, p)| p)
            else {
                continue;
            };

            if let Some(projected) = project_window(&window, q0, q1, third, target.length) {
                let next = Window::new(
                    target_id,
                    projected.start,
                    projected.end,
                    projected.source_x,
                    projected.source_depth,
                    window.sigma,
                    window.source,
                    target.other_face(face_id),
                );
                self.insert(next);
            }
        }
    }

    /// Lower the distance of a saddle or boundary vertex and queue its fan.
    fn update_vertex(&mut self, v: VertexId, distance: f64, source: VertexId) {
        if !self.table.improve(v, distance, source) {
            return;
        }
        if distance <= self.limit && self.mesh.is_saddle_or_boundary(v) {
            let generation = self.table.generation(v);
            self.push_event(distance, Event::Vertex { vertex: v, generation });
        }
    }

    /// Store a window with the given state, queueing it if it can expand.
    fn spawn(&mut self, window: Window, state: WindowState) -> usize {
        let state = match state {
            WindowState::Queued if !window.to_face.is_valid() || window.min_distance > self.limit => {
                WindowState::Frozen
            }
            s => s,
        };
        let id = self.windows.len();
        self.windows.push(window);
        self.states.push(state);
        self.stats.windows_created += 1;
        if state == WindowState::Queued {
            self.push_event(window.min_distance, Event::Window(id));
        }
        id
    }

    /// Merge a candidate into its edge, keeping it only where it is strictly
    /// closer than the current coverage.
    fn insert(&mut self, candidate: Window) {
        let e = candidate.edge;
        let mesh = self.mesh;
        let edge = mesh.edge(e);
        let length = edge.length;
        let min_len = MIN_WINDOW_RATIO * length;

        // Endpoint values are genuine path lengths whether or not the
        // candidate survives the merge
        if candidate.start <= min_len {
            self.update_vertex(edge.vertices[0], candidate.distance_at(0.0), candidate.source);
        }
        if candidate.end >= length - min_len {
            self.update_vertex(edge.vertices[1], candidate.distance_at(length), candidate.source);
        }

        if candidate.len() <= min_len {
            self.stats.windows_rejected += 1;
            return;
        }

        let existing = std::mem::take(&mut self.edge_windows[e.index()]);
        if existing.is_empty() {
            self.touched_edges.push(e);
        }
        let mut segments = std::mem::take(&mut self.scratch);
        segments.clear();

        let (c0, c1) = (candidate.start, candidate.end);
        let mut cursor = c0;
        for &id in &existing {
            let w = self.windows[id];
            if w.end <= c0 {
                segments.push(Segment::new(w.start, w.end, Owner::Existing(id)));
                continue;
            }
            if w.start >= c1 {
                if cursor < c1 {
                    segments.push(Segment::new(cursor, c1, Owner::Candidate));
                    cursor = c1;
                }
                segments.push(Segment::new(w.start, w.end, Owner::Existing(id)));
                continue;
            }

            if w.start < c0 {
                segments.push(Segment::new(w.start, c0, Owner::Existing(id)));
            }
            let (o0, o1) = (w.start.max(c0), w.end.min(c1));
            if o0 > cursor {
                segments.push(Segment::new(cursor, o0, Owner::Candidate));
            }
            split_overlap(&candidate, id, &w, o0, o1, &mut segments);
            cursor = o1;
            if w.end > c1 {
                segments.push(Segment::new(c1, w.end, Owner::Existing(id)));
            }
        }
        if cursor < c1 {
            segments.push(Segment::new(cursor, c1, Owner::Candidate));
        }

        merge_runs(&mut segments, 0.0);
        // Slivers carry no useful coverage, except windows that were already
        // that short and are left untouched
        segments.retain(|s| {
            s.end - s.start >= min_len
                || matches!(s.owner, Owner::Existing(id)
                    if self.windows[id].start == s.start && self.windows[id].end == s.end)
        });
        merge_runs(&mut segments, min_len);

        let mut rebuilt = Vec::with_capacity(segments.len());
        let mut accepted = false;
        for s in &segments {
            match s.owner {
                Owner::Existing(id) => {
                    let w = self.windows[id];
                    if w.start == s.start && w.end == s.end {
                        rebuilt.push(id);
                    } else {
                        let state = self.states[id];
                        rebuilt.push(self.spawn(w.with_bounds(s.start, s.end), state));
                    }
                }
                Owner::Candidate => {
                    accepted = true;
                    rebuilt.push(self.spawn(candidate.with_bounds(s.start, s.end), WindowState::Queued));
                }
            }
        }
        for &id in &existing {
            if !rebuilt.contains(&id) {
                self.states[id] = WindowState::Dead;
            }
        }
        if !accepted {
            self.stats.windows_rejected += 1;
        }

        self.edge_windows[e.index()] = rebuilt;
        self.scratch = segments;
    }
}

/// Assign each piece of `[o0, o1]` to whichever of the candidate and the
/// existing window `w` is closer there. Ties keep the existing window.
fn split_overlap(candidate: &Window, id: usize, w: &Window, o0: f64, o1: f64, out: &mut Vec<Segment>) {
    let crossings = candidate.crossings(w, o0, o1);
    let mut cuts = [o0; 4];
    let mut n = 1;
    for &x in crossings.as_slice() {
        cuts[n] = x;
        n += 1;
    }
    cuts[n] = o1;
    n += 1;

    for pair in cuts[..n].windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let mid = 0.5 * (a + b);
        let owner = if strictly_less(candidate.distance_at(mid), w.distance_at(mid)) {
            Owner::Candidate
        } else {
            Owner::Existing(id)
        };
        out.push(Segment::new(a, b, owner));
    }
}

/// Merge neighbouring segments with the same owner separated by at most `gap`.
fn merge_runs(segments: &mut Vec<Segment>, gap: f64) {
    segments.dedup_by(|next, prev| {
        if prev.owner == next.owner && next.start - prev.end <= gap {
            prev.end = next.end;
            true
        } else {
            false
        }
    });
}

/// A window projected onto another edge of the face it enters.
#[derive(Debug, Clone, Copy)]
struct Projection {
    start: f64,
    end: f64,
    source_x: f64,
    source_depth: f64,
}

/// Project `window` through its far face onto the edge `q0 -> q1`.
///
/// All points are in the window's edge frame, where the far face lies on
/// `+y` and the pseudo-source at `(source_x, -source_depth)`. `third` is the
/// face corner not on the target edge. Returns `None` if no ray from the
/// pseudo-source through the window hits the target edge.
fn project_window(window: &Window, q0: [f64; 2], q1: [f64; 2], third: [f64; 2], length: f64) -> Option<Projection> {
    let (sx, h) = (window.source_x, window.source_depth);
    if h <= 0.0 {
        return None;
    }

    // Where the ray from the pseudo-source through p crosses the window's edge
    let project = |p: [f64; 2]| sx + (p[0] - sx) * h / (p[1] + h);
    let (x0, x1) = (project(q0), project(q1));
    let ((xmin, tmin), (xmax, tmax)) = if x0 <= x1 {
        ((x0, 0.0), (x1, 1.0))
    } else {
        ((x1, 1.0), (x0, 0.0))
    };

    let lo = window.start.max(xmin);
    let hi = window.end.min(xmax);
    if hi <= lo {
        return None;
    }

    // Inverse of the projection along q0 + t (q1 - q0)
    let d = [q1[0] - q0[0], q1[1] - q0[1]];
    let param = |x: f64| -> Option<f64> {
        let denom = d[0] * h - (x - sx) * d[1];
        if denom == 0.0 {
            return None;
        }
        Some(((x - sx) * (q0[1] + h) - (q0[0] - sx) * h) / denom)
    };
    // Exact endpoints keep vertex hits exact
    let t_lo = if lo == xmin { tmin } else { param(lo)? };
    let t_hi = if hi == xmax { tmax } else { param(hi)? };
    let t0 = t_lo.min(t_hi).clamp(0.0, 1.0);
    let t1 = t_lo.max(t_hi).clamp(0.0, 1.0);
    let (start, end) = (t0 * length, t1 * length);
    if end - start <= MIN_WINDOW_RATIO * length {
        return None;
    }

    // Pseudo-source in the target edge frame, with the current face on +y
    let norm = d[0].hypot(d[1]);
    if norm == 0.0 {
        return None;
    }
    let u = [d[0] / norm, d[1] / norm];
    let n = [-u[1], u[0]];
    let rel = [sx - q0[0], -h - q0[1]];
    let source_x = rel[0] * u[0] + rel[1] * u[1];
    let across = rel[0] * n[0] + rel[1] * n[1];
    let facing = (third[0] - q0[0]) * n[0] + (third[1] - q0[1]) * n[1];
    let source_depth = if facing >= 0.0 { across } else { -across };
    if source_depth <= MIN_DEPTH_RATIO * length {
        return None;
    }

    Some(Projection {
        start,
        end,
        source_x,
        source_depth,
    })
}
