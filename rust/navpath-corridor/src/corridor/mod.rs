//! Corridor state: the portal chains of one funnel part of a path and the
//! nodes they were extracted from.

pub mod portal;

use itertools::Itertools;
use rustc_hash::FxHashSet;
use tracing::debug;

use crate::error::CorridorError;
use crate::funnel;
use crate::geometry::Point;
use crate::mesh::{NavMesh, NodeIndex};
use crate::options::{CorridorOptions, Simplification};
use crate::simplify::Simplifier;

pub use portal::{portal, Portal};

/// `left[0] == right[0] == exact_start`, `left[last] == right[last] == exact_end`
/// and `left.len() == right.len() == nodes.len() + 1` once built.
///
/// Buffers are cleared, never freed, on rebuild so a corridor can be pooled.
#[derive(Clone, Debug, Default)]
pub struct Corridor {
    pub(crate) left: Vec<Point>,
    pub(crate) right: Vec<Point>,
    pub(crate) nodes: Vec<NodeIndex>,
    pub(crate) current_node: usize,
    pub(crate) exact_start: Point,
    pub(crate) exact_end: Point,
    pub(crate) last_position: Point,
    pub(crate) ticks_since_destroyed_check: u32,
    pub(crate) trace_buf: Vec<NodeIndex>,
    pub(crate) visited: FxHashSet<NodeIndex>,
}

impl Corridor {
    pub fn new() -> Self { Self::default() }

    /// Convenience for building into a fresh corridor.
    pub fn new_built(
        mesh: &NavMesh,
        nodes: &[NodeIndex],
        exact_start: Point,
        exact_end: Point,
        opts: &CorridorOptions,
    ) -> Result<Self, CorridorError> {
        let mut c = Self::new();
        c.build(mesh, nodes, exact_start, exact_end, opts)?;
        Ok(c)
    }

    /// Clears all state, keeping the allocations.
    pub fn reset(&mut self) {
        self.left.clear();
        self.right.clear();
        self.nodes.clear();
        self.trace_buf.clear();
        self.visited.clear();
        self.current_node = 0;
        self.ticks_since_destroyed_check = 0;
        self.exact_start = [0.0; 3];
        self.exact_end = [0.0; 3];
        self.last_position = [0.0; 3];
    }

    /// Rebuilds the corridor in place from a run of adjacent nodes.
    ///
    /// The endpoints are clamped onto the first and last node, the run is
    /// simplified when the options ask for it and the mesh supports linecasts,
    /// then one portal is extracted per consecutive node pair.
    pub fn build(
        &mut self,
        mesh: &NavMesh,
        nodes: &[NodeIndex],
        exact_start: Point,
        exact_end: Point,
        opts: &CorridorOptions,
    ) -> Result<(), CorridorError> {
        self.reset();
        let (Some(&first), Some(&last)) = (nodes.first(), nodes.last()) else {
            return Err(CorridorError::EmptyPath);
        };
        if let Some(&bad) = nodes.iter().find(|&&n| !mesh.contains_node(n)) {
            return Err(CorridorError::UnknownNode(bad));
        }

        self.exact_start = mesh.closest_point_on_node_xz(first, exact_start);
        self.exact_end = mesh.closest_point_on_node_xz(last, exact_end);
        self.last_position = self.exact_start;

        if opts.simplification != Simplification::None && mesh.supports_linecast() && nodes.len() > 2 {
            let mut simplifier = Simplifier::new(mesh, nodes, opts).with_trace_buffer(std::mem::take(&mut self.trace_buf));
            simplifier.run(opts.simplification, 0, nodes.len() - 1, self.exact_start, self.exact_end, &mut self.nodes);
            self.trace_buf = simplifier.into_trace_buffer();
        } else {
            self.nodes.extend_from_slice(nodes);
        }

        self.rebuild_portals(mesh)?;
        debug!(
            input_nodes = nodes.len(),
            nodes = self.nodes.len(),
            mode = ?opts.simplification,
            "built corridor"
        );
        Ok(())
    }

    /// Re-extracts `left`/`right` from `nodes` and the stored exact endpoints.
    pub(crate) fn rebuild_portals(&mut self, mesh: &NavMesh) -> Result<(), CorridorError> {
        self.left.clear();
        self.right.clear();
        self.left.push(self.exact_start);
        self.right.push(self.exact_start);
        for (a, b) in self.nodes.iter().copied().tuple_windows() {
            let p = portal(mesh, a, b)?;
            self.left.push(p.left);
            self.right.push(p.right);
        }
        self.left.push(self.exact_end);
        self.right.push(self.exact_end);
        Ok(())
    }

    /// Replaces every node before `keep_from` with `new_first` and restarts
    /// the corridor at `new_start`.
    ///
    /// `new_first` must share an edge with `nodes[keep_from]`.
    pub fn replace_prefix(
        &mut self,
        mesh: &NavMesh,
        keep_from: usize,
        new_first: NodeIndex,
        new_start: Point,
    ) -> Result<(), CorridorError> {
        if keep_from >= self.nodes.len() { return Err(CorridorError::EmptyPath); }
        let next = self.nodes[keep_from];
        if mesh.shared_edge(new_first, next).is_none() {
            return Err(CorridorError::NotAdjacent { a: new_first, b: next });
        }
        self.nodes.drain(..keep_from);
        self.nodes.insert(0, new_first);
        self.exact_start = new_start;
        self.last_position = new_start;
        self.current_node = 0;
        self.rebuild_portals(mesh)?;
        debug!(dropped = keep_from, nodes = self.nodes.len(), new_first, "spliced corridor prefix");
        Ok(())
    }

    /// Next corners from `origin`, starting at the node the agent is on.
    /// Returns true when the final corner is the corridor end.
    pub fn next_corners(&self, origin: Point, max_corners: usize, eps: f64, out: &mut Vec<Point>) -> bool {
        funnel::next_corners(self, origin, self.current_node, max_corners, eps, out)
    }

    #[inline]
    pub fn left(&self) -> &[Point] { &self.left }

    #[inline]
    pub fn right(&self) -> &[Point] { &self.right }

    #[inline]
    pub fn nodes(&self) -> &[NodeIndex] { &self.nodes }

    #[inline]
    pub fn current_node(&self) -> usize { self.current_node }

    #[inline]
    pub fn current_poly(&self) -> Option<NodeIndex> { self.nodes.get(self.current_node).copied() }

    #[inline]
    pub fn exact_start(&self) -> Point { self.exact_start }

    #[inline]
    pub fn exact_end(&self) -> Point { self.exact_end }

    /// Last position accepted by the localizer.
    #[inline]
    pub fn last_position(&self) -> Point { self.last_position }

    #[inline]
    pub fn is_built(&self) -> bool { !self.nodes.is_empty() }
}

/// Free list of corridor buffers so agents can rebuild paths without
/// reallocating every time.
#[derive(Debug, Default)]
pub struct CorridorPool {
    free: Vec<Corridor>,
}

impl CorridorPool {
    pub fn new() -> Self { Self::default() }

    pub fn with_capacity(n: usize) -> Self {
        Self { free: (0..n).map(|_| Corridor::new()).collect() }
    }

    /// A reset corridor, reused from the free list when possible.
    pub fn claim(&mut self) -> Corridor {
        self.free.pop().unwrap_or_default()
    }

    pub fn release(&mut self, mut corridor: Corridor) {
        corridor.reset();
        self.free.push(corridor);
    }

    pub fn len_free(&self) -> usize { self.free.len() }
}
