//! Linecast-driven corridor simplification.
//!
//! All strategies replace stretches of the input run with the nodes a
//! straight linecast crosses, so consecutive output nodes still share an edge
//! and portals can be extracted from them. The first and last node of the
//! range are always kept and the order is never changed.

use tracing::error;

use crate::geometry::{segment_dist_sq_xz, Point};
use crate::mesh::{NavMesh, NodeIndex};
use crate::options::{CorridorOptions, Simplification};

pub struct Simplifier<'a> {
    mesh: &'a NavMesh,
    nodes: &'a [NodeIndex],
    opts: &'a CorridorOptions,
    trace: Vec<NodeIndex>,
}

impl<'a> Simplifier<'a> {
    pub fn new(mesh: &'a NavMesh, nodes: &'a [NodeIndex], opts: &'a CorridorOptions) -> Self {
        Self { mesh, nodes, opts, trace: Vec::new() }
    }

    /// Reuse a caller-owned buffer for linecast traces.
    pub fn with_trace_buffer(mut self, mut buf: Vec<NodeIndex>) -> Self {
        buf.clear();
        self.trace = buf;
        self
    }

    pub fn into_trace_buffer(self) -> Vec<NodeIndex> { self.trace }

    /// Simplifies `nodes[start..=end]` into `out`. `start_point` must lie in
    /// `nodes[start]` and `end_point` in `nodes[end]`.
    pub fn run(&mut self, mode: Simplification, start: usize, end: usize, start_point: Point, end_point: Point, out: &mut Vec<NodeIndex>) {
        assert!(start <= end && end < self.nodes.len(), "simplify range {start}..={end} out of bounds");
        match mode {
            Simplification::None => out.extend_from_slice(&self.nodes[start..=end]),
            Simplification::Iterative => self.iterative(start, end, start_point, end_point, out),
            Simplification::RecursiveBinary => self.recursive_binary(start, end, start_point, end_point, out),
            Simplification::RecursiveTrinary => self.recursive_trinary(start, end, start_point, end_point, out),
        }
    }

    /// Greedy forward pass: from each anchor, binary-search the furthest node
    /// a linecast reaches, and splice in its trace.
    pub fn iterative(&mut self, start: usize, end: usize, start_point: Point, end_point: Point, out: &mut Vec<NodeIndex>) {
        if self.try_straight(start, end, start_point, end_point, out) { return; }

        let mut start = start;
        let first = start;
        let mut iterations = 0u32;
        loop {
            iterations += 1;
            if iterations > self.opts.max_simplify_iterations {
                error!(
                    iterations,
                    remaining = end + 1 - start,
                    "corridor simplification did not converge; keeping the rest unsimplified"
                );
                append_chain(out, &self.nodes[start..=end]);
                return;
            }
            if start == end {
                append_chain(out, &self.nodes[end..=end]);
                return;
            }

            let sp = if start == first { start_point } else { self.mesh.centroid(self.nodes[start]) };
            let mut mx = end + 1;
            let mut mn = start + 1;
            let mut any_reached = false;
            while mx > mn + 1 {
                let mid = (mx + mn) / 2;
                let ep = self.point_of(mid, end, end_point);
                if self.reaches(start, mid, sp, ep) {
                    any_reached = true;
                    mn = mid;
                } else {
                    mx = mid;
                }
            }

            if !any_reached {
                append_chain(out, &self.nodes[start..=start]);
                start += 1;
                continue;
            }

            let ep = self.point_of(mn, end, end_point);
            self.trace.clear();
            let hit = self.mesh.linecast(self.nodes[start], sp, ep, &mut self.trace);
            if !hit.blocked && self.trace.last() == Some(&self.nodes[mn]) && self.accept_trace(start, mn) {
                // nodes[mn] is emitted as the next anchor
                let keep = self.trace.len() - 1;
                append_chain(out, &self.trace[..keep]);
                start = mn;
            } else {
                append_chain(out, &self.nodes[start..=start]);
                start += 1;
            }
        }
    }

    /// Splits at the intermediate node closest to the straight segment until
    /// every piece is a clear linecast.
    pub fn recursive_binary(&mut self, start: usize, end: usize, start_point: Point, end_point: Point, out: &mut Vec<NodeIndex>) {
        if end <= start + 1 {
            append_chain(out, &self.nodes[start..=end]);
            return;
        }
        if self.try_straight(start, end, start_point, end_point, out) { return; }

        let mid = self.extreme_between(start, end, start_point, end_point, false);
        let mid_point = self.mesh.centroid(self.nodes[mid]);
        self.recursive_binary(start, mid, start_point, mid_point, out);
        self.recursive_binary(mid, end, mid_point, end_point, out);
    }

    /// Splits around the intermediate node furthest from the straight segment,
    /// at the midpoints between it and either end.
    pub fn recursive_trinary(&mut self, start: usize, end: usize, start_point: Point, end_point: Point, out: &mut Vec<NodeIndex>) {
        if end <= start + 1 {
            append_chain(out, &self.nodes[start..=end]);
            return;
        }
        if self.try_straight(start, end, start_point, end_point, out) { return; }

        let far = self.extreme_between(start, end, start_point, end_point, true);
        let mut splits: Vec<usize> = Vec::with_capacity(2);
        for q in [(far + start) / 2, (far + end) / 2] {
            if q > start && q < end && splits.last() != Some(&q) { splits.push(q); }
        }
        if splits.is_empty() { splits.push(far); }

        let mut seg_start = start;
        let mut seg_point = start_point;
        for &s in &splits {
            let p = self.mesh.centroid(self.nodes[s]);
            self.recursive_trinary(seg_start, s, seg_point, p, out);
            seg_start = s;
            seg_point = p;
        }
        self.recursive_trinary(seg_start, end, seg_point, end_point, out);
    }

    #[inline]
    fn point_of(&self, idx: usize, end: usize, end_point: Point) -> Point {
        if idx == end { end_point } else { self.mesh.centroid(self.nodes[idx]) }
    }

    /// A linecast from `nodes[from]` ends in `nodes[to]` without hitting a wall.
    /// Ending in some other node counts as a miss: the segment grazed past
    /// `nodes[to]` or reached a different floor.
    fn reaches(&mut self, from: usize, to: usize, sp: Point, ep: Point) -> bool {
        self.trace.clear();
        let hit = self.mesh.linecast(self.nodes[from], sp, ep, &mut self.trace);
        !hit.blocked && hit.node == self.nodes[to]
    }

    /// Replaces `nodes[start..=end]` with the straight trace if it is clear,
    /// reaches the right node and passes the penalty check.
    fn try_straight(&mut self, start: usize, end: usize, sp: Point, ep: Point, out: &mut Vec<NodeIndex>) -> bool {
        if !self.reaches(start, end, sp, ep) || !self.accept_trace(start, end) { return false; }
        append_chain(out, &self.trace);
        true
    }

    /// The trace in `self.trace` may stand in for `nodes[start..=end]` when it
    /// is no longer and its average node penalty is within `penalty_slack`
    /// of the replaced nodes' average.
    fn accept_trace(&self, start: usize, end: usize) -> bool {
        let replaced = &self.nodes[start..=end];
        let trace = &self.trace;
        if trace.is_empty() || trace.len() > replaced.len() { return false; }
        let p_replaced: u64 = replaced.iter().map(|&n| u64::from(self.mesh.penalty(n))).sum();
        let p_trace: u64 = trace.iter().map(|&n| u64::from(self.mesh.penalty(n))).sum();
        (p_trace as f64) * (replaced.len() as f64) <= self.opts.penalty_slack * (p_replaced as f64) * (trace.len() as f64)
    }

    /// Intermediate node (strictly between `start` and `end`) whose centroid
    /// is closest to, or with `furthest` furthest from, the segment.
    fn extreme_between(&self, start: usize, end: usize, sp: Point, ep: Point, furthest: bool) -> usize {
        let mut best = start + 1;
        let mut best_d = if furthest { f64::NEG_INFINITY } else { f64::INFINITY };
        for i in start + 1..end {
            let d = segment_dist_sq_xz(self.mesh.centroid(self.nodes[i]), sp, ep);
            let better = if furthest { d > best_d } else { d < best_d };
            if better {
                best = i;
                best_d = d;
            }
        }
        best
    }
}

/// Appends `chain`, dropping its first node when `out` already ends with it.
fn append_chain(out: &mut Vec<NodeIndex>, chain: &[NodeIndex]) {
    let skip = usize::from(!chain.is_empty() && out.last() == chain.first());
    out.extend_from_slice(&chain[skip..]);
}
