use crate::geometry::{self, area2_xz, Point, GEOM_EPS};

use super::{NavMesh, NodeIndex};

const MAX_LINECAST_STEPS: usize = 1024;

/// Outcome of a linecast. `node` is the last node the segment reached, which
/// is the node containing `point`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LinecastHit {
    pub blocked: bool,
    pub point: Point,
    pub node: NodeIndex,
}

impl NavMesh {
    /// Walks the ground-plane segment `from -> to` through the mesh starting in
    /// `start_node`, appending every node it passes through to `trace`
    /// (starting with `start_node`).
    ///
    /// The segment is blocked when it leaves a node through an edge without a
    /// neighbor or into a destroyed node.
    pub fn linecast(&self, start_node: NodeIndex, from: Point, to: Point, trace: &mut Vec<NodeIndex>) -> LinecastHit {
        let mut cur = start_node;
        trace.push(cur);

        for _ in 0..MAX_LINECAST_STEPS {
            let node = self.node(cur);
            if geometry::point_in_convex_xz(to, &node.points, GEOM_EPS) {
                return LinecastHit { blocked: false, point: to, node: cur };
            }

            // The segment exits a convex polygon through the outward-facing edge
            // whose supporting line it crosses first.
            let n = node.edge_count();
            let mut exit: Option<(usize, f64, bool)> = None;
            for e in 0..n {
                let (a, b) = node.edge_points(e);
                let d_from = area2_xz(a, b, from);
                let d_to = area2_xz(a, b, to);
                if d_to >= d_from - GEOM_EPS { continue; }
                let t = d_from / (d_from - d_to);
                let hit = geometry::lerp(from, to, t);
                let on_edge = geometry::segment_dist_sq_xz(hit, a, b) <= GEOM_EPS;
                let better = match exit {
                    None => true,
                    Some((_, bt, b_on)) => t < bt - GEOM_EPS || ((t - bt).abs() <= GEOM_EPS && on_edge && !b_on),
                };
                if better { exit = Some((e, t, on_edge)); }
            }

            let Some((edge, t, _)) = exit else {
                return LinecastHit { blocked: true, point: from, node: cur };
            };
            let t = t.clamp(0.0, 1.0);
            let point = geometry::lerp(from, to, t);
            match node.edge_neighbors[edge] {
                Some(next) if !self.is_destroyed(next) => {
                    cur = next;
                    trace.push(cur);
                }
                _ => return LinecastHit { blocked: true, point, node: cur },
            }
        }

        tracing::warn!(start_node, steps = MAX_LINECAST_STEPS, "linecast step limit reached");
        LinecastHit { blocked: true, point: from, node: cur }
    }
}
