//! Boundary edges near the agent, for avoidance and debug drawing.

use serde::Serialize;

use crate::corridor::Corridor;
use crate::geometry::{dist_sq_xz, Point};
use crate::mesh::{NavMesh, NodeIndex};

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct WallSegment {
    pub start: Point,
    pub end: Point,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeKind {
    /// Shared with the previous or next corridor node.
    Interior,
    /// Shared with a node that is not next to this one in the corridor.
    Seam,
    /// No node on the other side.
    Wall,
}

/// Classifies edge `edge` of `corridor.nodes()[index]`, or `None` when
/// either index is out of range.
pub fn classify_edge(mesh: &NavMesh, corridor: &Corridor, index: usize, edge: usize) -> Option<EdgeKind> {
    let nodes = corridor.nodes();
    let node = mesh.node(*nodes.get(index)?);
    let Some(other) = *node.edge_neighbors.get(edge)? else { return Some(EdgeKind::Wall); };
    let prev = index.checked_sub(1).map(|i| nodes[i]);
    let next = nodes.get(index + 1).copied();
    Some(if prev == Some(other) || next == Some(other) { EdgeKind::Interior } else { EdgeKind::Seam })
}

/// Appends the walls of corridor nodes within `radius` of `center_index`,
/// walking out from it in the order 0, -1, +1, -2, +2, ...
///
/// Distances are measured from the agent's last localized position projected
/// onto the center node, so any corridor index may be used as the center.
pub fn find_walls(mesh: &NavMesh, corridor: &Corridor, center_index: usize, radius: f64, out: &mut Vec<WallSegment>) {
    let Some(&center) = corridor.nodes().get(center_index) else { return; };
    let origin = mesh.closest_point_on_node_xz(center, corridor.last_position());
    find_walls_around(mesh, corridor, center_index, origin, radius, out);
}

/// Same as [`find_walls`] with an explicit origin.
///
/// A direction stops at the corridor bounds, at a destroyed node or at the
/// first node whose closest point to `origin` is farther than `radius`.
pub fn find_walls_around(
    mesh: &NavMesh,
    corridor: &Corridor,
    center_index: usize,
    origin: Point,
    radius: f64,
    out: &mut Vec<WallSegment>,
) {
    let len = corridor.nodes().len();
    if center_index >= len { return; }
    let r2 = radius * radius;
    let in_range = |n: NodeIndex| -> bool {
        !mesh.is_destroyed(n) && dist_sq_xz(mesh.closest_point_on_node_xz(n, origin), origin) <= r2
    };

    if !in_range(corridor.nodes()[center_index]) { return; }
    push_walls(mesh, corridor, center_index, out);

    let mut back_open = true;
    let mut fwd_open = true;
    let mut step = 1;
    while back_open || fwd_open {
        if back_open {
            match center_index.checked_sub(step) {
                Some(i) if in_range(corridor.nodes()[i]) => push_walls(mesh, corridor, i, out),
                _ => back_open = false,
            }
        }
        if fwd_open {
            let i = center_index + step;
            if i < len && in_range(corridor.nodes()[i]) {
                push_walls(mesh, corridor, i, out);
            } else {
                fwd_open = false;
            }
        }
        step += 1;
    }
}

fn push_walls(mesh: &NavMesh, corridor: &Corridor, index: usize, out: &mut Vec<WallSegment>) {
    let node = mesh.node(corridor.nodes()[index]);
    for e in 0..node.edge_count() {
        if node.edge_neighbors[e].is_none() {
            let (start, end) = node.edge_points(e);
            out.push(WallSegment { start, end });
        }
    }
}
