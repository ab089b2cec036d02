//! Per-tick agent localization inside a corridor.
//!
//! Works out which corridor node the agent stands on, snapping it back onto
//! the mesh and splicing the corridor when it has drifted onto a node next to
//! the corridor. Destroyed nodes are reported as a repath request.

use tracing::{trace, warn};

use crate::corridor::Corridor;
use crate::geometry::{dist_sq_xz, Point};
use crate::mesh::{NavMesh, NodeIndex};
use crate::options::CorridorOptions;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Localized {
    pub position: Point,
    pub requires_repath: bool,
}

impl Localized {
    #[inline]
    fn ok(position: Point) -> Self { Self { position, requires_repath: false } }

    #[inline]
    fn repath(position: Point) -> Self { Self { position, requires_repath: true } }
}

#[derive(Clone, Copy, Debug)]
enum Closest {
    InCorridor(usize),
    Adjacent(NodeIndex),
}

/// Localizes `position` in `corridor`, updating its current node.
///
/// On `requires_repath` the corridor is left untouched and the position is
/// returned as given.
pub fn update(mesh: &NavMesh, corridor: &mut Corridor, position: Point, opts: &CorridorOptions) -> Localized {
    if !corridor.is_built() { return Localized::repath(position); }

    let cur = corridor.current_node;
    let node = corridor.nodes[cur];
    if mesh.is_destroyed(node) {
        warn!(node, index = cur, "current corridor node destroyed");
        return Localized::repath(position);
    }

    corridor.ticks_since_destroyed_check += 1;

    if mesh.contains_point_xz(node, position) {
        if corridor.ticks_since_destroyed_check >= opts.destroyed_check_interval {
            corridor.ticks_since_destroyed_check = 0;
            if let Some(&dead) = corridor.nodes[cur..].iter().find(|&&n| mesh.is_destroyed(n)) {
                warn!(node = dead, "corridor node destroyed ahead of agent");
                return Localized::repath(position);
            }
        }
        corridor.last_position = position;
        return Localized::ok(position);
    }

    // Nearby corridor nodes, closest first, ahead before behind.
    let len = corridor.nodes.len();
    for offset in 1..=opts.neighbor_window {
        let ahead = (cur + offset < len).then_some(cur + offset);
        let behind = cur.checked_sub(offset);
        for idx in [ahead, behind].into_iter().flatten() {
            let n = corridor.nodes[idx];
            if mesh.is_destroyed(n) {
                warn!(node = n, index = idx, "corridor node destroyed near agent");
                return Localized::repath(position);
            }
            if mesh.contains_point_xz(n, position) {
                trace!(from = cur, to = idx, "agent moved to nearby corridor node");
                corridor.current_node = idx;
                corridor.last_position = position;
                return Localized::ok(position);
            }
        }
    }

    // Off the expected nodes: closest point on any corridor node, or on a
    // live node next to the corridor.
    let mut best: Option<(Closest, Point)> = None;
    let mut best_d = f64::INFINITY;
    for (i, &n) in corridor.nodes.iter().enumerate() {
        if mesh.is_destroyed(n) {
            warn!(node = n, index = i, "corridor node destroyed during full scan");
            return Localized::repath(position);
        }
        let p = mesh.closest_point_on_node_xz(n, position);
        let d = dist_sq_xz(p, position);
        if d < best_d {
            best_d = d;
            best = Some((Closest::InCorridor(i), p));
        }
    }

    corridor.visited.clear();
    corridor.visited.extend(corridor.nodes.iter().copied());
    for i in 0..len {
        let n = corridor.nodes[i];
        for nb in mesh.neighbors(n) {
            if !corridor.visited.insert(nb) || mesh.is_destroyed(nb) { continue; }
            let p = mesh.closest_point_on_node_xz(nb, position);
            let d = dist_sq_xz(p, position);
            if d < best_d {
                best_d = d;
                best = Some((Closest::Adjacent(nb), p));
            }
        }
    }

    let Some((closest, p)) = best else { return Localized::repath(position); };
    let snapped = [p[0], position[1], p[2]];
    match closest {
        Closest::InCorridor(i) => {
            trace!(from = cur, to = i, "agent snapped onto corridor node");
            corridor.current_node = i;
            corridor.last_position = snapped;
            Localized::ok(snapped)
        }
        Closest::Adjacent(nb) => {
            // Splice in front of the furthest corridor node the new one touches.
            let Some(keep_from) = corridor.nodes.iter().rposition(|&n| mesh.shared_edge(n, nb).is_some()) else {
                return Localized::repath(position);
            };
            match corridor.replace_prefix(mesh, keep_from, nb, snapped) {
                Ok(()) => Localized::ok(snapped),
                Err(e) => {
                    warn!(error = %e, node = nb, "corridor splice failed");
                    Localized::repath(position)
                }
            }
        }
    }
}
