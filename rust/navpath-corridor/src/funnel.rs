//! Funnel (string-pulling) algorithm over a built corridor.
//!
//! Turn decisions use the ground plane only; emitted corners are the portal
//! vertices themselves, so their height comes from the mesh.

use crate::corridor::Corridor;
use crate::geometry::{approx_eq, area2_xz, is_colinear_xz, right_or_colinear_xz, Point};

/// Upper bound on corners emitted by one call, regardless of `max_corners`.
const MAX_CORNERS_PER_CALL: usize = 2000;

/// Appends up to `max_corners` turning points to `out`, walking the corridor
/// from `origin` starting at portal chain index `start_index` (the node the
/// agent is on).
///
/// Returns true when the corridor end was emitted as the last corner. The
/// origin itself is never emitted.
pub fn next_corners(
    corridor: &Corridor,
    origin: Point,
    start_index: usize,
    max_corners: usize,
    eps: f64,
    out: &mut Vec<Point>,
) -> bool {
    let left = corridor.left();
    let right = corridor.right();
    assert_eq!(left.len(), right.len(), "funnel portal chains differ in length");
    assert!(left.len() >= 2, "funnel needs at least the start and end portals");
    if max_corners == 0 { return false; }

    let n = left.len();
    let goal = left[n - 1];
    let base = out.len();
    let mut si = start_index.min(n - 1);

    // Fewer than three portals left: nothing can be in the way.
    if si + 2 >= n {
        out.push(goal);
        return true;
    }

    // Duplicate portals come from degenerate triangles.
    while approx_eq(left[si + 1], left[si + 2], eps) && approx_eq(right[si + 1], right[si + 2], eps) {
        si += 1;
        if si + 2 >= n {
            out.push(goal);
            return true;
        }
    }

    let mut portal_apex = origin;
    let mut portal_left = left[si + 1];
    let mut portal_right = right[si + 1];

    // Skip portals the apex sits on or has already passed: the next portal's
    // far vertex must be on the other side of the portal from the apex.
    loop {
        let mut sw = left[si + 2];
        if approx_eq(sw, portal_left, eps) { sw = right[si + 2]; }
        let on_portal = is_colinear_xz(portal_apex, portal_left, portal_right, eps);
        let same_side = right_or_colinear_xz(portal_left, portal_right, sw, eps)
            == right_or_colinear_xz(portal_left, portal_right, portal_apex, eps);
        if !on_portal && !same_side { break; }
        si += 1;
        if si + 2 >= n {
            out.push(goal);
            return true;
        }
        portal_left = left[si + 1];
        portal_right = right[si + 1];
    }

    let mut left_index = si + 1;
    let mut right_index = si + 1;
    let mut i = si + 2;
    while i < n {
        let emitted = out.len() - base;
        if emitted >= max_corners { return false; }
        if emitted >= MAX_CORNERS_PER_CALL {
            tracing::warn!(emitted, "funnel emitted too many corners; stopping early");
            return false;
        }

        let p_left = left[i];
        let p_right = right[i];

        // Tighten the right side; crossing the left edge makes the left vertex a corner.
        if area2_xz(portal_apex, portal_right, p_right) >= -eps {
            if approx_eq(portal_apex, portal_right, eps) || area2_xz(portal_apex, portal_left, p_right) <= eps {
                portal_right = p_right;
                right_index = i;
            } else {
                out.push(portal_left);
                portal_apex = portal_left;
                portal_right = portal_apex;
                right_index = left_index;
                i = left_index + 1;
                continue;
            }
        }

        // Tighten the left side; crossing the right edge makes the right vertex a corner.
        if area2_xz(portal_apex, portal_left, p_left) <= eps {
            if approx_eq(portal_apex, portal_left, eps) || area2_xz(portal_apex, portal_right, p_left) >= -eps {
                portal_left = p_left;
                left_index = i;
            } else {
                out.push(portal_right);
                portal_apex = portal_right;
                portal_left = portal_apex;
                left_index = right_index;
                i = right_index + 1;
                continue;
            }
        }

        i += 1;
    }

    if out.len() - base >= max_corners { return false; }
    out.push(goal);
    true
}

/// Full string-pulled path from `origin` to the corridor end, origin included.
pub fn string_pull(corridor: &Corridor, origin: Point, eps: f64) -> Vec<Point> {
    let mut path = Vec::with_capacity(corridor.left().len() + 1);
    path.push(origin);
    next_corners(corridor, origin, corridor.current_node(), MAX_CORNERS_PER_CALL, eps, &mut path);
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::{NavMesh, PolygonDescription};
    use crate::options::CorridorOptions;

    fn poly(verts: &[u32]) -> PolygonDescription {
        PolygonDescription { verts: verts.to_vec(), region: 0, penalty: 0 }
    }

    // Unit squares stepping up by one in z every column: a staircase.
    fn staircase() -> (NavMesh, Vec<u32>) {
        let vertices = vec![
            [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0],
            [1.0, 0.0, 2.0], [2.0, 0.0, 1.0], [2.0, 0.0, 2.0],
        ];
        let mesh = NavMesh::from_polygons(
            vertices,
            vec![poly(&[0, 1, 2, 3]), poly(&[3, 2, 4]), poly(&[2, 5, 6, 4])],
        )
        .unwrap();
        (mesh, vec![0, 1, 2])
    }

    #[test]
    fn staircase_bends_around_inner_corner() {
        let (mesh, nodes) = staircase();
        let c = Corridor::new_built(&mesh, &nodes, [0.5, 0.0, 0.1], [1.9, 0.0, 1.5], &CorridorOptions::default()).unwrap();
        let mut out = Vec::new();
        let last = c.next_corners([0.5, 0.0, 0.1], 8, 1e-9, &mut out);
        assert!(last);
        assert_eq!(out.len(), 2);
        assert_eq!(out[0], [1.0, 0.0, 1.0]);
        assert_eq!(out[1], [1.9, 0.0, 1.5]);
    }

    #[test]
    fn max_corners_stops_early() {
        let (mesh, nodes) = staircase();
        let c = Corridor::new_built(&mesh, &nodes, [0.5, 0.0, 0.1], [1.9, 0.0, 1.5], &CorridorOptions::default()).unwrap();
        let mut out = Vec::new();
        assert!(!c.next_corners([0.5, 0.0, 0.1], 1, 1e-9, &mut out));
        assert_eq!(out, vec![[1.0, 0.0, 1.0]]);
    }

    #[test]
    fn zero_max_corners_emits_nothing() {
        let (mesh, nodes) = staircase();
        let c = Corridor::new_built(&mesh, &nodes, [0.5, 0.0, 0.1], [1.9, 0.0, 1.5], &CorridorOptions::default()).unwrap();
        let mut out = Vec::new();
        assert!(!c.next_corners([0.5, 0.0, 0.1], 0, 1e-9, &mut out));
        assert!(out.is_empty());

        // short tail
        let c = Corridor::new_built(&mesh, &[0, 1], [0.5, 0.0, 0.5], [0.8, 0.0, 1.5], &CorridorOptions::default()).unwrap();
        assert!(!c.next_corners([0.5, 0.0, 0.5], 0, 1e-9, &mut out));
        assert!(out.is_empty());
    }

    // Portal chains along +x with left on z = 1 and right on z = 0, one
    // portal per x in `xs`.
    fn row_corridor(start: Point, xs: &[f64], goal: Point) -> Corridor {
        let mut left = vec![start];
        let mut right = vec![start];
        for &x in xs {
            left.push([x, 0.0, 1.0]);
            right.push([x, 0.0, 0.0]);
        }
        left.push(goal);
        right.push(goal);
        Corridor {
            nodes: (0..=xs.len() as u32).collect(),
            left,
            right,
            exact_start: start,
            exact_end: goal,
            ..Corridor::default()
        }
    }

    #[test]
    fn duplicate_portals_are_skipped() {
        let goal = [2.5, 0.0, 2.5];
        let c = row_corridor([0.5, 0.0, 0.5], &[1.0, 1.0, 2.0], goal);
        let mut out = Vec::new();
        assert!(next_corners(&c, [0.5, 0.0, 0.5], 0, 8, 1e-9, &mut out));
        assert_eq!(out, vec![[2.0, 0.0, 1.0], goal]);
    }

    #[test]
    fn origin_on_first_portal_moves_past_it() {
        let goal = [2.5, 0.0, 0.5];
        let c = row_corridor([0.5, 0.0, 0.5], &[1.0, 2.0], goal);
        let mut out = Vec::new();
        assert!(next_corners(&c, [1.0, 0.0, 0.5], 0, 8, 1e-9, &mut out));
        assert_eq!(out, vec![goal]);
    }

    #[test]
    fn origin_past_first_portal_moves_past_it() {
        let goal = [2.5, 0.0, 0.5];
        let c = row_corridor([0.5, 0.0, 0.5], &[1.0, 2.0], goal);
        let mut out = Vec::new();
        assert!(next_corners(&c, [1.5, 0.0, 0.5], 0, 8, 1e-9, &mut out));
        assert_eq!(out, vec![goal]);

        // past every portal
        out.clear();
        assert!(next_corners(&c, [2.2, 0.0, 0.5], 0, 8, 1e-9, &mut out));
        assert_eq!(out, vec![goal]);
    }

    #[test]
    fn short_tail_emits_goal() {
        let (mesh, _) = staircase();
        let c = Corridor::new_built(&mesh, &[0, 1], [0.5, 0.0, 0.5], [0.8, 0.0, 1.5], &CorridorOptions::default()).unwrap();
        let mut out = Vec::new();
        assert!(c.next_corners([0.5, 0.0, 0.5], 4, 1e-9, &mut out));
        assert_eq!(out, vec![[0.8, 0.0, 1.5]]);
    }

    #[test]
    fn string_pull_includes_origin_and_goal() {
        let (mesh, nodes) = staircase();
        let c = Corridor::new_built(&mesh, &nodes, [0.5, 0.0, 0.1], [1.9, 0.0, 1.5], &CorridorOptions::default()).unwrap();
        let path = string_pull(&c, c.exact_start(), 1e-9);
        assert_eq!(path.len(), 3);
        assert_eq!(path[0], [0.5, 0.0, 0.1]);
        assert_eq!(path[2], c.exact_end());
    }

    #[test]
    #[should_panic(expected = "at least the start and end")]
    fn unbuilt_corridor_panics() {
        let c = Corridor::new();
        let mut out = Vec::new();
        next_corners(&c, [0.0; 3], 0, 4, 1e-9, &mut out);
    }
}
