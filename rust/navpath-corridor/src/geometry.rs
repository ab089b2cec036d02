//! Ground-plane geometry on `[x, y, z]` points where `y` is height.
//!
//! Every orientation and containment test works on the (x, z) plane. Height is
//! only carried through so callers get usable output points.

pub type Point = [f64; 3];

/// Tolerance used for containment and edge tests on the ground plane.
pub const GEOM_EPS: f64 = 1e-9;

/// Twice the signed area of triangle `a, b, c` on the (x, z) plane.
/// Positive when `c` lies to the left of `a -> b`.
#[inline]
pub fn area2_xz(a: Point, b: Point, c: Point) -> f64 {
    (b[0] - a[0]) * (c[2] - a[2]) - (c[0] - a[0]) * (b[2] - a[2])
}

#[inline]
pub fn is_colinear_xz(a: Point, b: Point, c: Point, eps: f64) -> bool {
    area2_xz(a, b, c).abs() <= eps
}

/// True when `p` is on the right of `a -> b` or on the line through them.
#[inline]
pub fn right_or_colinear_xz(a: Point, b: Point, p: Point, eps: f64) -> bool {
    area2_xz(a, b, p) <= eps
}

#[inline]
pub fn approx_eq(a: Point, b: Point, eps: f64) -> bool {
    (a[0] - b[0]).abs() <= eps && (a[1] - b[1]).abs() <= eps && (a[2] - b[2]).abs() <= eps
}

#[inline]
pub fn dist_sq_xz(a: Point, b: Point) -> f64 {
    let dx = a[0] - b[0];
    let dz = a[2] - b[2];
    dx * dx + dz * dz
}

#[inline]
pub fn lerp(a: Point, b: Point, t: f64) -> Point {
    [a[0] + (b[0] - a[0]) * t, a[1] + (b[1] - a[1]) * t, a[2] + (b[2] - a[2]) * t]
}

/// Closest point to `p` on segment `a - b`, measured on the ground plane.
/// Height is interpolated along the segment.
pub fn closest_on_segment_xz(p: Point, a: Point, b: Point) -> Point {
    let dx = b[0] - a[0];
    let dz = b[2] - a[2];
    let len_sq = dx * dx + dz * dz;
    if len_sq <= 0.0 { return a; }
    let t = (((p[0] - a[0]) * dx + (p[2] - a[2]) * dz) / len_sq).clamp(0.0, 1.0);
    lerp(a, b, t)
}

/// Squared ground-plane distance from `p` to segment `a - b`.
#[inline]
pub fn segment_dist_sq_xz(p: Point, a: Point, b: Point) -> f64 {
    dist_sq_xz(p, closest_on_segment_xz(p, a, b))
}

/// Signed area of a ring, positive for counter-clockwise winding on (x, z).
pub fn signed_area_xz(ring: &[Point]) -> f64 {
    let n = ring.len();
    if n < 3 { return 0.0; }
    let mut a = 0.0f64;
    for i in 0..n {
        let j = (i + 1) % n;
        a += ring[i][0] * ring[j][2] - ring[j][0] * ring[i][2];
    }
    0.5 * a
}

/// Edge-inclusive containment for a counter-clockwise convex ring.
pub fn point_in_convex_xz(p: Point, ring: &[Point], eps: f64) -> bool {
    let n = ring.len();
    if n < 3 { return false; }
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        if area2_xz(a, b, p) < -eps { return false; }
    }
    true
}

/// Closest point on (or in) a counter-clockwise convex ring.
/// Returns `p` itself when it is inside the ring.
pub fn closest_point_on_convex_xz(p: Point, ring: &[Point], eps: f64) -> Point {
    if point_in_convex_xz(p, ring, eps) { return p; }
    let n = ring.len();
    let mut best = p;
    let mut best_d = f64::INFINITY;
    for i in 0..n {
        let c = closest_on_segment_xz(p, ring[i], ring[(i + 1) % n]);
        let d = dist_sq_xz(p, c);
        if d < best_d {
            best_d = d;
            best = c;
        }
    }
    best
}

/// Vertex average. Used as the representative point of a node.
pub fn centroid(ring: &[Point]) -> Point {
    if ring.is_empty() { return [0.0, 0.0, 0.0]; }
    let mut c = [0.0f64; 3];
    for p in ring {
        c[0] += p[0];
        c[1] += p[1];
        c[2] += p[2];
    }
    let n = ring.len() as f64;
    [c[0] / n, c[1] / n, c[2] / n]
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Vec<Point> {
        vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]]
    }

    #[test]
    fn left_of_directed_edge_is_positive() {
        // walking +x, +z is on the left
        assert!(area2_xz([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.0, 1.0]) > 0.0);
        assert!(area2_xz([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.5, 0.0, -1.0]) < 0.0);
        assert!(right_or_colinear_xz([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 5.0, 0.0], 0.0));
    }

    #[test]
    fn square_winding_and_containment() {
        let ring = square();
        assert!((signed_area_xz(&ring) - 1.0).abs() < 1e-12);
        assert!(point_in_convex_xz([0.5, 3.0, 0.5], &ring, GEOM_EPS));
        assert!(point_in_convex_xz([1.0, 0.0, 0.5], &ring, GEOM_EPS)); // on edge
        assert!(!point_in_convex_xz([1.5, 0.0, 0.5], &ring, GEOM_EPS));
    }

    #[test]
    fn closest_point_snaps_to_nearest_edge() {
        let ring = square();
        let c = closest_point_on_convex_xz([2.0, 0.0, 0.5], &ring, GEOM_EPS);
        assert!(approx_eq(c, [1.0, 0.0, 0.5], 1e-12));
        let inside = closest_point_on_convex_xz([0.25, 7.0, 0.25], &ring, GEOM_EPS);
        assert_eq!(inside, [0.25, 7.0, 0.25]);
        let corner = closest_point_on_convex_xz([-1.0, 0.0, -1.0], &ring, GEOM_EPS);
        assert!(approx_eq(corner, [0.0, 0.0, 0.0], 1e-12));
    }

    #[test]
    fn segment_distance_ignores_height() {
        let d = segment_dist_sq_xz([0.5, 10.0, 2.0], [0.0, 0.0, 0.0], [1.0, 0.0, 0.0]);
        assert!((d - 4.0).abs() < 1e-12);
    }
}
