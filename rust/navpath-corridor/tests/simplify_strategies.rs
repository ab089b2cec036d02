use navpath_corridor::simplify::Simplifier;
use navpath_corridor::{Corridor, CorridorOptions, NavMesh, NodeIndex, PolygonDescription, Simplification};

const STRATEGIES: [Simplification; 3] =
    [Simplification::Iterative, Simplification::RecursiveBinary, Simplification::RecursiveTrinary];

/// Two rows of `cols` unit squares. Bottom row nodes are `0..cols`, top row
/// nodes `cols..2 * cols`. `penalty(node)` sets per-node penalties.
fn two_rows(cols: u32, penalty: impl Fn(u32) -> u32) -> NavMesh {
    let w = cols + 1;
    let mut vertices = Vec::new();
    for z in 0..3 {
        for x in 0..w {
            vertices.push([x as f64, 0.0, z as f64]);
        }
    }
    let mut polys = Vec::new();
    for row in 0..2 {
        for i in 0..cols {
            let b = row * w + i;
            let node = row * cols + i;
            polys.push(PolygonDescription { verts: vec![b, b + 1, b + w + 1, b + w], region: 0, penalty: penalty(node) });
        }
    }
    NavMesh::from_polygons(vertices, polys).unwrap()
}

fn assert_sound(mesh: &NavMesh, input: &[NodeIndex], output: &[NodeIndex]) {
    assert_eq!(output.first(), input.first());
    assert_eq!(output.last(), input.last());
    assert!(output.len() <= input.len(), "{output:?} longer than {input:?}");
    for w in output.windows(2) {
        assert!(mesh.shared_edge(w[0], w[1]).is_some(), "{} and {} not adjacent in {output:?}", w[0], w[1]);
    }
}

#[test]
fn detour_over_open_ground_collapses_to_end_nodes() {
    let mesh = two_rows(2, |_| 0);
    // B0 -> T0 -> T1 -> B1 when B0 -> B1 is a straight walk
    let input = [0, 2, 3, 1];
    for mode in STRATEGIES {
        let opts = CorridorOptions::default();
        let mut out = Vec::new();
        Simplifier::new(&mesh, &input, &opts).run(mode, 0, 3, [0.5, 0.0, 0.5], [1.5, 0.0, 0.5], &mut out);
        assert_eq!(out, vec![0, 1], "{mode:?}");
    }
}

#[test]
fn zigzag_is_sound_for_every_strategy() {
    let mesh = two_rows(6, |_| 0);
    // weave between the rows: B0 T0 T1 B1 B2 T2 T3 B3 B4 T4 T5 B5
    let input = [0, 6, 7, 1, 2, 8, 9, 3, 4, 10, 11, 5];
    for mode in STRATEGIES {
        let opts = CorridorOptions::default().with_simplification(mode);
        let c = Corridor::new_built(&mesh, &input, [0.5, 0.0, 0.5], [5.5, 0.0, 0.5], &opts).unwrap();
        assert_sound(&mesh, &input, c.nodes());
        assert!(c.nodes().len() < input.len(), "{mode:?} did not simplify: {:?}", c.nodes());
    }
}

#[test]
fn expensive_shortcut_is_rejected() {
    // B1 is the only way straight along the bottom row, and it is costly.
    let mesh = two_rows(3, |n| if n == 1 { 1000 } else { 0 });
    let input = [0, 3, 4, 5, 2];
    for mode in STRATEGIES {
        let opts = CorridorOptions::default().with_simplification(mode);
        let c = Corridor::new_built(&mesh, &input, [0.5, 0.0, 0.5], [2.5, 0.0, 0.5], &opts).unwrap();
        assert_sound(&mesh, &input, c.nodes());
        assert!(!c.nodes().contains(&1), "{mode:?} took the penalized node: {:?}", c.nodes());
    }
}

#[test]
fn uniform_penalties_allow_shortcut() {
    // B1 costs the same as the detour nodes, so the straight walk is taken.
    let mesh = two_rows(3, |_| 10);
    let input = [0, 3, 4, 5, 2];
    for mode in STRATEGIES {
        let opts = CorridorOptions::default().with_simplification(mode);
        let c = Corridor::new_built(&mesh, &input, [0.5, 0.0, 0.5], [2.5, 0.0, 0.5], &opts).unwrap();
        assert_eq!(c.nodes(), &[0, 1, 2], "{mode:?}");
    }
}

#[test]
fn iteration_cap_keeps_the_rest_unsimplified() {
    let mesh = two_rows(3, |n| if n == 1 { 1000 } else { 0 });
    let input = [0, 3, 4, 5, 2];
    let opts = CorridorOptions { max_simplify_iterations: 1, ..CorridorOptions::default() };
    let mut out = Vec::new();
    Simplifier::new(&mesh, &input, &opts).iterative(0, 4, [0.5, 0.0, 0.5], [2.5, 0.0, 0.5], &mut out);
    assert_eq!(out, input.to_vec());
}

#[test]
fn mesh_without_linecast_is_never_simplified() {
    let mesh = two_rows(2, |_| 0).without_linecast();
    let input = [0, 2, 3, 1];
    let opts = CorridorOptions::default().with_simplification(Simplification::Iterative);
    let c = Corridor::new_built(&mesh, &input, [0.5, 0.0, 0.5], [1.5, 0.0, 0.5], &opts).unwrap();
    assert_eq!(c.nodes(), &input);
}

#[test]
fn sub_range_keeps_its_boundary_nodes() {
    let mesh = two_rows(2, |_| 0);
    let input = [0, 2, 3, 1];
    let opts = CorridorOptions::default();
    for mode in STRATEGIES {
        let mut out = Vec::new();
        Simplifier::new(&mesh, &input, &opts).run(mode, 1, 2, [0.5, 0.0, 1.5], [1.5, 0.0, 1.5], &mut out);
        assert_eq!(out, vec![2, 3], "{mode:?}");
    }
}

#[test]
fn clear_line_ending_in_an_earlier_node_is_not_a_shortcut() {
    let mesh = two_rows(3, |_| 0);
    // B0 T0 T1 B1 B2, ending on the B1/B2 edge: the straight line from B0 is
    // clear but stops in B1, which would drop B2 from the corridor.
    let input = [0, 3, 4, 1, 2];
    let end_point = [2.0, 0.0, 0.5];
    let mut trace = Vec::new();
    let hit = mesh.linecast(0, [0.5, 0.0, 0.5], end_point, &mut trace);
    assert!(!hit.blocked);
    assert_eq!(hit.node, 1);

    let opts = CorridorOptions::default();
    for mode in STRATEGIES {
        let mut out = Vec::new();
        Simplifier::new(&mesh, &input, &opts).run(mode, 0, 4, [0.5, 0.0, 0.5], end_point, &mut out);
        assert_sound(&mesh, &input, &out);
        assert_eq!(out.last(), Some(&2), "{mode:?} stopped early: {out:?}");
        if mode != Simplification::RecursiveTrinary {
            assert_eq!(out, vec![0, 1, 2], "{mode:?}");
        }
    }
}
