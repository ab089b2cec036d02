//! In-process navmesh the corridor subsystem reads from.
//!
//! The mesh is owned by the host. The corridor code only reads it, except for
//! the destroyed flag which the host flips when a region is rebuilt.

pub mod linecast;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::error::CorridorError;
use crate::geometry::{self, Point, GEOM_EPS};

pub use linecast::LinecastHit;

pub type NodeIndex = u32;

/// Serialized form of a navmesh: shared vertices plus polygons indexing them.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MeshDescription {
    pub vertices: Vec<Point>,
    pub polygons: Vec<PolygonDescription>,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PolygonDescription {
    pub verts: Vec<u32>,
    #[serde(default)]
    pub region: u32,
    #[serde(default)]
    pub penalty: u32,
}

/// A convex walkable polygon. Edge `i` runs from `verts[i]` to `verts[i + 1]`
/// and `edge_neighbors[i]` is the node on the other side, if any.
#[derive(Clone, Debug)]
pub struct PolyNode {
    pub verts: Vec<u32>,
    pub points: Vec<Point>,
    pub edge_neighbors: Vec<Option<NodeIndex>>,
    pub center: Point,
    pub region: u32,
    pub penalty: u32,
    pub destroyed: bool,
}

impl PolyNode {
    #[inline]
    pub fn edge_count(&self) -> usize { self.verts.len() }

    /// Neighbors across shared edges, in edge order.
    pub fn neighbors(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.edge_neighbors.iter().filter_map(|n| *n)
    }

    #[inline]
    pub fn edge_points(&self, edge: usize) -> (Point, Point) {
        let n = self.points.len();
        (self.points[edge], self.points[(edge + 1) % n])
    }
}

#[derive(Clone, Debug)]
pub struct NavMesh {
    vertices: Vec<Point>,
    nodes: Vec<PolyNode>,
    linecast_enabled: bool,
}

impl NavMesh {
    /// Builds a mesh from shared vertices and convex polygons.
    ///
    /// Polygons are normalised to counter-clockwise winding on (x, z).
    /// Adjacency is derived from edges that use the same two vertex indices.
    pub fn from_polygons(vertices: Vec<Point>, polygons: Vec<PolygonDescription>) -> Result<Self, CorridorError> {
        let mut nodes: Vec<PolyNode> = Vec::with_capacity(polygons.len());
        for (idx, poly) in polygons.into_iter().enumerate() {
            if poly.verts.len() < 3 {
                return Err(CorridorError::InvalidMesh(format!("polygon {idx} has {} vertices", poly.verts.len())));
            }
            let mut verts = poly.verts;
            let mut points = Vec::with_capacity(verts.len());
            for &v in &verts {
                let p = vertices.get(v as usize).copied().ok_or_else(|| {
                    CorridorError::InvalidMesh(format!("polygon {idx} references missing vertex {v}"))
                })?;
                points.push(p);
            }
            let area = geometry::signed_area_xz(&points);
            if area.abs() <= GEOM_EPS {
                return Err(CorridorError::InvalidMesh(format!("polygon {idx} is degenerate")));
            }
            if area < 0.0 {
                verts.reverse();
                points.reverse();
            }
            let center = geometry::centroid(&points);
            let n = verts.len();
            nodes.push(PolyNode {
                verts,
                points,
                edge_neighbors: vec![None; n],
                center,
                region: poly.region,
                penalty: poly.penalty,
                destroyed: false,
            });
        }

        let mut edges: FxHashMap<(u32, u32), (NodeIndex, usize)> = FxHashMap::default();
        for (ni, node) in nodes.iter().enumerate() {
            for e in 0..node.edge_count() {
                let key = (node.verts[e], node.verts[(e + 1) % node.edge_count()]);
                if edges.insert(key, (ni as NodeIndex, e)).is_some() {
                    return Err(CorridorError::InvalidMesh(format!("edge {:?} used twice with the same direction", key)));
                }
            }
        }
        for ni in 0..nodes.len() {
            let n = nodes[ni].edge_count();
            for e in 0..n {
                let a = nodes[ni].verts[e];
                let b = nodes[ni].verts[(e + 1) % n];
                if let Some(&(other, _)) = edges.get(&(b, a)) {
                    nodes[ni].edge_neighbors[e] = Some(other);
                }
            }
        }

        Ok(Self { vertices, nodes, linecast_enabled: true })
    }

    pub fn from_description(desc: MeshDescription) -> Result<Self, CorridorError> {
        Self::from_polygons(desc.vertices, desc.polygons)
    }

    pub fn from_json(s: &str) -> Result<Self, CorridorError> {
        let desc: MeshDescription = serde_json::from_str(s)?;
        Self::from_description(desc)
    }

    /// Marks the mesh as not supporting linecasts; corridor simplification is skipped.
    pub fn without_linecast(mut self) -> Self {
        self.linecast_enabled = false;
        self
    }

    #[inline]
    pub fn supports_linecast(&self) -> bool { self.linecast_enabled }

    #[inline]
    pub fn node_count(&self) -> usize { self.nodes.len() }

    #[inline]
    pub fn contains_node(&self, idx: NodeIndex) -> bool { (idx as usize) < self.nodes.len() }

    #[inline]
    pub fn node(&self, idx: NodeIndex) -> &PolyNode { &self.nodes[idx as usize] }

    #[inline]
    pub fn vertex(&self, v: u32) -> Point { self.vertices[v as usize] }

    /// Corner points of a node in counter-clockwise order.
    #[inline]
    pub fn polygon_points(&self, idx: NodeIndex) -> &[Point] { &self.nodes[idx as usize].points }

    #[inline]
    pub fn centroid(&self, idx: NodeIndex) -> Point { self.nodes[idx as usize].center }

    #[inline]
    pub fn penalty(&self, idx: NodeIndex) -> u32 { self.nodes[idx as usize].penalty }

    #[inline]
    pub fn region(&self, idx: NodeIndex) -> u32 { self.nodes[idx as usize].region }

    #[inline]
    pub fn is_destroyed(&self, idx: NodeIndex) -> bool { self.nodes[idx as usize].destroyed }

    /// Flags a node as destroyed. Agents following a corridor through it will
    /// be asked to repath on their next localization.
    pub fn destroy_node(&mut self, idx: NodeIndex) {
        self.nodes[idx as usize].destroyed = true;
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.nodes[idx as usize].neighbors()
    }

    /// Index of the edge of `a` that is shared with `b`.
    pub fn shared_edge(&self, a: NodeIndex, b: NodeIndex) -> Option<usize> {
        self.nodes[a as usize].edge_neighbors.iter().position(|n| *n == Some(b))
    }

    pub fn contains_point_xz(&self, idx: NodeIndex, p: Point) -> bool {
        geometry::point_in_convex_xz(p, &self.nodes[idx as usize].points, GEOM_EPS)
    }

    pub fn closest_point_on_node_xz(&self, idx: NodeIndex, p: Point) -> Point {
        geometry::closest_point_on_convex_xz(p, &self.nodes[idx as usize].points, GEOM_EPS)
    }

    /// First live node whose footprint contains `p`.
    pub fn find_node_containing(&self, p: Point) -> Option<NodeIndex> {
        self.nodes
            .iter()
            .enumerate()
            .find(|(_, n)| !n.destroyed && geometry::point_in_convex_xz(p, &n.points, GEOM_EPS))
            .map(|(i, _)| i as NodeIndex)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn poly(verts: &[u32]) -> PolygonDescription {
        PolygonDescription { verts: verts.to_vec(), region: 0, penalty: 0 }
    }

    fn two_squares() -> NavMesh {
        let vertices = vec![
            [0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0],
            [0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [2.0, 0.0, 1.0],
        ];
        // second square given clockwise on purpose
        NavMesh::from_polygons(vertices, vec![poly(&[0, 1, 4, 3]), poly(&[1, 4, 5, 2])]).unwrap()
    }

    #[test]
    fn adjacency_from_shared_vertices() {
        let mesh = two_squares();
        assert_eq!(mesh.neighbors(0).collect::<Vec<_>>(), vec![1]);
        assert_eq!(mesh.neighbors(1).collect::<Vec<_>>(), vec![0]);
        let e = mesh.shared_edge(0, 1).unwrap();
        let (a, b) = mesh.node(0).edge_points(e);
        assert_eq!(a, [1.0, 0.0, 0.0]);
        assert_eq!(b, [1.0, 0.0, 1.0]);
    }

    #[test]
    fn clockwise_input_is_rewound() {
        let mesh = two_squares();
        assert!(geometry::signed_area_xz(mesh.polygon_points(1)) > 0.0);
        assert_eq!(mesh.polygon_points(1).len(), 4);
        assert!((mesh.centroid(1)[0] - 1.5).abs() < 1e-12);
    }

    #[test]
    fn rejects_bad_polygons() {
        let verts = vec![[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [2.0, 0.0, 0.0]];
        assert!(matches!(
            NavMesh::from_polygons(verts.clone(), vec![poly(&[0, 1])]),
            Err(CorridorError::InvalidMesh(_))
        ));
        assert!(matches!(
            NavMesh::from_polygons(verts.clone(), vec![poly(&[0, 1, 2])]),
            Err(CorridorError::InvalidMesh(_))
        ));
        assert!(matches!(
            NavMesh::from_polygons(verts, vec![poly(&[0, 1, 9])]),
            Err(CorridorError::InvalidMesh(_))
        ));
    }

    #[test]
    fn json_description_round_trip() {
        let s = r#"{
            "vertices": [[0,0,0],[1,0,0],[1,0,1]],
            "polygons": [{"verts": [0,1,2], "penalty": 7}]
        }"#;
        let mesh = NavMesh::from_json(s).unwrap();
        assert_eq!(mesh.node_count(), 1);
        assert_eq!(mesh.penalty(0), 7);
        assert_eq!(mesh.region(0), 0);
        assert_eq!(mesh.find_node_containing([0.9, 0.0, 0.1]), Some(0));
        assert_eq!(mesh.find_node_containing([0.1, 0.0, 0.9]), None);
    }

    #[test]
    fn destroyed_nodes_are_not_found() {
        let mut mesh = two_squares();
        mesh.destroy_node(1);
        assert!(mesh.is_destroyed(1));
        assert_eq!(mesh.find_node_containing([1.5, 0.0, 0.5]), None);
    }
}
