use crate::error::CorridorError;
use crate::geometry::Point;
use crate::mesh::{NavMesh, NodeIndex};

/// Shared edge between two consecutive corridor nodes, seen in the direction
/// of travel.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Portal {
    pub left: Point,
    pub right: Point,
}

/// Portal crossed when walking from `from` into `to`.
///
/// Nodes are wound counter-clockwise, so leaving `from` through its edge
/// `v[i] -> v[i + 1]` puts `v[i + 1]` on the left.
pub fn portal(mesh: &NavMesh, from: NodeIndex, to: NodeIndex) -> Result<Portal, CorridorError> {
    let edge = mesh.shared_edge(from, to).ok_or(CorridorError::NotAdjacent { a: from, b: to })?;
    let (a, b) = mesh.node(from).edge_points(edge);
    Ok(Portal { left: b, right: a })
}
