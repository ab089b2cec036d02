use thiserror::Error;

use crate::mesh::NodeIndex;

/// Contract violations reported by corridor construction.
///
/// Runtime conditions such as drifting off the corridor or destroyed nodes are
/// not errors; the localizer reports those as a repath request.
#[derive(Error, Debug)]
pub enum CorridorError {
    #[error("corridor needs at least one node")]
    EmptyPath,
    #[error("nodes {a} and {b} do not share an edge")]
    NotAdjacent { a: NodeIndex, b: NodeIndex },
    #[error("unknown node {0}")]
    UnknownNode(NodeIndex),
    #[error("invalid mesh: {0}")]
    InvalidMesh(String),
    #[error(transparent)]
    Json(#[from] serde_json::Error),
}
