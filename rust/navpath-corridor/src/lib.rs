pub mod geometry;
pub mod error;
pub mod options;
pub mod mesh;
pub mod corridor;
pub mod simplify;
pub mod funnel;
pub mod localize;
pub mod walls;
pub mod path;

pub use corridor::{Corridor, CorridorPool, Portal};
pub use error::CorridorError;
pub use geometry::Point;
pub use localize::Localized;
pub use mesh::{MeshDescription, NavMesh, NodeIndex, PolygonDescription};
pub use options::{CorridorOptions, Simplification};
pub use path::{OffMeshLink, PathPart, PathStep, RichPath};
pub use walls::WallSegment;
