//! A path made of several parts: one corridor per contiguous run of nodes in
//! the same region, and the off-mesh links between them.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::corridor::{Corridor, CorridorPool};
use crate::error::CorridorError;
use crate::geometry::Point;
use crate::mesh::{NavMesh, NodeIndex};
use crate::options::CorridorOptions;

/// A traversal the navmesh cannot describe (ladder, jump, teleporter).
/// Entered at `start`, left at `end`.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub struct OffMeshLink {
    pub id: u32,
    pub start: Point,
    pub end: Point,
}

/// One element of a coarse path as produced by the graph search.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PathStep {
    Node(NodeIndex),
    Link(OffMeshLink),
}

#[derive(Debug)]
pub enum PathPart {
    Corridor(Corridor),
    Link(OffMeshLink),
}

impl PathPart {
    pub fn as_corridor(&self) -> Option<&Corridor> {
        match self {
            PathPart::Corridor(c) => Some(c),
            PathPart::Link(_) => None,
        }
    }

    pub fn as_corridor_mut(&mut self) -> Option<&mut Corridor> {
        match self {
            PathPart::Corridor(c) => Some(c),
            PathPart::Link(_) => None,
        }
    }

    pub fn as_link(&self) -> Option<&OffMeshLink> {
        match self {
            PathPart::Link(l) => Some(l),
            PathPart::Corridor(_) => None,
        }
    }
}

enum Segment {
    Nodes(Vec<NodeIndex>),
    Link(OffMeshLink),
}

/// Parts are consumed strictly in order; a corridor goes back to the pool as
/// soon as the cursor moves past it.
#[derive(Debug, Default)]
pub struct RichPath {
    parts: Vec<PathPart>,
    current: usize,
}

impl RichPath {
    pub fn new() -> Self { Self::default() }

    /// Replaces the path with the parts of `steps`, going from `start` to `end`.
    ///
    /// Corridors are claimed from `pool`. On error the path is left empty and
    /// every claimed corridor has been returned.
    pub fn initialize(
        &mut self,
        mesh: &NavMesh,
        steps: &[PathStep],
        start: Point,
        end: Point,
        opts: &CorridorOptions,
        pool: &mut CorridorPool,
    ) -> Result<(), CorridorError> {
        self.clear(pool);
        let segments = split_segments(mesh, steps)?;
        if segments.is_empty() { return Err(CorridorError::EmptyPath); }

        let last = segments.len() - 1;
        for (k, seg) in segments.iter().enumerate() {
            let run = match seg {
                Segment::Link(link) => {
                    self.parts.push(PathPart::Link(*link));
                    continue;
                }
                Segment::Nodes(run) => run.as_slice(),
            };
            let part_start = if k == 0 {
                start
            } else {
                match &segments[k - 1] {
                    Segment::Link(link) => link.end,
                    Segment::Nodes(prev) if opts.merge_part_endpoints => mesh.centroid(prev[prev.len() - 1]),
                    Segment::Nodes(_) => mesh.centroid(run[0]),
                }
            };
            let part_end = if k == last {
                end
            } else {
                match &segments[k + 1] {
                    Segment::Link(link) => link.start,
                    Segment::Nodes(next) if opts.merge_part_endpoints => mesh.centroid(next[0]),
                    Segment::Nodes(_) => mesh.centroid(run[run.len() - 1]),
                }
            };

            let mut corridor = pool.claim();
            if let Err(e) = corridor.build(mesh, run, part_start, part_end, opts) {
                pool.release(corridor);
                self.clear(pool);
                return Err(e);
            }
            self.parts.push(PathPart::Corridor(corridor));
        }

        debug!(parts = self.parts.len(), steps = steps.len(), "initialized rich path");
        Ok(())
    }

    pub fn current_part(&self) -> Option<&PathPart> { self.parts.get(self.current) }

    pub fn current_part_mut(&mut self) -> Option<&mut PathPart> { self.parts.get_mut(self.current) }

    pub fn current_index(&self) -> usize { self.current }

    pub fn part_count(&self) -> usize { self.parts.len() }

    pub fn parts(&self) -> &[PathPart] { &self.parts }

    pub fn is_last_part(&self) -> bool { self.current + 1 >= self.parts.len() }

    /// Moves to the next part, handing the buffers of the one just passed
    /// back to `pool`. Returns false when there is no next part.
    pub fn next_part(&mut self, pool: &mut CorridorPool) -> bool {
        if self.current >= self.parts.len() { return false; }
        if let PathPart::Corridor(c) = &mut self.parts[self.current] {
            pool.release(std::mem::take(c));
        }
        self.current += 1;
        self.current < self.parts.len()
    }

    /// Returns every corridor to `pool` and empties the path.
    pub fn clear(&mut self, pool: &mut CorridorPool) {
        for part in self.parts.drain(..) {
            // parts behind the cursor were released by next_part
            match part {
                PathPart::Corridor(c) if c.is_built() => pool.release(c),
                _ => {}
            }
        }
        self.current = 0;
    }
}

/// Groups steps into node runs, breaking at links and region changes.
fn split_segments(mesh: &NavMesh, steps: &[PathStep]) -> Result<Vec<Segment>, CorridorError> {
    let mut segments = Vec::new();
    let mut i = 0;
    while i < steps.len() {
        match steps[i] {
            PathStep::Link(link) => {
                segments.push(Segment::Link(link));
                i += 1;
            }
            PathStep::Node(first) => {
                if !mesh.contains_node(first) { return Err(CorridorError::UnknownNode(first)); }
                let region = mesh.region(first);
                let mut run = vec![first];
                i += 1;
                while let Some(&PathStep::Node(n)) = steps.get(i) {
                    if !mesh.contains_node(n) { return Err(CorridorError::UnknownNode(n)); }
                    if mesh.region(n) != region { break; }
                    run.push(n);
                    i += 1;
                }
                segments.push(Segment::Nodes(run));
            }
        }
    }
    Ok(segments)
}
