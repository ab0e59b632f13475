//! Topology entity types and typed index handles.

use std::fmt;

use crate::math::{BBox3, Plane, Point3};

// --- Typed index handles ---
// Generation-checked slot-map keys: cheap to copy, store, and compare, and a
// handle to a destroyed entity can never alias a newer one.

slotmap::new_key_type! {
    pub struct RegionId;
    pub struct ShellId;
    pub struct FaceId;
    pub struct FaceuseId;
    pub struct LoopId;
    pub struct LoopuseId;
    pub struct EdgeId;
    pub struct EdgeuseId;
    pub struct VertexId;
    pub struct VertexuseId;
}

/// Orientation of a use relative to its underlying geometry.
///
/// For faceuses `Same` means the outward normal agrees with the face plane.
/// For loopuses `Same` marks an exterior boundary and `Opposite` a hole;
/// wire loops are `Unspecified`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Orientation {
    Same,
    Opposite,
    Unspecified,
}

/// Runtime tag naming each kind of entity.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EntityKind {
    Model,
    Region,
    Shell,
    Faceuse,
    Face,
    Loopuse,
    Loop,
    Edgeuse,
    Edge,
    Vertexuse,
    Vertex,
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntityKind::Model => "model",
            EntityKind::Region => "region",
            EntityKind::Shell => "shell",
            EntityKind::Faceuse => "faceuse",
            EntityKind::Face => "face",
            EntityKind::Loopuse => "loopuse",
            EntityKind::Loop => "loop",
            EntityKind::Edgeuse => "edgeuse",
            EntityKind::Edge => "edge",
            EntityKind::Vertexuse => "vertexuse",
            EntityKind::Vertex => "vertex",
        };
        f.write_str(name)
    }
}

/// A handle to any entity of a model.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Entity {
    Model,
    Region(RegionId),
    Shell(ShellId),
    Faceuse(FaceuseId),
    Face(FaceId),
    Loopuse(LoopuseId),
    Loop(LoopId),
    Edgeuse(EdgeuseId),
    Edge(EdgeId),
    Vertexuse(VertexuseId),
    Vertex(VertexId),
}

impl Entity {
    pub fn kind(&self) -> EntityKind {
        match self {
            Entity::Model => EntityKind::Model,
            Entity::Region(_) => EntityKind::Region,
            Entity::Shell(_) => EntityKind::Shell,
            Entity::Faceuse(_) => EntityKind::Faceuse,
            Entity::Face(_) => EntityKind::Face,
            Entity::Loopuse(_) => EntityKind::Loopuse,
            Entity::Loop(_) => EntityKind::Loop,
            Entity::Edgeuse(_) => EntityKind::Edgeuse,
            Entity::Edge(_) => EntityKind::Edge,
            Entity::Vertexuse(_) => EntityKind::Vertexuse,
            Entity::Vertex(_) => EntityKind::Vertex,
        }
    }
}

// --- Structure ---

/// A set of shells treated as one logical solid.
#[derive(Clone, Debug, Default)]
pub struct Region {
    pub shells: Vec<ShellId>,
}

/// One manifold, wire, or point piece of a region.
///
/// A shell owns faceuses (both uses of each face), wire loopuses, wire
/// edgeuses, or a single lone vertexuse when it holds nothing else.
#[derive(Clone, Debug)]
pub struct Shell {
    pub region: RegionId,
    pub faceuses: Vec<FaceuseId>,
    pub loopuses: Vec<LoopuseId>,
    pub edgeuses: Vec<EdgeuseId>,
    pub vertexuse: Option<VertexuseId>,
}

impl Shell {
    pub fn is_empty(&self) -> bool {
        self.faceuses.is_empty()
            && self.loopuses.is_empty()
            && self.edgeuses.is_empty()
            && self.vertexuse.is_none()
    }
}

// --- Faces ---

/// Shared face geometry.
#[derive(Clone, Debug)]
pub struct Face {
    /// One of the (two) faceuses of this face.
    pub faceuse: FaceuseId,
    /// Plane equation, oriented to agree with the `Same` faceuse.
    pub plane: Option<Plane>,
    pub bounds: Option<BBox3>,
}

/// One oriented side of a face within a shell.
#[derive(Clone, Debug)]
pub struct Faceuse {
    pub shell: ShellId,
    pub mate: FaceuseId,
    pub face: FaceId,
    pub orientation: Orientation,
    pub loopuses: Vec<LoopuseId>,
}

// --- Loops ---

#[derive(Clone, Debug)]
pub struct Loop {
    pub loopuse: LoopuseId,
    pub bounds: Option<BBox3>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum LoopuseParent {
    Faceuse(FaceuseId),
    Shell(ShellId),
}

/// A loop is either a closed chain of edgeuses or a single point.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum LoopuseChildren {
    Edges(Vec<EdgeuseId>),
    Vertex(VertexuseId),
}

#[derive(Clone, Debug)]
pub struct Loopuse {
    pub parent: LoopuseParent,
    pub mate: LoopuseId,
    pub lp: LoopId,
    pub orientation: Orientation,
    pub children: LoopuseChildren,
}

// --- Edges ---

/// Shared edge geometry: the reference direction runs `start` → `end`.
#[derive(Clone, Debug)]
pub struct Edge {
    /// Entry point into the radial cycle.
    pub edgeuse: EdgeuseId,
    pub start: VertexId,
    pub end: VertexId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EdgeuseParent {
    Loopuse(LoopuseId),
    Shell(ShellId),
}

/// A directed use of an edge. The edgeuse starts at its own vertexuse and
/// ends where its mate starts.
#[derive(Clone, Debug)]
pub struct Edgeuse {
    pub parent: EdgeuseParent,
    pub mate: EdgeuseId,
    /// Next use in the circular list of all uses of `edge`.
    pub radial: EdgeuseId,
    pub edge: EdgeId,
    pub vertexuse: VertexuseId,
}

// --- Vertices ---

#[derive(Clone, Debug)]
pub struct Vertex {
    pub point: Point3,
    /// Every vertexuse referencing this vertex.
    pub uses: Vec<VertexuseId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum VertexuseParent {
    Shell(ShellId),
    Loopuse(LoopuseId),
    Edgeuse(EdgeuseId),
}

#[derive(Clone, Debug)]
pub struct Vertexuse {
    pub parent: VertexuseParent,
    pub vertex: VertexId,
}
