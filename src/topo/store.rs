//! Arena-based topology store.
//!
//! All entities of one model live in the `Model`. Entities reference each
//! other via generation-checked keys (e.g. `FaceuseId`, `EdgeuseId`), which
//! keeps the mate/radial/parent cycles out of the ownership graph.
//!
//! The arenas are only writable inside the crate: every mutation goes
//! through [`crate::euler`]. Accessors panic on a stale handle, which on a
//! structurally valid model cannot happen.

use std::collections::HashSet;

use slotmap::SlotMap;

use super::types::*;
use crate::math::Point3;

/// Root of one non-manifold solid assembly and owner of all its entities.
#[derive(Clone, Debug, Default)]
pub struct Model {
    pub(crate) region_order: Vec<RegionId>,
    pub(crate) regions: SlotMap<RegionId, Region>,
    pub(crate) shells: SlotMap<ShellId, Shell>,
    pub(crate) faces: SlotMap<FaceId, Face>,
    pub(crate) faceuses: SlotMap<FaceuseId, Faceuse>,
    pub(crate) loops: SlotMap<LoopId, Loop>,
    pub(crate) loopuses: SlotMap<LoopuseId, Loopuse>,
    pub(crate) edges: SlotMap<EdgeId, Edge>,
    pub(crate) edgeuses: SlotMap<EdgeuseId, Edgeuse>,
    pub(crate) vertices: SlotMap<VertexId, Vertex>,
    pub(crate) vertexuses: SlotMap<VertexuseId, Vertexuse>,
}

impl Model {
    pub fn new() -> Self {
        Self::default()
    }

    // --- Get entities ---

    /// Regions in creation order.
    pub fn regions(&self) -> &[RegionId] {
        &self.region_order
    }

    pub fn region(&self, id: RegionId) -> &Region {
        &self.regions[id]
    }

    pub fn shell(&self, id: ShellId) -> &Shell {
        &self.shells[id]
    }

    pub fn face(&self, id: FaceId) -> &Face {
        &self.faces[id]
    }

    pub fn faceuse(&self, id: FaceuseId) -> &Faceuse {
        &self.faceuses[id]
    }

    pub fn lp(&self, id: LoopId) -> &Loop {
        &self.loops[id]
    }

    pub fn loopuse(&self, id: LoopuseId) -> &Loopuse {
        &self.loopuses[id]
    }

    pub fn edge(&self, id: EdgeId) -> &Edge {
        &self.edges[id]
    }

    pub fn edgeuse(&self, id: EdgeuseId) -> &Edgeuse {
        &self.edgeuses[id]
    }

    pub fn vertex(&self, id: VertexId) -> &Vertex {
        &self.vertices[id]
    }

    pub fn vertexuse(&self, id: VertexuseId) -> &Vertexuse {
        &self.vertexuses[id]
    }

    /// True if the handle still refers to a live entity of this model.
    pub fn contains(&self, entity: Entity) -> bool {
        match entity {
            Entity::Model => true,
            Entity::Region(id) => self.regions.contains_key(id),
            Entity::Shell(id) => self.shells.contains_key(id),
            Entity::Faceuse(id) => self.faceuses.contains_key(id),
            Entity::Face(id) => self.faces.contains_key(id),
            Entity::Loopuse(id) => self.loopuses.contains_key(id),
            Entity::Loop(id) => self.loops.contains_key(id),
            Entity::Edgeuse(id) => self.edgeuses.contains_key(id),
            Entity::Edge(id) => self.edges.contains_key(id),
            Entity::Vertexuse(id) => self.vertexuses.contains_key(id),
            Entity::Vertex(id) => self.vertices.contains_key(id),
        }
    }

    // --- Counts ---

    pub fn shell_count(&self) -> usize {
        self.shells.len()
    }

    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    pub fn loop_count(&self) -> usize {
        self.loops.len()
    }

    pub fn edge_count(&self) -> usize {
        self.edges.len()
    }

    pub fn edgeuse_count(&self) -> usize {
        self.edgeuses.len()
    }

    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    // --- Navigation helpers ---

    pub fn point(&self, v: VertexId) -> Point3 {
        self.vertex(v).point
    }

    /// Vertex at the start of an edgeuse.
    pub fn edgeuse_start(&self, eu: EdgeuseId) -> VertexId {
        self.vertexuse(self.edgeuse(eu).vertexuse).vertex
    }

    /// Vertex at the end of an edgeuse (the start of its mate).
    pub fn edgeuse_end(&self, eu: EdgeuseId) -> VertexId {
        self.edgeuse_start(self.edgeuse(eu).mate)
    }

    /// Direction of an edgeuse relative to its edge's reference direction.
    pub fn edgeuse_orientation(&self, eu: EdgeuseId) -> Orientation {
        let edge = self.edge(self.edgeuse(eu).edge);
        if self.edgeuse_start(eu) == edge.start {
            Orientation::Same
        } else {
            Orientation::Opposite
        }
    }

    /// Shell that ultimately owns a loopuse.
    pub fn loopuse_shell(&self, lu: LoopuseId) -> ShellId {
        match self.loopuse(lu).parent {
            LoopuseParent::Faceuse(fu) => self.faceuse(fu).shell,
            LoopuseParent::Shell(s) => s,
        }
    }

    /// Shell that ultimately owns an edgeuse.
    pub fn edgeuse_shell(&self, eu: EdgeuseId) -> ShellId {
        match self.edgeuse(eu).parent {
            EdgeuseParent::Loopuse(lu) => self.loopuse_shell(lu),
            EdgeuseParent::Shell(s) => s,
        }
    }

    /// Faceuse owning an edgeuse, if it sits in a face loop.
    pub fn edgeuse_faceuse(&self, eu: EdgeuseId) -> Option<FaceuseId> {
        match self.edgeuse(eu).parent {
            EdgeuseParent::Loopuse(lu) => match self.loopuse(lu).parent {
                LoopuseParent::Faceuse(fu) => Some(fu),
                LoopuseParent::Shell(_) => None,
            },
            EdgeuseParent::Shell(_) => None,
        }
    }

    /// Edgeuses of a loopuse in loop order (empty for a point loop).
    pub fn loopuse_edgeuses(&self, lu: LoopuseId) -> &[EdgeuseId] {
        match &self.loopuse(lu).children {
            LoopuseChildren::Edges(eus) => eus,
            LoopuseChildren::Vertex(_) => &[],
        }
    }

    /// Vertices of a loopuse in loop order.
    pub fn loopuse_vertices(&self, lu: LoopuseId) -> Vec<VertexId> {
        match &self.loopuse(lu).children {
            LoopuseChildren::Edges(eus) => eus.iter().map(|&eu| self.edgeuse_start(eu)).collect(),
            LoopuseChildren::Vertex(vu) => vec![self.vertexuse(*vu).vertex],
        }
    }

    /// Points of a loopuse in loop order.
    pub fn loopuse_points(&self, lu: LoopuseId) -> Vec<Point3> {
        self.loopuse_vertices(lu).into_iter().map(|v| self.point(v)).collect()
    }

    /// Iterate the radial cycle of an edgeuse, starting with the edgeuse itself.
    pub fn radial_cycle(&self, eu: EdgeuseId) -> Vec<EdgeuseId> {
        let mut result = vec![eu];
        let mut current = self.edgeuse(eu).radial;
        while current != eu {
            result.push(current);
            current = self.edgeuse(current).radial;
        }
        result
    }

    /// Any edgeuse in `shell` running from `v1` to `v2` (in either direction
    /// of the underlying edge).
    pub fn find_edgeuse(&self, shell: ShellId, v1: VertexId, v2: VertexId) -> Option<EdgeuseId> {
        self.vertex(v1).uses.iter().find_map(|&vu| match self.vertexuse(vu).parent {
            VertexuseParent::Edgeuse(eu)
                if self.edgeuse_end(eu) == v2 && self.edgeuse_shell(eu) == shell =>
            {
                Some(eu)
            }
            _ => None,
        })
    }

    /// Collect all distinct vertices referenced by a shell.
    pub fn shell_vertices(&self, shell: ShellId) -> Vec<VertexId> {
        let s = self.shell(shell);
        let mut seen = HashSet::new();
        let mut verts = Vec::new();
        let mut add = |v: VertexId| {
            if seen.insert(v) {
                verts.push(v);
            }
        };

        for &fu in &s.faceuses {
            for &lu in &self.faceuse(fu).loopuses {
                self.loopuse_vertices(lu).into_iter().for_each(&mut add);
            }
        }
        for &lu in &s.loopuses {
            self.loopuse_vertices(lu).into_iter().for_each(&mut add);
        }
        for &eu in &s.edgeuses {
            add(self.edgeuse_start(eu));
        }
        if let Some(vu) = s.vertexuse {
            add(self.vertexuse(vu).vertex);
        }
        verts
    }

    /// Faceuses of a shell with `Same` orientation: one per face.
    pub fn shell_faces(&self, shell: ShellId) -> Vec<FaceuseId> {
        self.shell(shell)
            .faceuses
            .iter()
            .copied()
            .filter(|&fu| self.faceuse(fu).orientation == Orientation::Same)
            .collect()
    }
}
