//! Structural validation of the topology graph.
//!
//! Checks, for everything reachable from a starting entity:
//! - Every faceuse, loopuse and edgeuse has a mate, and `mate(mate(u)) == u`
//! - Mates agree on their geometry and sit under mated parents
//! - Every radial cycle closes, references only its own edge, and keeps
//!   mates adjacent
//! - Every up-pointer names the entity whose child list holds it
//! - Every geometry element is referenced by at least one use
//!
//! [`validate`] collects every violation it finds; [`assert_valid`] panics on
//! the first one. The check is linear in the size of the walked structure.

use std::collections::{HashMap, HashSet};
use std::fmt::Debug;

use thiserror::Error;
use tracing::error;

use super::store::Model;
use super::types::*;

/// A broken structural invariant.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum Violation {
    #[error("{kind} {id} references missing {target} {target_id}")]
    Dangling {
        kind: EntityKind,
        id: String,
        target: EntityKind,
        target_id: String,
    },

    #[error("{kind} {id} is its own mate")]
    MateIsSelf { kind: EntityKind, id: String },

    #[error("{kind} {id}: mate of mate is not the original use")]
    MateNotInvolutive { kind: EntityKind, id: String },

    #[error("{kind} {id}: mate disagrees on {what}")]
    MateMismatch {
        kind: EntityKind,
        id: String,
        what: &'static str,
    },

    #[error("{kind} {id} does not point back to its owner {owner}")]
    BadParent {
        kind: EntityKind,
        id: String,
        owner: String,
    },

    #[error("edge {edge}: radial cycle from {start} does not return")]
    RadialOpen { edge: String, start: String },

    #[error("edge {edge}: radial cycle passes through {eu}, a use of another edge")]
    RadialForeign { edge: String, eu: String },

    #[error("edge {edge}: mates of {eu} are not radially adjacent")]
    RadialPairSplit { edge: String, eu: String },

    #[error("edge {edge}: edgeuse {eu} references it but is not on its radial cycle")]
    OffCycle { edge: String, eu: String },

    #[error("edge {edge}: radial cycle has {found} uses but {expected} edgeuses reference it")]
    RadialCount {
        edge: String,
        found: usize,
        expected: usize,
    },

    #[error("edge {edge}: edgeuse {eu} does not run between the edge's endpoints")]
    EdgeEndpoints { edge: String, eu: String },

    #[error("loopuse {id}: edgeuse chain breaks after {eu}")]
    BrokenLoop { id: String, eu: String },

    #[error("{kind} {id} has no children")]
    Empty { kind: EntityKind, id: String },

    #[error("shell {id} has a lone vertexuse alongside other content")]
    CrowdedShell { id: String },

    #[error("vertex {vertex} does not list its use {vu}")]
    UnlistedUse { vertex: String, vu: String },

    #[error("{kind} {id} has no uses")]
    Orphan { kind: EntityKind, id: String },

    #[error("{count} {kind}(s) are not reachable from any region")]
    Unreachable { kind: EntityKind, count: usize },
}

/// Result of topology validation.
#[derive(Debug)]
pub struct ValidationResult {
    pub valid: bool,
    pub errors: Vec<Violation>,
}

/// Validate everything reachable from `root`.
pub fn validate(model: &Model, root: Entity) -> ValidationResult {
    let mut checker = Checker::new(model);
    if root == Entity::Model {
        checker.radial_counts = Some(independent_radial_counts(model));
    }
    checker.check(root);
    if root == Entity::Model {
        checker.check_unreachable();
        checker.check_orphans();
    }

    ValidationResult {
        valid: checker.errors.is_empty(),
        errors: checker.errors,
    }
}

/// Validate the whole model.
pub fn validate_model(model: &Model) -> ValidationResult {
    validate(model, Entity::Model)
}

/// Panic with a diagnostic naming the first violation reachable from `root`.
pub fn assert_valid(model: &Model, root: Entity) {
    let result = validate(model, root);
    if let Some(first) = result.errors.first() {
        error!(?root, violations = result.errors.len(), "topology is corrupt");
        panic!("topology violation below {root:?}: {first}");
    }
}

fn id<K: Debug>(k: K) -> String {
    format!("{k:?}")
}

fn independent_radial_counts(model: &Model) -> HashMap<EdgeId, usize> {
    let mut counts = HashMap::new();
    for eu in model.edgeuses.values() {
        *counts.entry(eu.edge).or_insert(0) += 1;
    }
    counts
}

struct Checker<'m> {
    model: &'m Model,
    errors: Vec<Violation>,
    radial_counts: Option<HashMap<EdgeId, usize>>,
    edges_seen: HashSet<EdgeId>,
    /// Uses found on each edge's radial cycle, for cycles that closed.
    cycles: HashMap<EdgeId, HashSet<EdgeuseId>>,
    vertices_seen: HashSet<VertexId>,
    reached: [usize; 4],
}

const FU: usize = 0;
const LU: usize = 1;
const EU: usize = 2;
const VU: usize = 3;

impl<'m> Checker<'m> {
    fn new(model: &'m Model) -> Self {
        Self {
            model,
            errors: Vec::new(),
            radial_counts: None,
            edges_seen: HashSet::new(),
            cycles: HashMap::new(),
            vertices_seen: HashSet::new(),
            reached: [0; 4],
        }
    }

    fn dangling<K: Debug, T: Debug>(&mut self, kind: EntityKind, k: K, target: EntityKind, t: T) {
        self.errors.push(Violation::Dangling {
            kind,
            id: id(k),
            target,
            target_id: id(t),
        });
    }

    fn bad_parent<K: Debug, O: Debug>(&mut self, kind: EntityKind, k: K, owner: O) {
        self.errors.push(Violation::BadParent { kind, id: id(k), owner: id(owner) });
    }

    fn mate_mismatch<K: Debug>(&mut self, kind: EntityKind, k: K, what: &'static str) {
        self.errors.push(Violation::MateMismatch { kind, id: id(k), what });
    }

    fn check(&mut self, root: Entity) {
        let m = self.model;
        if !m.contains(root) {
            self.errors.push(Violation::Dangling {
                kind: EntityKind::Model,
                id: "model".into(),
                target: root.kind(),
                target_id: format!("{root:?}"),
            });
            return;
        }
        match root {
            Entity::Model => {
                for &r in &m.region_order {
                    self.check_region(r);
                }
            }
            Entity::Region(r) => self.check_region(r),
            Entity::Shell(s) => self.check_shell(s),
            Entity::Faceuse(fu) => self.check_faceuse(fu),
            Entity::Face(f) => self.check_face(f),
            Entity::Loopuse(lu) => self.check_loopuse(lu),
            Entity::Loop(l) => self.check_loop(l),
            Entity::Edgeuse(eu) => self.check_edgeuse(eu),
            Entity::Edge(e) => self.check_edge(e),
            Entity::Vertexuse(vu) => self.check_vertexuse(vu),
            Entity::Vertex(v) => self.check_vertex(v),
        }
    }

    fn check_region(&mut self, r: RegionId) {
        let m = self.model;
        let Some(region) = m.regions.get(r) else {
            return self.dangling(EntityKind::Model, "model", EntityKind::Region, r);
        };
        for &s in &region.shells {
            match m.shells.get(s) {
                None => self.dangling(EntityKind::Region, r, EntityKind::Shell, s),
                Some(shell) if shell.region != r => self.bad_parent(EntityKind::Shell, s, r),
                Some(_) => self.check_shell(s),
            }
        }
    }

    fn check_shell(&mut self, s: ShellId) {
        let m = self.model;
        let shell = &m.shells[s];

        for &fu in &shell.faceuses {
            match m.faceuses.get(fu) {
                None => self.dangling(EntityKind::Shell, s, EntityKind::Faceuse, fu),
                Some(f) if f.shell != s => self.bad_parent(EntityKind::Faceuse, fu, s),
                Some(_) => self.check_faceuse(fu),
            }
        }
        for &lu in &shell.loopuses {
            match m.loopuses.get(lu) {
                None => self.dangling(EntityKind::Shell, s, EntityKind::Loopuse, lu),
                Some(l) if l.parent != LoopuseParent::Shell(s) => {
                    self.bad_parent(EntityKind::Loopuse, lu, s)
                }
                Some(_) => self.check_loopuse(lu),
            }
        }
        for &eu in &shell.edgeuses {
            match m.edgeuses.get(eu) {
                None => self.dangling(EntityKind::Shell, s, EntityKind::Edgeuse, eu),
                Some(e) if e.parent != EdgeuseParent::Shell(s) => {
                    self.bad_parent(EntityKind::Edgeuse, eu, s)
                }
                Some(_) => self.check_edgeuse(eu),
            }
        }
        if let Some(vu) = shell.vertexuse {
            let crowded = !shell.faceuses.is_empty()
                || !shell.loopuses.is_empty()
                || !shell.edgeuses.is_empty();
            if crowded {
                self.errors.push(Violation::CrowdedShell { id: id(s) });
            }
            match m.vertexuses.get(vu) {
                None => self.dangling(EntityKind::Shell, s, EntityKind::Vertexuse, vu),
                Some(v) if v.parent != VertexuseParent::Shell(s) => {
                    self.bad_parent(EntityKind::Vertexuse, vu, s)
                }
                Some(_) => self.check_vertexuse(vu),
            }
        }
    }

    fn check_faceuse(&mut self, fu: FaceuseId) {
        let m = self.model;
        let k = EntityKind::Faceuse;
        let use_ = &m.faceuses[fu];
        self.reached[FU] += 1;

        if use_.mate == fu {
            self.errors.push(Violation::MateIsSelf { kind: k, id: id(fu) });
        }
        match m.faceuses.get(use_.mate) {
            None => self.dangling(k, fu, k, use_.mate),
            Some(mate) => {
                if mate.mate != fu {
                    self.errors.push(Violation::MateNotInvolutive { kind: k, id: id(fu) });
                }
                if mate.face != use_.face {
                    self.mate_mismatch(k, fu, "face");
                }
                if mate.shell != use_.shell {
                    self.mate_mismatch(k, fu, "shell");
                }
                let paired = matches!(
                    (use_.orientation, mate.orientation),
                    (Orientation::Same, Orientation::Opposite)
                        | (Orientation::Opposite, Orientation::Same)
                );
                if !paired {
                    self.mate_mismatch(k, fu, "orientation");
                }
            }
        }

        if m.faces.contains_key(use_.face) {
            self.check_face(use_.face);
        } else {
            self.dangling(k, fu, EntityKind::Face, use_.face);
        }

        if use_.loopuses.is_empty() {
            self.errors.push(Violation::Empty { kind: k, id: id(fu) });
        }
        for &lu in &use_.loopuses {
            match m.loopuses.get(lu) {
                None => self.dangling(k, fu, EntityKind::Loopuse, lu),
                Some(l) if l.parent != LoopuseParent::Faceuse(fu) => {
                    self.bad_parent(EntityKind::Loopuse, lu, fu)
                }
                Some(_) => self.check_loopuse(lu),
            }
        }
    }

    fn check_face(&mut self, f: FaceId) {
        let m = self.model;
        let face = &m.faces[f];
        match m.faceuses.get(face.faceuse) {
            Some(fu) if fu.face == f => {}
            Some(_) => self.bad_parent(EntityKind::Face, f, face.faceuse),
            None => self.dangling(EntityKind::Face, f, EntityKind::Faceuse, face.faceuse),
        }
    }

    fn check_loopuse(&mut self, lu: LoopuseId) {
        let m = self.model;
        let k = EntityKind::Loopuse;
        let use_ = &m.loopuses[lu];
        self.reached[LU] += 1;

        if use_.mate == lu {
            self.errors.push(Violation::MateIsSelf { kind: k, id: id(lu) });
        }
        match m.loopuses.get(use_.mate) {
            None => self.dangling(k, lu, k, use_.mate),
            Some(mate) => {
                if mate.mate != lu {
                    self.errors.push(Violation::MateNotInvolutive { kind: k, id: id(lu) });
                }
                if mate.lp != use_.lp {
                    self.mate_mismatch(k, lu, "loop");
                }
                if mate.orientation != use_.orientation {
                    self.mate_mismatch(k, lu, "orientation");
                }
                let mated_parent = match (use_.parent, mate.parent) {
                    (LoopuseParent::Faceuse(a), LoopuseParent::Faceuse(b)) => {
                        m.faceuses.get(a).is_some_and(|fu| fu.mate == b)
                    }
                    (LoopuseParent::Shell(a), LoopuseParent::Shell(b)) => a == b,
                    _ => false,
                };
                if !mated_parent {
                    self.mate_mismatch(k, lu, "parent");
                }
                self.check_loopuse_children_mirror(lu, &use_.children, &mate.children);
            }
        }

        if m.loops.contains_key(use_.lp) {
            self.check_loop(use_.lp);
        } else {
            self.dangling(k, lu, EntityKind::Loop, use_.lp);
        }

        match &use_.children {
            LoopuseChildren::Vertex(vu) => match m.vertexuses.get(*vu) {
                None => self.dangling(k, lu, EntityKind::Vertexuse, *vu),
                Some(v) if v.parent != VertexuseParent::Loopuse(lu) => {
                    self.bad_parent(EntityKind::Vertexuse, *vu, lu)
                }
                Some(_) => self.check_vertexuse(*vu),
            },
            LoopuseChildren::Edges(eus) => {
                if eus.is_empty() {
                    self.errors.push(Violation::Empty { kind: k, id: id(lu) });
                }
                let mut all_live = true;
                for &eu in eus {
                    match m.edgeuses.get(eu) {
                        None => {
                            all_live = false;
                            self.dangling(k, lu, EntityKind::Edgeuse, eu);
                        }
                        Some(e) if e.parent != EdgeuseParent::Loopuse(lu) => {
                            all_live = false;
                            self.bad_parent(EntityKind::Edgeuse, eu, lu);
                        }
                        Some(_) => self.check_edgeuse(eu),
                    }
                }
                if all_live {
                    self.check_chain(lu, eus);
                }
            }
        }
    }

    /// The mate's edgeuses are the mates of ours in reverse order.
    fn check_loopuse_children_mirror(
        &mut self,
        lu: LoopuseId,
        ours: &LoopuseChildren,
        theirs: &LoopuseChildren,
    ) {
        let m = self.model;
        let ok = match (ours, theirs) {
            (LoopuseChildren::Vertex(a), LoopuseChildren::Vertex(b)) => {
                match (m.vertexuses.get(*a), m.vertexuses.get(*b)) {
                    (Some(a), Some(b)) => a.vertex == b.vertex,
                    _ => true,
                }
            }
            (LoopuseChildren::Edges(a), LoopuseChildren::Edges(b)) => {
                a.len() == b.len()
                    && a.iter().zip(b.iter().rev()).all(|(&x, &y)| {
                        m.edgeuses.get(x).map_or(true, |e| e.mate == y)
                    })
            }
            _ => false,
        };
        if !ok {
            self.mate_mismatch(EntityKind::Loopuse, lu, "children");
        }
    }

    fn check_chain(&mut self, lu: LoopuseId, eus: &[EdgeuseId]) {
        let m = self.model;
        let endpoint = |eu: EdgeuseId, end: bool| -> Option<VertexId> {
            let e = m.edgeuses.get(eu)?;
            let e = if end { m.edgeuses.get(e.mate)? } else { e };
            Some(m.vertexuses.get(e.vertexuse)?.vertex)
        };
        for (i, &eu) in eus.iter().enumerate() {
            let next = eus[(i + 1) % eus.len()];
            let joined = match (endpoint(eu, true), endpoint(next, false)) {
                (Some(a), Some(b)) => a == b,
                // Missing links are reported by the edgeuse checks.
                _ => true,
            };
            if !joined {
                self.errors.push(Violation::BrokenLoop { id: id(lu), eu: id(eu) });
            }
        }
    }

    fn check_edgeuse(&mut self, eu: EdgeuseId) {
        let m = self.model;
        let k = EntityKind::Edgeuse;
        let use_ = &m.edgeuses[eu];
        self.reached[EU] += 1;

        if use_.mate == eu {
            self.errors.push(Violation::MateIsSelf { kind: k, id: id(eu) });
        }
        match m.edgeuses.get(use_.mate) {
            None => self.dangling(k, eu, k, use_.mate),
            Some(mate) => {
                if mate.mate != eu {
                    self.errors.push(Violation::MateNotInvolutive { kind: k, id: id(eu) });
                }
                if mate.edge != use_.edge {
                    self.mate_mismatch(k, eu, "edge");
                }
                let mated_parent = match (use_.parent, mate.parent) {
                    (EdgeuseParent::Loopuse(a), EdgeuseParent::Loopuse(b)) => {
                        m.loopuses.get(a).is_some_and(|l| l.mate == b)
                    }
                    (EdgeuseParent::Shell(a), EdgeuseParent::Shell(b)) => a == b,
                    _ => false,
                };
                if !mated_parent {
                    self.mate_mismatch(k, eu, "parent");
                }
            }
        }

        match m.vertexuses.get(use_.vertexuse) {
            None => self.dangling(k, eu, EntityKind::Vertexuse, use_.vertexuse),
            Some(v) if v.parent != VertexuseParent::Edgeuse(eu) => {
                self.bad_parent(EntityKind::Vertexuse, use_.vertexuse, eu)
            }
            Some(_) => self.check_vertexuse(use_.vertexuse),
        }

        if !m.edges.contains_key(use_.edge) {
            return self.dangling(k, eu, EntityKind::Edge, use_.edge);
        }
        self.check_endpoints(eu);
        if self.edges_seen.insert(use_.edge) {
            self.check_edge(use_.edge);
        }
        if self.cycles.get(&use_.edge).is_some_and(|c| !c.contains(&eu)) {
            self.errors.push(Violation::OffCycle { edge: id(use_.edge), eu: id(eu) });
        }
    }

    fn check_endpoints(&mut self, eu: EdgeuseId) {
        let m = self.model;
        let use_ = &m.edgeuses[eu];
        let edge = &m.edges[use_.edge];
        let start = m.vertexuses.get(use_.vertexuse).map(|v| v.vertex);
        let end = m
            .edgeuses
            .get(use_.mate)
            .and_then(|mate| m.vertexuses.get(mate.vertexuse))
            .map(|v| v.vertex);
        if let (Some(a), Some(b)) = (start, end) {
            let ok = (a == edge.start && b == edge.end) || (a == edge.end && b == edge.start);
            if !ok {
                self.errors.push(Violation::EdgeEndpoints { edge: id(use_.edge), eu: id(eu) });
            }
        }
    }

    fn check_edge(&mut self, e: EdgeId) {
        let m = self.model;
        let edge = &m.edges[e];
        let start = edge.edgeuse;
        match m.edgeuses.get(start) {
            None => return self.dangling(EntityKind::Edge, e, EntityKind::Edgeuse, start),
            Some(eu) if eu.edge != e => return self.bad_parent(EntityKind::Edge, e, start),
            Some(_) => {}
        }

        // Walk the radial cycle; it can never be longer than the arena.
        let limit = m.edgeuses.len();
        let mut current = start;
        let mut steps = 0;
        let mut members = HashSet::new();
        loop {
            let Some(use_) = m.edgeuses.get(current) else {
                return self.dangling(EntityKind::Edgeuse, current, EntityKind::Edgeuse, "radial");
            };
            if use_.edge != e {
                return self.errors.push(Violation::RadialForeign { edge: id(e), eu: id(current) });
            }
            let mate_adjacent = use_.radial == use_.mate
                || m.edgeuses.get(use_.mate).is_some_and(|mate| mate.radial == current);
            if !mate_adjacent {
                self.errors.push(Violation::RadialPairSplit { edge: id(e), eu: id(current) });
            }
            steps += 1;
            members.insert(current);
            current = use_.radial;
            if current == start {
                break;
            }
            if steps > limit {
                return self.errors.push(Violation::RadialOpen { edge: id(e), start: id(start) });
            }
        }
        self.cycles.insert(e, members);

        if let Some(&expected) = self.radial_counts.as_ref().and_then(|c| c.get(&e)) {
            if steps != expected {
                self.errors.push(Violation::RadialCount { edge: id(e), found: steps, expected });
            }
        }
    }

    fn check_vertexuse(&mut self, vu: VertexuseId) {
        let m = self.model;
        let use_ = &m.vertexuses[vu];
        self.reached[VU] += 1;
        match m.vertices.get(use_.vertex) {
            None => self.dangling(EntityKind::Vertexuse, vu, EntityKind::Vertex, use_.vertex),
            Some(v) => {
                if !v.uses.contains(&vu) {
                    self.errors.push(Violation::UnlistedUse {
                        vertex: id(use_.vertex),
                        vu: id(vu),
                    });
                }
                if self.vertices_seen.insert(use_.vertex) {
                    self.check_vertex(use_.vertex);
                }
            }
        }
    }

    fn check_vertex(&mut self, v: VertexId) {
        let m = self.model;
        let vertex = &m.vertices[v];
        if vertex.uses.is_empty() {
            self.errors.push(Violation::Orphan { kind: EntityKind::Vertex, id: id(v) });
        }
        for &vu in &vertex.uses {
            match m.vertexuses.get(vu) {
                None => self.dangling(EntityKind::Vertex, v, EntityKind::Vertexuse, vu),
                Some(u) if u.vertex != v => self.bad_parent(EntityKind::Vertexuse, vu, v),
                Some(_) => {}
            }
        }
    }

    fn check_loop(&mut self, l: LoopId) {
        let m = self.model;
        let lp = &m.loops[l];
        match m.loopuses.get(lp.loopuse) {
            Some(lu) if lu.lp == l => {}
            Some(_) => self.bad_parent(EntityKind::Loop, l, lp.loopuse),
            None => self.dangling(EntityKind::Loop, l, EntityKind::Loopuse, lp.loopuse),
        }
    }

    fn check_unreachable(&mut self) {
        let m = self.model;
        let totals = [
            (EntityKind::Faceuse, m.faceuses.len(), self.reached[FU]),
            (EntityKind::Loopuse, m.loopuses.len(), self.reached[LU]),
            (EntityKind::Edgeuse, m.edgeuses.len(), self.reached[EU]),
            (EntityKind::Vertexuse, m.vertexuses.len(), self.reached[VU]),
        ];
        for (kind, total, reached) in totals {
            if total > reached {
                self.errors.push(Violation::Unreachable { kind, count: total - reached });
            }
        }
    }

    /// Geometry must be referenced by at least one live use.
    fn check_orphans(&mut self) {
        let m = self.model;
        let used_faces: HashSet<FaceId> = m.faceuses.values().map(|u| u.face).collect();
        let used_loops: HashSet<LoopId> = m.loopuses.values().map(|u| u.lp).collect();
        let used_edges: HashSet<EdgeId> = m.edgeuses.values().map(|u| u.edge).collect();
        let used_verts: HashSet<VertexId> = m.vertexuses.values().map(|u| u.vertex).collect();

        for f in m.faces.keys().filter(|f| !used_faces.contains(f)) {
            self.errors.push(Violation::Orphan { kind: EntityKind::Face, id: id(f) });
        }
        for l in m.loops.keys().filter(|l| !used_loops.contains(l)) {
            self.errors.push(Violation::Orphan { kind: EntityKind::Loop, id: id(l) });
        }
        for e in m.edges.keys().filter(|e| !used_edges.contains(e)) {
            self.errors.push(Violation::Orphan { kind: EntityKind::Edge, id: id(e) });
        }
        for v in m.vertices.keys().filter(|v| !used_verts.contains(v)) {
            self.errors.push(Violation::Orphan { kind: EntityKind::Vertex, id: id(v) });
        }
    }
}
