//! Generic top-down traversal of a model.
//!
//! [`visit`] walks from any entity down to the geometry beneath it and
//! calls back into a [`Visitor`]: `before_*` on entering a structural
//! entity, then its children, then its geometry, then `after_*`. Leaf
//! geometry (face, loop, edge, vertex) gets a single `visit_*` call.
//!
//! Order below a shell: faceuses, then wire loopuses, then wire edgeuses,
//! then the lone vertexuse. Both uses of every mated pair are walked.
//!
//! The walk never deduplicates. A vertex is visited once per vertexuse, an
//! edge once per edgeuse, and a face and loop once per use, so a visitor
//! that needs each element once must keep its own visited set (as
//! [`EntityCounts`] does for vertices and edges).

use std::collections::HashSet;

use crate::topo::*;

/// Callbacks for [`visit`]. Every method defaults to doing nothing.
#[allow(unused_variables)]
pub trait Visitor {
    fn before_model(&mut self, model: &Model) {}
    fn after_model(&mut self, model: &Model) {}

    fn before_region(&mut self, model: &Model, region: RegionId) {}
    fn after_region(&mut self, model: &Model, region: RegionId) {}

    fn before_shell(&mut self, model: &Model, shell: ShellId) {}
    fn after_shell(&mut self, model: &Model, shell: ShellId) {}

    fn before_faceuse(&mut self, model: &Model, fu: FaceuseId) {}
    fn after_faceuse(&mut self, model: &Model, fu: FaceuseId) {}

    fn before_loopuse(&mut self, model: &Model, lu: LoopuseId) {}
    fn after_loopuse(&mut self, model: &Model, lu: LoopuseId) {}

    fn before_edgeuse(&mut self, model: &Model, eu: EdgeuseId) {}
    fn after_edgeuse(&mut self, model: &Model, eu: EdgeuseId) {}

    fn before_vertexuse(&mut self, model: &Model, vu: VertexuseId) {}
    fn after_vertexuse(&mut self, model: &Model, vu: VertexuseId) {}

    fn visit_face(&mut self, model: &Model, face: FaceId) {}
    fn visit_loop(&mut self, model: &Model, lp: LoopId) {}
    fn visit_edge(&mut self, model: &Model, edge: EdgeId) {}
    fn visit_vertex(&mut self, model: &Model, vertex: VertexId) {}
}

/// Walk `root` and everything beneath it.
pub fn visit<V: Visitor + ?Sized>(model: &Model, root: Entity, visitor: &mut V) {
    let mut walk = Walk { model, visitor };
    match root {
        Entity::Model => walk.model(),
        Entity::Region(r) => walk.region(r),
        Entity::Shell(s) => walk.shell(s),
        Entity::Faceuse(fu) => walk.faceuse(fu),
        Entity::Face(f) => walk.visitor.visit_face(model, f),
        Entity::Loopuse(lu) => walk.loopuse(lu),
        Entity::Loop(l) => walk.visitor.visit_loop(model, l),
        Entity::Edgeuse(eu) => walk.edgeuse(eu),
        Entity::Edge(e) => walk.visitor.visit_edge(model, e),
        Entity::Vertexuse(vu) => walk.vertexuse(vu),
        Entity::Vertex(v) => walk.visitor.visit_vertex(model, v),
    }
}

struct Walk<'a, V: ?Sized> {
    model: &'a Model,
    visitor: &'a mut V,
}

impl<V: Visitor + ?Sized> Walk<'_, V> {
    fn model(&mut self) {
        let m = self.model;
        self.visitor.before_model(m);
        for &r in m.regions() {
            self.region(r);
        }
        self.visitor.after_model(m);
    }

    fn region(&mut self, r: RegionId) {
        let m = self.model;
        self.visitor.before_region(m, r);
        for &s in &m.region(r).shells {
            self.shell(s);
        }
        self.visitor.after_region(m, r);
    }

    fn shell(&mut self, s: ShellId) {
        let m = self.model;
        let shell = m.shell(s);
        self.visitor.before_shell(m, s);
        for &fu in &shell.faceuses {
            self.faceuse(fu);
        }
        for &lu in &shell.loopuses {
            self.loopuse(lu);
        }
        for &eu in &shell.edgeuses {
            self.edgeuse(eu);
        }
        if let Some(vu) = shell.vertexuse {
            self.vertexuse(vu);
        }
        self.visitor.after_shell(m, s);
    }

    fn faceuse(&mut self, fu: FaceuseId) {
        let m = self.model;
        let use_ = m.faceuse(fu);
        self.visitor.before_faceuse(m, fu);
        for &lu in &use_.loopuses {
            self.loopuse(lu);
        }
        self.visitor.visit_face(m, use_.face);
        self.visitor.after_faceuse(m, fu);
    }

    fn loopuse(&mut self, lu: LoopuseId) {
        let m = self.model;
        let use_ = m.loopuse(lu);
        self.visitor.before_loopuse(m, lu);
        match &use_.children {
            LoopuseChildren::Edges(eus) => {
                for &eu in eus {
                    self.edgeuse(eu);
                }
            }
            LoopuseChildren::Vertex(vu) => self.vertexuse(*vu),
        }
        self.visitor.visit_loop(m, use_.lp);
        self.visitor.after_loopuse(m, lu);
    }

    fn edgeuse(&mut self, eu: EdgeuseId) {
        let m = self.model;
        let use_ = m.edgeuse(eu);
        self.visitor.before_edgeuse(m, eu);
        self.vertexuse(use_.vertexuse);
        self.visitor.visit_edge(m, use_.edge);
        self.visitor.after_edgeuse(m, eu);
    }

    fn vertexuse(&mut self, vu: VertexuseId) {
        let m = self.model;
        self.visitor.before_vertexuse(m, vu);
        self.visitor.visit_vertex(m, m.vertexuse(vu).vertex);
        self.visitor.after_vertexuse(m, vu);
    }
}

/// Statistics visitor: how often each kind of entity was reached, plus
/// the number of distinct vertices and edges behind those visits.
#[derive(Clone, Debug, Default)]
pub struct EntityCounts {
    pub regions: usize,
    pub shells: usize,
    pub faceuses: usize,
    pub loopuses: usize,
    pub edgeuses: usize,
    pub vertexuses: usize,
    pub face_visits: usize,
    pub loop_visits: usize,
    pub edge_visits: usize,
    pub vertex_visits: usize,
    distinct_edges: HashSet<EdgeId>,
    distinct_vertices: HashSet<VertexId>,
}

impl EntityCounts {
    /// Count everything beneath `root`.
    pub fn of(model: &Model, root: Entity) -> Self {
        let mut counts = Self::default();
        visit(model, root, &mut counts);
        counts
    }

    pub fn distinct_edges(&self) -> usize {
        self.distinct_edges.len()
    }

    pub fn distinct_vertices(&self) -> usize {
        self.distinct_vertices.len()
    }
}

impl Visitor for EntityCounts {
    fn before_region(&mut self, _: &Model, _: RegionId) {
        self.regions += 1;
    }

    fn before_shell(&mut self, _: &Model, _: ShellId) {
        self.shells += 1;
    }

    fn before_faceuse(&mut self, _: &Model, _: FaceuseId) {
        self.faceuses += 1;
    }

    fn before_loopuse(&mut self, _: &Model, _: LoopuseId) {
        self.loopuses += 1;
    }

    fn before_edgeuse(&mut self, _: &Model, _: EdgeuseId) {
        self.edgeuses += 1;
    }

    fn before_vertexuse(&mut self, _: &Model, _: VertexuseId) {
        self.vertexuses += 1;
    }

    fn visit_face(&mut self, _: &Model, _: FaceId) {
        self.face_visits += 1;
    }

    fn visit_loop(&mut self, _: &Model, _: LoopId) {
        self.loop_visits += 1;
    }

    fn visit_edge(&mut self, _: &Model, edge: EdgeId) {
        self.edge_visits += 1;
        self.distinct_edges.insert(edge);
    }

    fn visit_vertex(&mut self, _: &Model, vertex: VertexId) {
        self.vertex_visits += 1;
        self.distinct_vertices.insert(vertex);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::euler::{make_edge, make_face_from_vertices, make_region_shell, make_vertex};
    use crate::math::Point3;

    /// Records the order of callbacks as short tags.
    #[derive(Default)]
    struct Trace(Vec<&'static str>);

    impl Visitor for Trace {
        fn before_faceuse(&mut self, _: &Model, _: FaceuseId) {
            self.0.push("fu<");
        }

        fn after_faceuse(&mut self, _: &Model, _: FaceuseId) {
            self.0.push(">fu");
        }

        fn before_loopuse(&mut self, _: &Model, _: LoopuseId) {
            self.0.push("lu<");
        }

        fn after_loopuse(&mut self, _: &Model, _: LoopuseId) {
            self.0.push(">lu");
        }

        fn before_edgeuse(&mut self, _: &Model, _: EdgeuseId) {
            self.0.push("eu<");
        }

        fn after_edgeuse(&mut self, _: &Model, _: EdgeuseId) {
            self.0.push(">eu");
        }

        fn visit_face(&mut self, _: &Model, _: FaceId) {
            self.0.push("f");
        }

        fn visit_loop(&mut self, _: &Model, _: LoopId) {
            self.0.push("l");
        }

        fn visit_edge(&mut self, _: &Model, _: EdgeId) {
            self.0.push("e");
        }

        fn visit_vertex(&mut self, _: &Model, _: VertexId) {
            self.0.push("v");
        }
    }

    fn triangle(model: &mut Model) -> (ShellId, FaceuseId) {
        let (_, shell) = make_region_shell(model);
        let v: Vec<_> = [(0.0, 0.0), (1.0, 0.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| make_vertex(model, Point3::new(x, y, 0.0)))
            .collect();
        let fu = make_face_from_vertices(model, shell, &v).unwrap();
        (shell, fu)
    }

    #[test]
    fn faceuse_walk_is_top_down() {
        let mut model = Model::new();
        let (_, fu) = triangle(&mut model);
        let mut trace = Trace::default();
        visit(&model, Entity::Faceuse(fu), &mut trace);

        let edge_block = ["eu<", "v", "e", ">eu"];
        let mut expected = vec!["fu<", "lu<"];
        for _ in 0..3 {
            expected.extend(edge_block);
        }
        expected.extend(["l", ">lu", "f", ">fu"]);
        assert_eq!(trace.0, expected);
    }

    #[test]
    fn shared_vertices_are_revisited() {
        let mut model = Model::new();
        let (shell, _) = triangle(&mut model);
        let counts = EntityCounts::of(&model, Entity::Shell(shell));

        // Two faceuses, each with one loop of three edgeuses.
        assert_eq!(counts.faceuses, 2);
        assert_eq!(counts.loopuses, 2);
        assert_eq!(counts.edgeuses, 6);
        assert_eq!(counts.vertex_visits, 6);
        assert_eq!(counts.face_visits, 2);
        assert_eq!(counts.distinct_vertices(), 3);
        assert_eq!(counts.distinct_edges(), 3);
    }

    #[test]
    fn wire_edges_are_walked_after_faces() {
        let mut model = Model::new();
        let (shell, _) = triangle(&mut model);
        let a = make_vertex(&mut model, Point3::new(5.0, 0.0, 0.0));
        let b = make_vertex(&mut model, Point3::new(6.0, 0.0, 0.0));
        make_edge(&mut model, shell, a, b).unwrap();

        let counts = EntityCounts::of(&model, Entity::Model);
        assert_eq!(counts.regions, 1);
        assert_eq!(counts.shells, 1);
        assert_eq!(counts.edgeuses, 8);
        assert_eq!(counts.distinct_vertices(), 5);
    }
}
