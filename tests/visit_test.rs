use std::collections::HashMap;

use nmgkernel::euler::{
    make_edge, make_region, make_shell, make_shell_vertex, make_vertex, make_vertex_loop,
};
use nmgkernel::topo::*;
use nmgkernel::{import_polygons, visit, EntityCounts, ImportOptions, Point3, Visitor};

/// Records how many times each entity was reached.
#[derive(Default)]
struct Recorder(HashMap<Entity, usize>);

impl Recorder {
    fn hit(&mut self, e: Entity) {
        *self.0.entry(e).or_insert(0) += 1;
    }

    fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = (&Entity, &usize)> {
        self.0.iter().filter(move |(e, _)| e.kind() == kind)
    }
}

impl Visitor for Recorder {
    fn before_region(&mut self, _: &Model, r: RegionId) {
        self.hit(Entity::Region(r));
    }

    fn before_shell(&mut self, _: &Model, s: ShellId) {
        self.hit(Entity::Shell(s));
    }

    fn before_faceuse(&mut self, _: &Model, fu: FaceuseId) {
        self.hit(Entity::Faceuse(fu));
    }

    fn before_loopuse(&mut self, _: &Model, lu: LoopuseId) {
        self.hit(Entity::Loopuse(lu));
    }

    fn before_edgeuse(&mut self, _: &Model, eu: EdgeuseId) {
        self.hit(Entity::Edgeuse(eu));
    }

    fn before_vertexuse(&mut self, _: &Model, vu: VertexuseId) {
        self.hit(Entity::Vertexuse(vu));
    }

    fn visit_face(&mut self, _: &Model, f: FaceId) {
        self.hit(Entity::Face(f));
    }

    fn visit_loop(&mut self, _: &Model, l: LoopId) {
        self.hit(Entity::Loop(l));
    }

    fn visit_edge(&mut self, _: &Model, e: EdgeId) {
        self.hit(Entity::Edge(e));
    }

    fn visit_vertex(&mut self, _: &Model, v: VertexId) {
        self.hit(Entity::Vertex(v));
    }
}

/// A tetrahedron shell, a wire shell with an edge and a point loop, and a
/// point shell, all in one region.
fn mixed_model() -> Model {
    let mut model = Model::new();
    let region = make_region(&mut model);
    let tetra = "4 4\n0 0 0\n1 0 0\n0 1 0\n0 0 1\n3 1 3 2\n3 1 2 4\n3 2 3 4\n3 3 1 4\n";
    let report = import_polygons(&mut model, region, tetra, &ImportOptions::default()).unwrap();

    // A wire edge along one of the tetrahedron's edges, in the same shell.
    let corners = model.shell_vertices(report.shell);
    make_edge(&mut model, report.shell, corners[0], corners[1]).unwrap();

    let wire = make_shell(&mut model, region);
    let a = make_vertex(&mut model, Point3::new(5.0, 0.0, 0.0));
    let b = make_vertex(&mut model, Point3::new(6.0, 0.0, 0.0));
    make_edge(&mut model, wire, a, b).unwrap();
    make_vertex_loop(&mut model, wire, a).unwrap();

    let point = make_shell(&mut model, region);
    let p = make_vertex(&mut model, Point3::new(9.0, 9.0, 9.0));
    make_shell_vertex(&mut model, point, p).unwrap();
    model
}

#[test]
fn every_use_is_reached_exactly_once() {
    let model = mixed_model();
    assert!(validate_model(&model).valid);
    let mut rec = Recorder::default();
    visit(&model, Entity::Model, &mut rec);

    let use_kinds = [
        EntityKind::Shell,
        EntityKind::Faceuse,
        EntityKind::Loopuse,
        EntityKind::Edgeuse,
        EntityKind::Vertexuse,
    ];
    for kind in use_kinds {
        for (e, &n) in rec.of_kind(kind) {
            assert_eq!(n, 1, "{e:?} reached {n} times");
        }
    }
    assert_eq!(rec.of_kind(EntityKind::Shell).count(), model.shell_count());
    assert_eq!(rec.of_kind(EntityKind::Faceuse).count(), 2 * model.face_count());
    assert_eq!(rec.of_kind(EntityKind::Loopuse).count(), 2 * model.loop_count());
    assert_eq!(rec.of_kind(EntityKind::Edgeuse).count(), model.edgeuse_count());
}

#[test]
fn shared_geometry_is_reached_once_per_use() {
    let model = mixed_model();
    let mut rec = Recorder::default();
    visit(&model, Entity::Model, &mut rec);

    for (e, &n) in rec.of_kind(EntityKind::Vertex) {
        let Entity::Vertex(v) = *e else { unreachable!() };
        assert_eq!(n, model.vertex(v).uses.len(), "vertex {v:?}");
    }
    for (e, &n) in rec.of_kind(EntityKind::Edge) {
        let Entity::Edge(edge) = *e else { unreachable!() };
        assert_eq!(n, model.radial_cycle(model.edge(edge).edgeuse).len(), "edge {edge:?}");
    }
    for (_, &n) in rec.of_kind(EntityKind::Face) {
        assert_eq!(n, 2);
    }
    assert_eq!(rec.of_kind(EntityKind::Vertex).count(), model.vertex_count());
    assert_eq!(rec.of_kind(EntityKind::Edge).count(), model.edge_count());
}

#[test]
fn counts_match_the_store() {
    let model = mixed_model();
    let counts = EntityCounts::of(&model, Entity::Model);
    assert_eq!(counts.regions, 1);
    assert_eq!(counts.shells, 3);
    assert_eq!(counts.faceuses, 8);
    // 4 face loops and 1 point loop, both uses of each.
    assert_eq!(counts.loopuses, 10);
    assert_eq!(counts.edgeuses, model.edgeuse_count());
    assert_eq!(counts.distinct_edges(), model.edge_count());
    assert_eq!(counts.distinct_vertices(), model.vertex_count());
    assert!(counts.vertex_visits > counts.distinct_vertices());
}

#[test]
fn subtree_walks_stay_below_their_root() {
    let model = mixed_model();
    let shell = model.region(model.regions()[0]).shells[0];
    let fu = model.shell_faces(shell)[0];

    let counts = EntityCounts::of(&model, Entity::Faceuse(fu));
    assert_eq!(counts.shells, 0);
    assert_eq!(counts.faceuses, 1);
    assert_eq!(counts.loopuses, 1);
    assert_eq!(counts.edgeuses, 3);
    assert_eq!(counts.face_visits, 1);
}
