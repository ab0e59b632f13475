//! Euler operators: the only sanctioned way to change topology.
//!
//! Every operator takes the model from one fully valid state to another.
//! Arguments are checked before the first mutation, so an `Err` leaves the
//! model untouched. A stale handle or a handle whose mate link is broken is
//! corruption, not bad input, and panics.
//!
//! - **make**: regions, shells, vertices, wire edges, loops, faces
//! - **kill**: the inverse teardown, freeing geometry with its last use
//! - **radial**: edge sharing and angular ordering of radial cycles
//! - **moves**: re-homing faceuses between shells

mod kill;
mod make;
mod moves;
mod radial;

pub use kill::{
    kill_edgeuse, kill_faceuse, kill_loopuse, kill_region, kill_shell, kill_unused_vertices,
    kill_vertexuse, kill_vertices_if_unused,
};
pub use make::{
    add_loop_to_face, make_edge, make_face, make_face_from_vertices, make_loop, make_region,
    make_region_shell, make_shell, make_shell_vertex, make_vertex, make_vertex_loop, set_face_plane,
};
pub use moves::move_faceuse;
pub use radial::join_edges;

use crate::topo::*;

/// Entry check on an operator argument: the handle is live and, for paired
/// uses, the mate link is involutive.
fn expect_live(model: &Model, entity: Entity) {
    assert!(
        model.contains(entity),
        "stale handle {entity:?} passed to an Euler operator"
    );
    let involutive = match entity {
        Entity::Faceuse(fu) => {
            let mate = model.faceuse(fu).mate;
            model.faceuses.get(mate).is_some_and(|m| m.mate == fu)
        }
        Entity::Loopuse(lu) => {
            let mate = model.loopuse(lu).mate;
            model.loopuses.get(mate).is_some_and(|m| m.mate == lu)
        }
        Entity::Edgeuse(eu) => {
            let mate = model.edgeuse(eu).mate;
            model.edgeuses.get(mate).is_some_and(|m| m.mate == eu)
        }
        _ => true,
    };
    assert!(involutive, "{entity:?} passed to an Euler operator has a broken mate");
}

/// Full check of the substructure an operator just changed (debug builds).
fn debug_check(model: &Model, root: Entity) {
    if cfg!(debug_assertions) {
        assert_valid(model, root);
    }
}

/// Allocate a vertexuse and register it with its vertex.
fn new_vertexuse(model: &mut Model, vertex: VertexId, parent: VertexuseParent) -> VertexuseId {
    let vu = model.vertexuses.insert(Vertexuse { parent, vertex });
    model.vertices[vertex].uses.push(vu);
    vu
}

/// Allocate a mated edgeuse pair running `v1 → v2` (and back), not yet
/// threaded onto any edge. Returns the `v1 → v2` use.
fn new_edgeuse_pair(
    model: &mut Model,
    parent: EdgeuseParent,
    mate_parent: EdgeuseParent,
    v1: VertexId,
    v2: VertexId,
) -> EdgeuseId {
    let placeholder = |parent| Edgeuse {
        parent,
        mate: EdgeuseId::default(),
        radial: EdgeuseId::default(),
        edge: EdgeId::default(),
        vertexuse: VertexuseId::default(),
    };
    let eu = model.edgeuses.insert(placeholder(parent));
    let mate = model.edgeuses.insert(placeholder(mate_parent));
    let vu1 = new_vertexuse(model, v1, VertexuseParent::Edgeuse(eu));
    let vu2 = new_vertexuse(model, v2, VertexuseParent::Edgeuse(mate));

    let e = &mut model.edgeuses[eu];
    e.mate = mate;
    e.vertexuse = vu1;
    let m = &mut model.edgeuses[mate];
    m.mate = eu;
    m.vertexuse = vu2;
    eu
}

/// Bounding box of a loopuse's vertices.
fn loop_bounds(model: &Model, lu: LoopuseId) -> Option<crate::math::BBox3> {
    let points = model.loopuse_points(lu);
    crate::math::BBox3::from_points(&points)
}
