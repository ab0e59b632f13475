//! Destructive Euler operators.
//!
//! Each kill removes a use together with its mate and everything below
//! them. Geometry (face, loop, edge, vertex) is freed exactly when its last
//! use goes away.

use tracing::{debug, instrument};

use super::radial::unthread;
use super::{debug_check, expect_live};
use crate::error::{TopoError, TopoResult};
use crate::topo::*;

/// Kill a shell's lone vertexuse. The vertex is freed if this was its last use.
#[instrument(skip(model))]
pub fn kill_vertexuse(model: &mut Model, vu: VertexuseId) -> TopoResult<()> {
    expect_live(model, Entity::Vertexuse(vu));
    let VertexuseParent::Shell(shell) = model.vertexuse(vu).parent else {
        return Err(TopoError::AmbiguousKill {
            kind: EntityKind::Vertexuse,
            id: format!("{vu:?}"),
            reason: "it belongs to a loop or edge; kill that instead",
        });
    };
    model.shells[shell].vertexuse = None;
    let vertex_freed = free_vertexuse(model, vu);
    debug!(?vu, vertex_freed, "kill_vertexuse");
    Ok(())
}

/// Kill a wire edgeuse and its mate. The edge is freed only if no other
/// uses remain in its radial cycle.
#[instrument(skip(model))]
pub fn kill_edgeuse(model: &mut Model, eu: EdgeuseId) -> TopoResult<()> {
    expect_live(model, Entity::Edgeuse(eu));
    let EdgeuseParent::Shell(shell) = model.edgeuse(eu).parent else {
        return Err(TopoError::AmbiguousKill {
            kind: EntityKind::Edgeuse,
            id: format!("{eu:?}"),
            reason: "it belongs to a loop; kill the loopuse instead",
        });
    };
    let mate = model.edgeuse(eu).mate;
    model.shells[shell].edgeuses.retain(|&u| u != eu && u != mate);
    let edge_freed = free_edgeuse_pair(model, eu);

    debug!(?eu, edge_freed, "kill_edgeuse");
    debug_check(model, Entity::Shell(shell));
    Ok(())
}

/// Kill a loopuse, its mate and their edgeuses or vertexuses.
///
/// Killing the last loop of a face also kills the face. Returns `true`
/// when that happened.
#[instrument(skip(model))]
pub fn kill_loopuse(model: &mut Model, lu: LoopuseId) -> TopoResult<bool> {
    expect_live(model, Entity::Loopuse(lu));
    let mate = model.loopuse(lu).mate;
    let shell = model.loopuse_shell(lu);

    let face_killed = match model.loopuse(lu).parent {
        LoopuseParent::Shell(s) => {
            model.shells[s].loopuses.retain(|&u| u != lu && u != mate);
            false
        }
        LoopuseParent::Faceuse(fu) => {
            let fumate = model.faceuse(fu).mate;
            model.faceuses[fu].loopuses.retain(|&u| u != lu && u != mate);
            model.faceuses[fumate].loopuses.retain(|&u| u != lu && u != mate);
            if model.faceuse(fu).loopuses.is_empty() {
                model.shells[shell].faceuses.retain(|&u| u != fu && u != fumate);
                free_faceuse_pair(model, fu);
                true
            } else {
                false
            }
        }
    };
    free_loopuse_pair(model, lu);

    debug!(?lu, face_killed, "kill_loopuse");
    debug_check(model, Entity::Shell(shell));
    Ok(face_killed)
}

/// Kill a faceuse, its mate, their loops, and the face.
#[instrument(skip(model))]
pub fn kill_faceuse(model: &mut Model, fu: FaceuseId) {
    expect_live(model, Entity::Faceuse(fu));
    let mate = model.faceuse(fu).mate;
    let shell = model.faceuse(fu).shell;
    model.shells[shell].faceuses.retain(|&u| u != fu && u != mate);
    free_faceuse_pair(model, fu);

    debug!(?fu, "kill_faceuse");
    debug_check(model, Entity::Shell(shell));
}

/// Kill a shell and everything in it.
#[instrument(skip(model))]
pub fn kill_shell(model: &mut Model, shell: ShellId) {
    expect_live(model, Entity::Shell(shell));
    let Some(s) = model.shells.remove(shell) else {
        return;
    };

    for fu in s.faceuses {
        if model.faceuses.contains_key(fu) {
            free_faceuse_pair(model, fu);
        }
    }
    for lu in s.loopuses {
        if model.loopuses.contains_key(lu) {
            free_loopuse_pair(model, lu);
        }
    }
    for eu in s.edgeuses {
        if model.edgeuses.contains_key(eu) {
            free_edgeuse_pair(model, eu);
        }
    }
    if let Some(vu) = s.vertexuse {
        free_vertexuse(model, vu);
    }
    model.regions[s.region].shells.retain(|&x| x != shell);

    debug!(?shell, "kill_shell");
}

/// Kill a region and all of its shells.
#[instrument(skip(model))]
pub fn kill_region(model: &mut Model, region: RegionId) {
    expect_live(model, Entity::Region(region));
    for shell in model.region(region).shells.clone() {
        kill_shell(model, shell);
    }
    model.regions.remove(region);
    model.region_order.retain(|&r| r != region);
    debug!(?region, "kill_region");
}

/// Free every vertex of the model that has no uses. Returns how many were freed.
pub fn kill_unused_vertices(model: &mut Model) -> usize {
    let unused: Vec<VertexId> = model
        .vertices
        .iter()
        .filter(|(_, v)| v.uses.is_empty())
        .map(|(id, _)| id)
        .collect();
    kill_vertices_if_unused(model, &unused)
}

/// Free those of `vertices` that have no uses, leaving all others alone.
/// Returns how many were freed.
pub fn kill_vertices_if_unused(model: &mut Model, vertices: &[VertexId]) -> usize {
    let mut freed = 0;
    for &v in vertices {
        if model.vertices.get(v).is_some_and(|vx| vx.uses.is_empty()) {
            model.vertices.remove(v);
            freed += 1;
        }
    }
    if freed > 0 {
        debug!(freed, "kill_vertices_if_unused");
    }
    freed
}

// --- Internal teardown ---
// These free entities and their geometry but leave the owner's child list
// to the caller.

/// Unregister and free a vertexuse without touching its vertex, which the
/// caller is about to give a new use.
pub(super) fn detach_vertexuse(model: &mut Model, vu: VertexuseId) {
    if let Some(u) = model.vertexuses.remove(vu) {
        model.vertices[u.vertex].uses.retain(|&x| x != vu);
    }
}

/// Free a vertexuse; returns `true` if its vertex went with it.
pub(super) fn free_vertexuse(model: &mut Model, vu: VertexuseId) -> bool {
    let Some(u) = model.vertexuses.remove(vu) else {
        return false;
    };
    let vertex = &mut model.vertices[u.vertex];
    vertex.uses.retain(|&x| x != vu);
    if vertex.uses.is_empty() {
        model.vertices.remove(u.vertex);
        true
    } else {
        false
    }
}

/// Free an edgeuse pair; returns `true` if its edge went with it.
pub(super) fn free_edgeuse_pair(model: &mut Model, eu: EdgeuseId) -> bool {
    let mate = model.edgeuses[eu].mate;
    let edge = model.edgeuses[eu].edge;
    let edge_freed = !unthread(model, eu);
    if edge_freed {
        model.edges.remove(edge);
    }
    for u in [eu, mate] {
        if let Some(e) = model.edgeuses.remove(u) {
            free_vertexuse(model, e.vertexuse);
        }
    }
    edge_freed
}

pub(super) fn free_loopuse_pair(model: &mut Model, lu: LoopuseId) {
    let mate = model.loopuses[lu].mate;
    let lp = model.loopuses[lu].lp;
    for u in [lu, mate] {
        let Some(l) = model.loopuses.remove(u) else { continue };
        match l.children {
            LoopuseChildren::Vertex(vu) => {
                free_vertexuse(model, vu);
            }
            LoopuseChildren::Edges(eus) => {
                for eu in eus {
                    if model.edgeuses.contains_key(eu) {
                        free_edgeuse_pair(model, eu);
                    }
                }
            }
        }
    }
    model.loops.remove(lp);
}

pub(super) fn free_faceuse_pair(model: &mut Model, fu: FaceuseId) {
    let mate = model.faceuses[fu].mate;
    let face = model.faceuses[fu].face;
    for &lu in &model.faceuses[fu].loopuses.clone() {
        if model.loopuses.contains_key(lu) {
            free_loopuse_pair(model, lu);
        }
    }
    model.faceuses.remove(fu);
    model.faceuses.remove(mate);
    model.faces.remove(face);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::euler::{
        make_edge, make_face_from_vertices, make_region_shell, make_shell_vertex, make_vertex,
        make_vertex_loop,
    };
    use crate::math::Point3;
    use crate::topo::validate_model;

    fn square(model: &mut Model) -> (ShellId, Vec<VertexId>) {
        let (_, shell) = make_region_shell(model);
        let v = [(0.0, 0.0), (1.0, 0.0), (1.0, 1.0), (0.0, 1.0)]
            .iter()
            .map(|&(x, y)| make_vertex(model, Point3::new(x, y, 0.0)))
            .collect();
        (shell, v)
    }

    #[test]
    fn last_loop_takes_its_face_and_geometry() {
        let mut model = Model::new();
        let (shell, v) = square(&mut model);
        let fu = make_face_from_vertices(&mut model, shell, &v).unwrap();
        let lu = model.faceuse(fu).loopuses[0];

        assert_eq!(kill_loopuse(&mut model, lu), Ok(true));
        assert_eq!(model.face_count(), 0);
        assert_eq!(model.loop_count(), 0);
        assert_eq!(model.edge_count(), 0);
        assert_eq!(model.vertex_count(), 0);
        assert!(model.shell(shell).is_empty());
        assert!(validate_model(&model).valid);
    }

    #[test]
    fn shared_edge_survives_face_kill() {
        let mut model = Model::new();
        let (shell, v) = square(&mut model);
        let first = make_face_from_vertices(&mut model, shell, &[v[0], v[1], v[2]]).unwrap();
        make_face_from_vertices(&mut model, shell, &[v[0], v[2], v[3]]).unwrap();

        kill_faceuse(&mut model, first);
        assert_eq!(model.face_count(), 1);
        assert_eq!(model.edge_count(), 3);
        assert_eq!(model.vertex_count(), 3);
        assert!(!model.contains(Entity::Vertex(v[1])));
        let diagonal = model.find_edgeuse(shell, v[0], v[2]).unwrap();
        assert_eq!(model.radial_cycle(diagonal).len(), 2);
        assert!(validate_model(&model).valid);
    }

    #[test]
    fn loop_edgeuses_cannot_be_killed_alone() {
        let mut model = Model::new();
        let (shell, v) = square(&mut model);
        let fu = make_face_from_vertices(&mut model, shell, &v).unwrap();
        let eu = model.loopuse_edgeuses(model.faceuse(fu).loopuses[0])[0];
        assert!(matches!(
            kill_edgeuse(&mut model, eu),
            Err(TopoError::AmbiguousKill { kind: EntityKind::Edgeuse, .. })
        ));
        assert_eq!(model.edgeuse_count(), 8);
    }

    #[test]
    fn wire_edge_kill_keeps_other_uses() {
        let mut model = Model::new();
        let (shell, v) = square(&mut model);
        let a = make_edge(&mut model, shell, v[0], v[1]).unwrap();
        let b = make_edge(&mut model, shell, v[0], v[1]).unwrap();

        kill_edgeuse(&mut model, a).unwrap();
        assert_eq!(model.edge_count(), 1);
        assert_eq!(model.radial_cycle(b).len(), 2);
        kill_edgeuse(&mut model, b).unwrap();
        assert_eq!(model.edge_count(), 0);
        // v[2] and v[3] never had uses.
        assert_eq!(model.vertex_count(), 2);
        assert_eq!(kill_unused_vertices(&mut model), 2);
        assert!(validate_model(&model).valid);
    }

    #[test]
    fn vertexuse_kills() {
        let mut model = Model::new();
        let (shell, v) = square(&mut model);
        let vu = make_shell_vertex(&mut model, shell, v[0]).unwrap();
        kill_vertexuse(&mut model, vu).unwrap();
        assert!(!model.contains(Entity::Vertex(v[0])));

        let lu = make_vertex_loop(&mut model, shell, v[1]).unwrap();
        let LoopuseChildren::Vertex(inner) = model.loopuse(lu).children else {
            panic!("point loop without a vertexuse");
        };
        assert!(matches!(kill_vertexuse(&mut model, inner), Err(TopoError::AmbiguousKill { .. })));
        assert_eq!(kill_loopuse(&mut model, lu), Ok(false));
        assert_eq!(kill_vertices_if_unused(&mut model, &v), 2);
        assert_eq!(model.vertex_count(), 0);
    }

    #[test]
    fn region_kill_empties_the_model() {
        let mut model = Model::new();
        let (shell, v) = square(&mut model);
        make_face_from_vertices(&mut model, shell, &v).unwrap();
        let region = model.shell(shell).region;

        kill_region(&mut model, region);
        assert!(model.regions().is_empty());
        assert_eq!(model.shell_count(), 0);
        assert_eq!(model.edgeuse_count(), 0);
        assert_eq!(model.vertex_count(), 0);
    }
}
