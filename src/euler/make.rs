//! Constructive Euler operators.

use tracing::{debug, instrument};

use super::kill::detach_vertexuse;
use super::radial::{resort, thread_new_edge, thread_onto};
use super::{debug_check, expect_live, loop_bounds, new_edgeuse_pair, new_vertexuse};
use crate::error::{TopoError, TopoResult};
use crate::math::{BBox3, Plane, Point3};
use crate::topo::*;

/// Make an empty region.
#[instrument(skip(model))]
pub fn make_region(model: &mut Model) -> RegionId {
    let region = model.regions.insert(Region::default());
    model.region_order.push(region);
    debug!(?region, "make_region");
    region
}

/// Make an empty shell in `region`.
#[instrument(skip(model))]
pub fn make_shell(model: &mut Model, region: RegionId) -> ShellId {
    expect_live(model, Entity::Region(region));
    let shell = model.shells.insert(Shell {
        region,
        faceuses: Vec::new(),
        loopuses: Vec::new(),
        edgeuses: Vec::new(),
        vertexuse: None,
    });
    model.regions[region].shells.push(shell);
    debug!(?shell, "make_shell");
    shell
}

/// Make a region holding one empty shell.
pub fn make_region_shell(model: &mut Model) -> (RegionId, ShellId) {
    let region = make_region(model);
    let shell = make_shell(model, region);
    (region, shell)
}

/// Make a vertex with no uses yet.
///
/// A free vertex is a transient state: it must be consumed by a later
/// operator or released with [`super::kill_vertices_if_unused`] before the
/// model is next validated as a whole.
pub fn make_vertex(model: &mut Model, point: Point3) -> VertexId {
    model.vertices.insert(Vertex { point, uses: Vec::new() })
}

/// Attach a lone vertexuse of `vertex` to an empty shell, making it a
/// point shell.
#[instrument(skip(model))]
pub fn make_shell_vertex(
    model: &mut Model,
    shell: ShellId,
    vertex: VertexId,
) -> TopoResult<VertexuseId> {
    expect_live(model, Entity::Shell(shell));
    expect_live(model, Entity::Vertex(vertex));
    if !model.shell(shell).is_empty() {
        return Err(TopoError::ShellNotEmpty(shell));
    }

    let vu = new_vertexuse(model, vertex, VertexuseParent::Shell(shell));
    model.shells[shell].vertexuse = Some(vu);
    debug!(?vu, "make_shell_vertex");
    debug_check(model, Entity::Shell(shell));
    Ok(vu)
}

/// Make a point loop on `vertex` (and its mate) as wire content of `shell`.
#[instrument(skip(model))]
pub fn make_vertex_loop(
    model: &mut Model,
    shell: ShellId,
    vertex: VertexId,
) -> TopoResult<LoopuseId> {
    expect_live(model, Entity::Shell(shell));
    expect_live(model, Entity::Vertex(vertex));
    consume_lone_vertexuse(model, shell, &[vertex])?;

    let point = model.point(vertex);
    let lp = model.loops.insert(Loop {
        loopuse: LoopuseId::default(),
        bounds: Some(BBox3::new(point, point)),
    });
    let parent = LoopuseParent::Shell(shell);
    let lu = alloc_loopuse_pair(model, lp, parent, parent);
    let mate = model.loopuses[lu].mate;
    for u in [lu, mate] {
        let vu = new_vertexuse(model, vertex, VertexuseParent::Loopuse(u));
        model.loopuses[u].children = LoopuseChildren::Vertex(vu);
    }
    model.shells[shell].loopuses.extend([lu, mate]);

    debug!(?lu, ?lp, "make_vertex_loop");
    debug_check(model, Entity::Shell(shell));
    Ok(lu)
}

/// Make a wire edge from `v1` to `v2` in `shell`.
///
/// If the shell already holds an edge between the two vertices the new
/// pair is threaded into that edge's radial cycle; otherwise a new edge is
/// made. A lone vertexuse of either endpoint is absorbed.
#[instrument(skip(model))]
pub fn make_edge(
    model: &mut Model,
    shell: ShellId,
    v1: VertexId,
    v2: VertexId,
) -> TopoResult<EdgeuseId> {
    expect_live(model, Entity::Shell(shell));
    expect_live(model, Entity::Vertex(v1));
    expect_live(model, Entity::Vertex(v2));
    if v1 == v2 {
        return Err(TopoError::DegenerateEdge(v1));
    }
    let existing = model.find_edgeuse(shell, v1, v2);
    consume_lone_vertexuse(model, shell, &[v1, v2])?;

    let parent = EdgeuseParent::Shell(shell);
    let eu = new_edgeuse_pair(model, parent, parent, v1, v2);
    match existing {
        Some(other) => thread_onto(model, eu, other),
        None => {
            thread_new_edge(model, eu);
        }
    }
    let mate = model.edgeuses[eu].mate;
    model.shells[shell].edgeuses.extend([eu, mate]);

    debug!(?eu, edge = ?model.edgeuses[eu].edge, shared = existing.is_some(), "make_edge");
    debug_check(model, Entity::Shell(shell));
    Ok(eu)
}

/// Close a sequence of wire edgeuses of `shell` into a loop and its mate.
///
/// `edgeuses` lists one use of each pair, in loop order; each must end
/// where the next starts and the last must end where the first starts.
/// The mate loop holds the mates in reverse order.
#[instrument(skip(model))]
pub fn make_loop(
    model: &mut Model,
    shell: ShellId,
    edgeuses: &[EdgeuseId],
) -> TopoResult<LoopuseId> {
    expect_live(model, Entity::Shell(shell));
    if edgeuses.is_empty() {
        return Err(TopoError::TooFew { required: 1, actual: 0 });
    }
    let mut taken = Vec::with_capacity(edgeuses.len() * 2);
    for &eu in edgeuses {
        expect_live(model, Entity::Edgeuse(eu));
        if model.edgeuse(eu).parent != EdgeuseParent::Shell(shell) {
            return Err(TopoError::WrongParent {
                kind: EntityKind::Edgeuse,
                id: format!("{eu:?}"),
                expected: EntityKind::Shell,
            });
        }
        let mate = model.edgeuse(eu).mate;
        if taken.contains(&eu) || taken.contains(&mate) {
            return Err(TopoError::DuplicateEdgeuse(eu));
        }
        taken.extend([eu, mate]);
    }
    for (i, &eu) in edgeuses.iter().enumerate() {
        let next = edgeuses[(i + 1) % edgeuses.len()];
        if model.edgeuse_end(eu) != model.edgeuse_start(next) {
            return Err(TopoError::OpenChain { from: eu, to: next });
        }
    }

    let lp = model.loops.insert(Loop { loopuse: LoopuseId::default(), bounds: None });
    let parent = LoopuseParent::Shell(shell);
    let lu = alloc_loopuse_pair(model, lp, parent, parent);
    let lumate = model.loopuses[lu].mate;
    let mates: Vec<EdgeuseId> = edgeuses.iter().rev().map(|&eu| model.edgeuses[eu].mate).collect();
    for &eu in edgeuses {
        model.edgeuses[eu].parent = EdgeuseParent::Loopuse(lu);
    }
    for &eu in &mates {
        model.edgeuses[eu].parent = EdgeuseParent::Loopuse(lumate);
    }
    model.loopuses[lu].children = LoopuseChildren::Edges(edgeuses.to_vec());
    model.loopuses[lumate].children = LoopuseChildren::Edges(mates);

    let s = &mut model.shells[shell];
    s.edgeuses.retain(|eu| !taken.contains(eu));
    s.loopuses.extend([lu, lumate]);
    let bounds = loop_bounds(model, lu);
    model.loops[lp].bounds = bounds;

    debug!(?lu, ?lp, edges = edgeuses.len(), "make_loop");
    debug_check(model, Entity::Shell(shell));
    Ok(lu)
}

/// Make a face from a wire loop of edges.
///
/// `loopuse` becomes the exterior loop of a new `Same` faceuse and its mate
/// the exterior loop of the `Opposite` mate faceuse. The face has no plane
/// until [`set_face_plane`] attaches one.
#[instrument(skip(model))]
pub fn make_face(model: &mut Model, loopuse: LoopuseId) -> TopoResult<FaceuseId> {
    expect_live(model, Entity::Loopuse(loopuse));
    let lu = model.loopuse(loopuse);
    let LoopuseParent::Shell(shell) = lu.parent else {
        return Err(TopoError::WrongParent {
            kind: EntityKind::Loopuse,
            id: format!("{loopuse:?}"),
            expected: EntityKind::Shell,
        });
    };
    if !matches!(lu.children, LoopuseChildren::Edges(_)) {
        return Err(TopoError::NotWireLoop(loopuse));
    }
    let lumate = lu.mate;
    let bounds = model.lp(lu.lp).bounds;

    let (fu, fumate) = alloc_faceuse_pair(model, shell, bounds);
    for (u, owner) in [(loopuse, fu), (lumate, fumate)] {
        let l = &mut model.loopuses[u];
        l.parent = LoopuseParent::Faceuse(owner);
        l.orientation = Orientation::Same;
        model.faceuses[owner].loopuses.push(u);
    }
    model.shells[shell].loopuses.retain(|&u| u != loopuse && u != lumate);

    debug!(?fu, face = ?model.faceuses[fu].face, "make_face");
    debug_check(model, Entity::Shell(shell));
    Ok(fu)
}

/// Build a closed face in `shell` from an ordered vertex list in one step.
///
/// Consecutive vertices (and the last and first) are joined by edgeuses;
/// where the shell already has an edge between two of them, the new uses
/// share it. Returns the `Same` faceuse, whose exterior loop visits the
/// vertices in the given order.
#[instrument(skip(model, vertices), fields(n = vertices.len()))]
pub fn make_face_from_vertices(
    model: &mut Model,
    shell: ShellId,
    vertices: &[VertexId],
) -> TopoResult<FaceuseId> {
    expect_live(model, Entity::Shell(shell));
    check_polygon(model, vertices)?;
    consume_lone_vertexuse(model, shell, vertices)?;

    let (fu, fumate) = alloc_faceuse_pair(model, shell, None);
    let (lu, shared) = build_face_loop(model, shell, (fu, fumate), vertices, Orientation::Same);
    let face = model.faceuse(fu).face;
    let bounds = model.lp(model.loopuse(lu).lp).bounds;
    model.faces[face].bounds = bounds;

    debug!(?fu, ?face, shared, "make_face_from_vertices");
    debug_check(model, Entity::Shell(shell));
    Ok(fu)
}

/// Add another loop through `vertices` to an existing face: a hole when
/// `orientation` is `Opposite`, a further exterior boundary when `Same`.
///
/// Edges already present in the shell are shared as in
/// [`make_face_from_vertices`]. Returns the loopuse on `fu`'s side.
#[instrument(skip(model, vertices), fields(n = vertices.len()))]
pub fn add_loop_to_face(
    model: &mut Model,
    fu: FaceuseId,
    vertices: &[VertexId],
    orientation: Orientation,
) -> TopoResult<LoopuseId> {
    expect_live(model, Entity::Faceuse(fu));
    check_polygon(model, vertices)?;
    let shell = model.faceuse(fu).shell;
    let fumate = model.faceuse(fu).mate;

    let (lu, shared) = build_face_loop(model, shell, (fu, fumate), vertices, orientation);
    let face = model.faceuse(fu).face;
    let loop_bounds = model.lp(model.loopuse(lu).lp).bounds;
    let merged = match (model.face(face).bounds, loop_bounds) {
        (Some(a), Some(b)) => Some(a.union(&b)),
        (a, b) => a.or(b),
    };
    model.faces[face].bounds = merged;

    debug!(?lu, ?orientation, shared, "add_loop_to_face");
    debug_check(model, Entity::Shell(shell));
    Ok(lu)
}

fn check_polygon(model: &Model, vertices: &[VertexId]) -> TopoResult<()> {
    let n = vertices.len();
    if n < 3 {
        return Err(TopoError::TooFew { required: 3, actual: n });
    }
    for (i, &v) in vertices.iter().enumerate() {
        expect_live(model, Entity::Vertex(v));
        if v == vertices[(i + 1) % n] {
            return Err(TopoError::DegenerateEdge(v));
        }
    }
    Ok(())
}

/// Thread a loop through `vertices` on a faceuse pair. The loop on `fu`
/// visits the vertices in order; the mate loop runs the other way.
/// Returns the new loopuse and how many of its edges were shared.
fn build_face_loop(
    model: &mut Model,
    shell: ShellId,
    (fu, fumate): (FaceuseId, FaceuseId),
    vertices: &[VertexId],
    orientation: Orientation,
) -> (LoopuseId, usize) {
    let n = vertices.len();
    let bounds = BBox3::from_points(&vertices.iter().map(|&v| model.point(v)).collect::<Vec<_>>());
    let lp = model.loops.insert(Loop { loopuse: LoopuseId::default(), bounds });
    let lu = alloc_loopuse_pair(
        model,
        lp,
        LoopuseParent::Faceuse(fu),
        LoopuseParent::Faceuse(fumate),
    );
    let lumate = model.loopuses[lu].mate;

    let mut eus = Vec::with_capacity(n);
    let mut shared = 0;
    for i in 0..n {
        let (a, b) = (vertices[i], vertices[(i + 1) % n]);
        let existing = model.find_edgeuse(shell, a, b);
        let parents = (EdgeuseParent::Loopuse(lu), EdgeuseParent::Loopuse(lumate));
        let eu = new_edgeuse_pair(model, parents.0, parents.1, a, b);
        match existing {
            Some(other) => {
                thread_onto(model, eu, other);
                shared += 1;
            }
            None => {
                thread_new_edge(model, eu);
            }
        }
        eus.push(eu);
    }
    let mates: Vec<EdgeuseId> = eus.iter().rev().map(|&eu| model.edgeuses[eu].mate).collect();

    for (u, owner, children) in [(lu, fu, eus), (lumate, fumate, mates)] {
        let l = &mut model.loopuses[u];
        l.orientation = orientation;
        l.children = LoopuseChildren::Edges(children);
        model.faceuses[owner].loopuses.push(u);
    }
    (lu, shared)
}

/// Attach a plane equation to a face and re-sort the radial cycles of its
/// edges so they follow the new geometry.
///
/// The plane is taken to agree with the face's `Same` faceuse.
#[instrument(skip(model))]
pub fn set_face_plane(model: &mut Model, face: FaceId, plane: Plane) {
    expect_live(model, Entity::Face(face));
    model.faces[face].plane = Some(plane);

    let fu = model.face(face).faceuse;
    let mut edges: Vec<EdgeId> = Vec::new();
    for &lu in &model.faceuse(fu).loopuses {
        for &eu in model.loopuse_edgeuses(lu) {
            let e = model.edgeuse(eu).edge;
            if !edges.contains(&e) {
                edges.push(e);
            }
        }
    }
    for &e in &edges {
        resort(model, e);
    }
    debug!(?face, edges = edges.len(), "set_face_plane");
}

/// Allocate a face with its two faceuses (`Same` first) in `shell`.
fn alloc_faceuse_pair(
    model: &mut Model,
    shell: ShellId,
    bounds: Option<BBox3>,
) -> (FaceuseId, FaceuseId) {
    let blank = |orientation| Faceuse {
        shell,
        mate: FaceuseId::default(),
        face: FaceId::default(),
        orientation,
        loopuses: Vec::new(),
    };
    let fu = model.faceuses.insert(blank(Orientation::Same));
    let fumate = model.faceuses.insert(blank(Orientation::Opposite));
    let face = model.faces.insert(Face { faceuse: fu, plane: None, bounds });
    for (u, mate) in [(fu, fumate), (fumate, fu)] {
        let f = &mut model.faceuses[u];
        f.mate = mate;
        f.face = face;
    }
    model.shells[shell].faceuses.extend([fu, fumate]);
    (fu, fumate)
}

/// Allocate a mated loopuse pair on `lp` with empty edge lists.
fn alloc_loopuse_pair(
    model: &mut Model,
    lp: LoopId,
    parent: LoopuseParent,
    mate_parent: LoopuseParent,
) -> LoopuseId {
    let orientation = match parent {
        LoopuseParent::Faceuse(_) => Orientation::Same,
        LoopuseParent::Shell(_) => Orientation::Unspecified,
    };
    let blank = |parent| Loopuse {
        parent,
        mate: LoopuseId::default(),
        lp,
        orientation,
        children: LoopuseChildren::Edges(Vec::new()),
    };
    let lu = model.loopuses.insert(blank(parent));
    let mate = model.loopuses.insert(blank(mate_parent));
    model.loopuses[lu].mate = mate;
    model.loopuses[mate].mate = lu;
    model.loops[lp].loopuse = lu;
    lu
}

/// A point shell stops being one when it gains content. Its lone
/// vertexuse is absorbed if the new content uses the same vertex;
/// otherwise the shell cannot take the content.
fn consume_lone_vertexuse(
    model: &mut Model,
    shell: ShellId,
    vertices: &[VertexId],
) -> TopoResult<()> {
    let Some(vu) = model.shell(shell).vertexuse else {
        return Ok(());
    };
    if !vertices.contains(&model.vertexuse(vu).vertex) {
        return Err(TopoError::ShellNotEmpty(shell));
    }
    model.shells[shell].vertexuse = None;
    detach_vertexuse(model, vu);
    Ok(())
}
