//! Radial cycles: threading edgeuse pairs onto edges.
//!
//! A radial cycle lists every use of one edge. Mates are always adjacent,
//! and within each pair the use running against the edge's reference
//! direction comes first. Pairs are ordered by the angle of their face
//! around the edge, measured counter-clockwise about the reference
//! direction from the first face met on the cycle that has a plane, so
//! consecutive uses of different faces bound the same wedge of space.

use std::f64::consts::TAU;

use tracing::{debug, instrument};

use super::{debug_check, expect_live};
use crate::error::{TopoError, TopoResult};
use crate::math::Vector3;
use crate::topo::*;

/// `(against, along)`: the two mated uses of one pair, ordered by direction.
type Pair = (EdgeuseId, EdgeuseId);

/// Give a fresh edgeuse pair its own new edge.
pub(super) fn thread_new_edge(model: &mut Model, eu: EdgeuseId) -> EdgeId {
    let mate = model.edgeuses[eu].mate;
    let start = model.edgeuse_start(eu);
    let end = model.edgeuse_end(eu);
    let edge = model.edges.insert(Edge { edgeuse: eu, start, end });
    for u in [eu, mate] {
        let e = &mut model.edgeuses[u];
        e.edge = edge;
        e.radial = if u == eu { mate } else { eu };
    }
    edge
}

/// Add a fresh edgeuse pair to the radial cycle of an existing edge.
pub(super) fn thread_onto(model: &mut Model, eu: EdgeuseId, existing: EdgeuseId) {
    let edge = model.edgeuses[existing].edge;
    let mut pairs = radial_pairs(model, edge);
    let mate = model.edgeuses[eu].mate;
    model.edgeuses[eu].edge = edge;
    model.edgeuses[mate].edge = edge;
    pairs.push(pair_of(model, eu));
    let ordered = order_by_angle(model, edge, pairs);
    relink(model, edge, &ordered);
}

/// Re-sort a radial cycle after face geometry changed.
pub(super) fn resort(model: &mut Model, edge: EdgeId) {
    let pairs = radial_pairs(model, edge);
    let ordered = order_by_angle(model, edge, pairs);
    relink(model, edge, &ordered);
}

/// Unlink an edgeuse pair from its radial cycle. Returns `false` when the
/// pair was the edge's only use, in which case the caller frees the edge.
pub(super) fn unthread(model: &mut Model, eu: EdgeuseId) -> bool {
    let mate = model.edgeuses[eu].mate;
    let edge = model.edgeuses[eu].edge;
    let (first, second) = if model.edgeuses[eu].radial == mate { (eu, mate) } else { (mate, eu) };
    let after = model.edgeuses[second].radial;
    if after == first {
        return false;
    }

    let mut pred = after;
    while model.edgeuses[pred].radial != first {
        pred = model.edgeuses[pred].radial;
    }
    model.edgeuses[pred].radial = after;

    let entry = &mut model.edges[edge].edgeuse;
    if *entry == first || *entry == second {
        *entry = after;
    }
    true
}

/// Merge the edge under `other` into the edge under `keep`.
///
/// Both edgeuses must span the same two vertices. Every use of the
/// absorbed edge joins `keep`'s radial cycle at its angular position and
/// the absorbed edge is freed. Joining two uses of one edge is a no-op.
#[instrument(skip(model))]
pub fn join_edges(model: &mut Model, keep: EdgeuseId, other: EdgeuseId) -> TopoResult<EdgeId> {
    expect_live(model, Entity::Edgeuse(keep));
    expect_live(model, Entity::Edgeuse(other));

    let kept = model.edgeuse(keep).edge;
    let absorbed = model.edgeuse(other).edge;
    if kept == absorbed {
        return Ok(kept);
    }
    let (a0, a1) = (model.edgeuse_start(keep), model.edgeuse_end(keep));
    let (b0, b1) = (model.edgeuse_start(other), model.edgeuse_end(other));
    if !((a0 == b0 && a1 == b1) || (a0 == b1 && a1 == b0)) {
        return Err(TopoError::EdgeMismatch(keep, other));
    }

    let mut pairs = radial_pairs(model, kept);
    let incoming = model.radial_cycle(other);
    for &u in &incoming {
        model.edgeuses[u].edge = kept;
    }
    let mut seen = Vec::new();
    for u in incoming {
        if !seen.contains(&u) {
            let pair = pair_of(model, u);
            seen.extend([pair.0, pair.1]);
            pairs.push(pair);
        }
    }
    let ordered = order_by_angle(model, kept, pairs);
    relink(model, kept, &ordered);
    model.edges.remove(absorbed);

    debug!(?kept, ?absorbed, uses = ordered.len() * 2, "join_edges merged radial cycles");
    debug_check(model, Entity::Edge(kept));
    Ok(kept)
}

fn pair_of(model: &Model, eu: EdgeuseId) -> Pair {
    let mate = model.edgeuses[eu].mate;
    if model.edgeuse_orientation(eu) == Orientation::Same {
        (mate, eu)
    } else {
        (eu, mate)
    }
}

/// Pairs of an edge's radial cycle, starting with the entry use's pair.
fn radial_pairs(model: &Model, edge: EdgeId) -> Vec<Pair> {
    let mut pairs: Vec<Pair> = Vec::new();
    for eu in model.radial_cycle(model.edges[edge].edgeuse) {
        if !pairs.iter().any(|&(a, b)| a == eu || b == eu) {
            pairs.push(pair_of(model, eu));
        }
    }
    pairs
}

fn relink(model: &mut Model, edge: EdgeId, pairs: &[Pair]) {
    for (i, &(against, along)) in pairs.iter().enumerate() {
        let next = pairs[(i + 1) % pairs.len()].0;
        model.edgeuses[against].radial = along;
        model.edgeuses[along].radial = next;
    }
    let entry = model.edges[edge].edgeuse;
    if !pairs.iter().any(|&(a, b)| a == entry || b == entry) {
        model.edges[edge].edgeuse = pairs[0].0;
    }
}

/// Stably sort pairs by face angle, measured from the first pair whose
/// face has a plane. That pair moves to the front. Pairs without a planar
/// face (wire edges, faces with no plane yet) sort as angle zero, directly
/// after it. With no planar face at all the order is left alone.
fn order_by_angle(model: &Model, edge: EdgeId, mut pairs: Vec<Pair>) -> Vec<Pair> {
    if pairs.len() < 3 {
        return pairs;
    }
    let e = &model.edges[edge];
    let axis = model.point(e.end) - model.point(e.start);
    let Some(axis) = axis.try_normalize(f64::EPSILON) else {
        return pairs;
    };
    let Some((first, reference)) = pairs
        .iter()
        .enumerate()
        .find_map(|(i, &p)| inward(model, p).map(|w| (i, w)))
    else {
        return pairs;
    };
    pairs.rotate_left(first);

    let mut rest: Vec<(f64, Pair)> = pairs
        .drain(1..)
        .map(|p| {
            let angle = inward(model, p).map_or(0.0, |w| {
                let a = axis.dot(&reference.cross(&w)).atan2(reference.dot(&w));
                if a < 0.0 {
                    a + TAU
                } else {
                    a
                }
            });
            (angle, p)
        })
        .collect();
    rest.sort_by(|a, b| a.0.total_cmp(&b.0));
    pairs.extend(rest.into_iter().map(|(_, p)| p));
    pairs
}

/// Direction from the edge into the face of a pair, in the plane
/// perpendicular to the edge.
fn inward(model: &Model, (against, along): Pair) -> Option<Vector3> {
    let (eu, fu) = [against, along].into_iter().find_map(|u| {
        let fu = model.edgeuse_faceuse(u)?;
        (model.faceuse(fu).orientation == Orientation::Same).then_some((u, fu))
    })?;
    let plane = model.face(model.faceuse(fu).face).plane?;
    let t = model.point(model.edgeuse_end(eu)) - model.point(model.edgeuse_start(eu));
    plane.normal.cross(&t).try_normalize(f64::EPSILON)
}
