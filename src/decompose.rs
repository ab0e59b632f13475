//! Shell decomposition: split a shell into one shell per connected group
//! of exterior loops.
//!
//! Two exterior loops belong to the same group when they touch or overlap:
//! they share a vertex, their edges come within tolerance of each other, or
//! an edge of one meets the other's face inside its boundary. Groups are
//! the connected components of that relation, found with a union-find.
//!
//! The first group stays in the input shell; every further group moves to
//! a new shell of the same region. Whole faces move, so holes travel with
//! their face.

use std::collections::HashMap;

use tracing::{debug, info, instrument};

use crate::error::{TopoError, TopoResult};
use crate::euler::{kill_edgeuse, kill_loopuse, kill_vertexuse, make_shell, move_faceuse};
use crate::math::{point_in_polygon, segment_distance_sq, BBox3, Plane, Point3, Tolerance};
use crate::topo::*;

/// What happens to a shell's wire loops, wire edges and lone vertexuse.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Remainder {
    /// Leave them in the input shell.
    #[default]
    Keep,
    /// Kill them, freeing any geometry they were the last use of.
    Kill,
}

/// Options for [`decompose_shell`].
#[derive(Clone, Copy, Debug, Default)]
pub struct DecomposeOptions {
    pub tol: Tolerance,
    pub remainder: Remainder,
}

/// An exterior loop with the geometry the touch test needs.
struct LoopInfo {
    fu: FaceuseId,
    vertices: Vec<VertexId>,
    points: Vec<Point3>,
    bounds: BBox3,
    plane: Option<Plane>,
}

/// Split `shell` into maximal groups of touching exterior loops.
///
/// Returns the output shells, the input shell first. A shell with at most
/// one exterior loop is returned as the only output without any grouping.
/// Fails with [`TopoError::EdgeStraddlesShells`] before changing anything
/// if some edge has uses in two different groups.
#[instrument(skip(model, opts))]
pub fn decompose_shell(
    model: &mut Model,
    shell: ShellId,
    opts: &DecomposeOptions,
) -> TopoResult<Vec<ShellId>> {
    assert_valid(model, Entity::Shell(shell));

    let loops = exterior_loops(model, shell, &opts.tol);
    if loops.len() <= 1 {
        apply_remainder(model, shell, opts.remainder)?;
        debug!(loops = loops.len(), "decompose_shell: nothing to split");
        return Ok(vec![shell]);
    }

    let mut uf = UnionFind::new(loops.len());
    for i in 0..loops.len() {
        for j in (i + 1)..loops.len() {
            if uf.find(i) == uf.find(j) {
                continue;
            }
            if loops[i].fu == loops[j].fu || touches(&loops[i], &loops[j], &opts.tol) {
                uf.union(i, j);
            }
        }
    }

    // Number groups by first appearance so the input shell keeps the group
    // of its first face.
    let mut root_to_group: HashMap<usize, usize> = HashMap::new();
    let mut face_group: HashMap<FaceuseId, usize> = HashMap::new();
    for (i, info) in loops.iter().enumerate() {
        let root = uf.find(i);
        let next = root_to_group.len();
        let group = *root_to_group.entry(root).or_insert(next);
        face_group.insert(info.fu, group);
    }
    let group_count = root_to_group.len();

    check_straddles(model, shell, &face_group, opts.remainder)?;
    apply_remainder(model, shell, opts.remainder)?;

    let region = model.shell(shell).region;
    let mut shells = vec![shell];
    for _ in 1..group_count {
        shells.push(make_shell(model, region));
    }
    // Faces without an exterior loop ride along with the first group.
    for fu in model.shell_faces(shell) {
        let group = face_group.get(&fu).copied().unwrap_or(0);
        if group != 0 {
            move_faceuse(model, fu, shells[group])?;
        }
    }

    info!(
        ?shell,
        loops = loops.len(),
        shells = shells.len(),
        "decomposed shell"
    );
    Ok(shells)
}

/// Exterior loops of every face in the shell, in faceuse order.
fn exterior_loops(model: &Model, shell: ShellId, tol: &Tolerance) -> Vec<LoopInfo> {
    let mut loops = Vec::new();
    for fu in model.shell_faces(shell) {
        let face_plane = model.face(model.faceuse(fu).face).plane;
        for &lu in &model.faceuse(fu).loopuses {
            let l = model.loopuse(lu);
            if l.orientation != Orientation::Same || model.loopuse_edgeuses(lu).is_empty() {
                continue;
            }
            let vertices = model.loopuse_vertices(lu);
            let points = model.loopuse_points(lu);
            let Some(bounds) = BBox3::from_points(&points) else {
                continue;
            };
            let plane = face_plane.or_else(|| Plane::fit_polygon(&points, tol).ok());
            loops.push(LoopInfo { fu, vertices, points, bounds, plane });
        }
    }
    loops
}

fn touches(a: &LoopInfo, b: &LoopInfo, tol: &Tolerance) -> bool {
    if a.vertices.iter().any(|v| b.vertices.contains(v)) {
        return true;
    }
    if !a.bounds.overlaps(&b.bounds, tol.dist) {
        return false;
    }
    if edges_within(a, b, tol) {
        return true;
    }
    pierces(a, b, tol) || pierces(b, a, tol)
}

/// True if any edge of `a` comes within tolerance of any edge of `b`.
fn edges_within(a: &LoopInfo, b: &LoopInfo, tol: &Tolerance) -> bool {
    let na = a.points.len();
    let nb = b.points.len();
    (0..na).any(|i| {
        let (p0, p1) = (&a.points[i], &a.points[(i + 1) % na]);
        (0..nb).any(|j| {
            let (q0, q1) = (&b.points[j], &b.points[(j + 1) % nb]);
            segment_distance_sq(p0, p1, q0, q1) <= tol.dist_sq()
        })
    })
}

/// True if an edge of `a` meets the face of `b` inside `b`'s boundary,
/// either by crossing its plane or by lying in it.
fn pierces(a: &LoopInfo, b: &LoopInfo, tol: &Tolerance) -> bool {
    let Some(plane) = b.plane else {
        return false;
    };
    let inside = |p: &Point3| point_in_polygon(p, &b.points, &plane.normal);
    let n = a.points.len();
    (0..n).any(|i| {
        let (p0, p1) = (&a.points[i], &a.points[(i + 1) % n]);
        let (d0, d1) = (plane.distance(p0), plane.distance(p1));
        if d0.abs() <= tol.dist {
            return inside(p0);
        }
        if d0.abs() > tol.dist && d1.abs() > tol.dist && d0.signum() != d1.signum() {
            let x = p0 + (p1 - p0) * (d0 / (d0 - d1));
            return inside(&x);
        }
        false
    })
}

/// Every edge used by a face of the shell must have all of its in-shell
/// uses in that face's group. Wire uses count as the first group when
/// they stay behind and are ignored when they are about to be killed.
fn check_straddles(
    model: &Model,
    shell: ShellId,
    face_group: &HashMap<FaceuseId, usize>,
    remainder: Remainder,
) -> TopoResult<()> {
    let group_of = |eu: EdgeuseId| -> Option<usize> {
        if model.edgeuse_shell(eu) != shell {
            return None;
        }
        match model.edgeuse_faceuse(eu) {
            Some(fu) => {
                let face = model.faceuse(fu).face;
                let same = model.face(face).faceuse;
                let same = if model.faceuse(same).orientation == Orientation::Same {
                    same
                } else {
                    model.faceuse(same).mate
                };
                Some(face_group.get(&same).copied().unwrap_or(0))
            }
            None => (remainder == Remainder::Keep).then_some(0),
        }
    };

    for fu in model.shell_faces(shell) {
        let group = face_group.get(&fu).copied().unwrap_or(0);
        for &lu in &model.faceuse(fu).loopuses {
            for &eu in model.loopuse_edgeuses(lu) {
                let split = model
                    .radial_cycle(eu)
                    .into_iter()
                    .filter_map(&group_of)
                    .any(|g| g != group);
                if split {
                    return Err(TopoError::EdgeStraddlesShells(model.edgeuse(eu).edge));
                }
            }
        }
    }
    Ok(())
}

fn apply_remainder(model: &mut Model, shell: ShellId, remainder: Remainder) -> TopoResult<()> {
    if remainder == Remainder::Keep {
        return Ok(());
    }
    let (mut loops, mut edges) = (0, 0);
    while let Some(&lu) = model.shell(shell).loopuses.first() {
        kill_loopuse(model, lu)?;
        loops += 1;
    }
    while let Some(&eu) = model.shell(shell).edgeuses.first() {
        kill_edgeuse(model, eu)?;
        edges += 1;
    }
    let lone = model.shell(shell).vertexuse;
    if let Some(vu) = lone {
        kill_vertexuse(model, vu)?;
    }
    debug!(loops, edges, lone_vertex = lone.is_some(), "killed wire remainder");
    Ok(())
}

/// Disjoint sets over loop indices.
struct UnionFind {
    parent: Vec<usize>,
    size: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        Self {
            parent: (0..n).collect(),
            size: vec![1; n],
        }
    }

    fn find(&mut self, mut x: usize) -> usize {
        // Path halving.
        while self.parent[x] != x {
            self.parent[x] = self.parent[self.parent[x]];
            x = self.parent[x];
        }
        x
    }

    fn union(&mut self, x: usize, y: usize) {
        let (mut a, mut b) = (self.find(x), self.find(y));
        if a == b {
            return;
        }
        if self.size[a] < self.size[b] {
            std::mem::swap(&mut a, &mut b);
        }
        self.parent[b] = a;
        self.size[a] += self.size[b];
    }
}
