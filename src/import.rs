//! Polygon file import.
//!
//! The format is whitespace-delimited text:
//!
//! ```text
//! <point_count> <facet_count>
//! x y z                     (point_count times)
//! n i1 i2 ... in            (facet_count times, 1-based point indices)
//! ```
//!
//! Parsing and checking happen in full before the model is touched, so an
//! `Err` never leaves a half-built shell behind.

use std::io::Read;

use tracing::{info, instrument};

use crate::error::{ImportError, ImportResult};
use crate::euler::{
    kill_vertices_if_unused, make_face_from_vertices, make_shell, make_vertex, set_face_plane,
};
use crate::math::{Plane, Point3, Tolerance};
use crate::topo::*;

/// Options for [`import_polygons`].
#[derive(Clone, Copy, Debug)]
pub struct ImportOptions {
    pub tol: Tolerance,
    /// Free points that no facet references. Without this the model keeps
    /// free vertices and will not validate until they are pruned.
    pub prune_unused: bool,
}

impl Default for ImportOptions {
    fn default() -> Self {
        Self { tol: Tolerance::default(), prune_unused: true }
    }
}

/// A parsed polygon file. Facet indices are 1-based, as written.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PolygonSet {
    pub points: Vec<Point3>,
    pub facets: Vec<Vec<usize>>,
}

/// What an import built.
#[derive(Clone, Debug)]
pub struct ImportReport {
    pub shell: ShellId,
    /// The `Same` faceuse of each facet, in file order.
    pub faces: Vec<FaceuseId>,
    /// Number of points dropped because no facet used them.
    pub pruned: usize,
}

/// Parse polygon text. Only the token structure is checked here; facet
/// contents are checked by [`PolygonSet::facet_planes`].
pub fn parse_polygons(input: &str) -> ImportResult<PolygonSet> {
    let mut tokens = Tokens { iter: input.split_whitespace() };
    let point_count = tokens.count("point count")?;
    let facet_count = tokens.count("facet count")?;

    // Counts come from untrusted input; grow as tokens actually arrive.
    let mut points = Vec::with_capacity(point_count.min(1 << 16));
    for i in 1..=point_count {
        let what = |axis| format!("{axis} of point {i}");
        let x = tokens.float(what('x'))?;
        let y = tokens.float(what('y'))?;
        let z = tokens.float(what('z'))?;
        points.push(Point3::new(x, y, z));
    }

    let mut facets = Vec::with_capacity(facet_count.min(1 << 16));
    for f in 1..=facet_count {
        let n = tokens.count(&format!("point count of facet {f}"))?;
        let mut indices = Vec::with_capacity(n.min(1 << 10));
        for k in 1..=n {
            indices.push(tokens.count(&format!("index {k} of facet {f}"))?);
        }
        facets.push(indices);
    }
    Ok(PolygonSet { points, facets })
}

/// Read and parse polygon text from any reader.
pub fn read_polygons<R: Read>(mut reader: R) -> ImportResult<PolygonSet> {
    let mut text = String::new();
    reader.read_to_string(&mut text)?;
    parse_polygons(&text)
}

impl PolygonSet {
    /// Check every facet and compute its plane from its first three
    /// points. Every further point must lie on that plane within
    /// `tol.dist`. Facets are numbered from 1 in errors.
    pub fn facet_planes(&self, tol: &Tolerance) -> ImportResult<Vec<Plane>> {
        if self.facets.is_empty() {
            return Err(ImportError::NoFacets);
        }
        let point_count = self.points.len();
        let mut planes = Vec::with_capacity(self.facets.len());
        for (f, indices) in self.facets.iter().enumerate() {
            let facet = f + 1;
            let n = indices.len();
            if n < 3 {
                return Err(ImportError::TooFewPoints { facet, count: n });
            }
            for (k, &index) in indices.iter().enumerate() {
                if index == 0 || index > point_count {
                    return Err(ImportError::IndexOutOfRange { facet, index, point_count });
                }
                if index == indices[(k + 1) % n] {
                    return Err(ImportError::RepeatedPoint { facet, index });
                }
            }
            let p = |k: usize| &self.points[indices[k] - 1];
            let plane = Plane::from_three(p(0), p(1), p(2), tol)
                .map_err(|source| ImportError::DegeneratePlane { facet, source })?;
            let off_plane = (3..n).filter(|&k| plane.distance(p(k)).abs() > tol.dist).count();
            if off_plane > 0 {
                return Err(ImportError::NonPlanar { facet, off_plane });
            }
            planes.push(plane);
        }
        Ok(planes)
    }
}

/// Parse `input` and build it as a new shell of `region`.
pub fn import_polygons(
    model: &mut Model,
    region: RegionId,
    input: &str,
    opts: &ImportOptions,
) -> ImportResult<ImportReport> {
    let set = parse_polygons(input)?;
    import_polygon_set(model, region, &set, opts)
}

/// Build a parsed polygon set as a new shell of `region`: one face per
/// facet, edges shared wherever facets share a pair of consecutive points.
#[instrument(skip(model, set, opts), fields(points = set.points.len(), facets = set.facets.len()))]
pub fn import_polygon_set(
    model: &mut Model,
    region: RegionId,
    set: &PolygonSet,
    opts: &ImportOptions,
) -> ImportResult<ImportReport> {
    let planes = set.facet_planes(&opts.tol)?;

    let shell = make_shell(model, region);
    let vertices: Vec<VertexId> = set.points.iter().map(|&p| make_vertex(model, p)).collect();

    let mut buf: Vec<VertexId> = Vec::new();
    let mut faces = Vec::with_capacity(set.facets.len());
    for (indices, plane) in set.facets.iter().zip(planes) {
        buf.clear();
        if buf.capacity() < indices.len() {
            buf.reserve_exact(indices.len().max(buf.capacity() * 2));
        }
        buf.extend(indices.iter().map(|&i| vertices[i - 1]));

        let fu = make_face_from_vertices(model, shell, &buf)?;
        let face = model.faceuse(fu).face;
        set_face_plane(model, face, plane);
        faces.push(fu);
    }

    let pruned = if opts.prune_unused {
        kill_vertices_if_unused(model, &vertices)
    } else {
        0
    };

    info!(?shell, faces = faces.len(), pruned, "imported polygons");
    Ok(ImportReport { shell, faces, pruned })
}

struct Tokens<'a> {
    iter: std::str::SplitWhitespace<'a>,
}

impl<'a> Tokens<'a> {
    fn next(&mut self, what: &str) -> ImportResult<&'a str> {
        self.iter.next().ok_or_else(|| ImportError::MissingToken { what: what.to_string() })
    }

    fn count(&mut self, what: &str) -> ImportResult<usize> {
        let token = self.next(what)?;
        token.parse().map_err(|_| ImportError::BadNumber {
            what: what.to_string(),
            token: token.to_string(),
        })
    }

    fn float(&mut self, what: String) -> ImportResult<f64> {
        let token = self.next(&what)?;
        token.parse().map_err(|_| ImportError::BadNumber { what, token: token.to_string() })
    }
}
