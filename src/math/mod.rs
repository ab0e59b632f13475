//! Linear algebra type aliases, tolerances, and the small amount of geometry
//! the topology kernel needs: bounding boxes and plane equations.

use thiserror::Error;

pub type Point3 = nalgebra::Point3<f64>;
pub type Vector3 = nalgebra::Vector3<f64>;

/// Geometric tolerances used by plane fits and proximity tests.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Tolerance {
    /// Distance below which two points are considered coincident (model units).
    pub dist: f64,
    /// Cosine-style tolerance for perpendicularity / collinearity tests.
    pub perp: f64,
}

impl Tolerance {
    pub fn new(dist: f64, perp: f64) -> Self {
        Self { dist, perp }
    }

    pub fn dist_sq(&self) -> f64 {
        self.dist * self.dist
    }
}

impl Default for Tolerance {
    fn default() -> Self {
        Self { dist: 0.0005, perp: 1e-6 }
    }
}

/// Axis-aligned bounding box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BBox3 {
    pub min: Point3,
    pub max: Point3,
}

impl BBox3 {
    pub fn new(min: Point3, max: Point3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing every point, or `None` for an empty set.
    pub fn from_points<'a, I>(points: I) -> Option<Self>
    where
        I: IntoIterator<Item = &'a Point3>,
    {
        let mut iter = points.into_iter();
        let first = *iter.next()?;
        let mut bb = BBox3::new(first, first);
        for p in iter {
            bb.extend(p);
        }
        Some(bb)
    }

    pub fn extend(&mut self, p: &Point3) {
        self.min = self.min.inf(p);
        self.max = self.max.sup(p);
    }

    pub fn union(&self, other: &BBox3) -> BBox3 {
        BBox3::new(self.min.inf(&other.min), self.max.sup(&other.max))
    }

    /// True if the boxes, each grown by `slack`, share at least one point.
    pub fn overlaps(&self, other: &BBox3, slack: f64) -> bool {
        (0..3).all(|i| {
            self.min[i] - slack <= other.max[i] && other.min[i] - slack <= self.max[i]
        })
    }
}

/// Errors from plane construction.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PlaneError {
    /// Fewer than three points were supplied.
    #[error("need at least 3 points for a plane, got {0}")]
    TooFewPoints(usize),
    /// Two of the points are within distance tolerance of each other.
    #[error("points are coincident within tolerance")]
    Coincident,
    /// The points are collinear within tolerance.
    #[error("points are collinear within tolerance")]
    Collinear,
}

/// Plane equation `normal · p = dist` with unit `normal`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Plane {
    pub normal: Vector3,
    pub dist: f64,
}

impl Plane {
    /// Plane through `a`, `b`, `c`, oriented so that `a → b → c` winds
    /// counter-clockwise when viewed from the side the normal points to.
    pub fn from_three(
        a: &Point3,
        b: &Point3,
        c: &Point3,
        tol: &Tolerance,
    ) -> Result<Plane, PlaneError> {
        let ab = b - a;
        let ac = c - a;
        let bc = c - b;
        if ab.norm_squared() <= tol.dist_sq()
            || ac.norm_squared() <= tol.dist_sq()
            || bc.norm_squared() <= tol.dist_sq()
        {
            return Err(PlaneError::Coincident);
        }

        let n = ab.cross(&ac);
        let mag = n.norm();
        // |ab x ac| = |ab||ac| sin(theta); reject when sin(theta) is below perp.
        if mag <= tol.perp * ab.norm() * ac.norm() {
            return Err(PlaneError::Collinear);
        }
        let normal = n / mag;
        Ok(Plane { normal, dist: normal.dot(&a.coords) })
    }

    /// Best-fit plane through a closed polygon using Newell's method.
    ///
    /// Unlike [`Plane::from_three`] this is robust to a collinear prefix,
    /// and the normal follows the polygon's winding.
    pub fn fit_polygon(points: &[Point3], tol: &Tolerance) -> Result<Plane, PlaneError> {
        if points.len() < 3 {
            return Err(PlaneError::TooFewPoints(points.len()));
        }
        let mut n = Vector3::zeros();
        let mut centroid = Vector3::zeros();
        for (i, p) in points.iter().enumerate() {
            let q = &points[(i + 1) % points.len()];
            n.x += (p.y - q.y) * (p.z + q.z);
            n.y += (p.z - q.z) * (p.x + q.x);
            n.z += (p.x - q.x) * (p.y + q.y);
            centroid += p.coords;
        }
        centroid /= points.len() as f64;

        let mag = n.norm();
        if mag <= tol.dist_sq() {
            return Err(PlaneError::Collinear);
        }
        let normal = n / mag;
        Ok(Plane { normal, dist: normal.dot(&centroid) })
    }

    /// Signed distance from `p` to the plane (positive on the normal side).
    pub fn distance(&self, p: &Point3) -> f64 {
        self.normal.dot(&p.coords) - self.dist
    }
}

/// Squared distance between segments `p0-p1` and `q0-q1`.
pub fn segment_distance_sq(p0: &Point3, p1: &Point3, q0: &Point3, q1: &Point3) -> f64 {
    let d1 = p1 - p0;
    let d2 = q1 - q0;
    let r = p0 - q0;
    let a = d1.norm_squared();
    let e = d2.norm_squared();
    let f = d2.dot(&r);

    let (s, t) = if a <= f64::EPSILON && e <= f64::EPSILON {
        (0.0, 0.0)
    } else if a <= f64::EPSILON {
        (0.0, (f / e).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(&r);
        if e <= f64::EPSILON {
            ((-c / a).clamp(0.0, 1.0), 0.0)
        } else {
            let b = d1.dot(&d2);
            let denom = a * e - b * b;
            let mut s = if denom > f64::EPSILON {
                ((b * f - c * e) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (b * s + f) / e;
            if t < 0.0 {
                t = 0.0;
                s = (-c / a).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((b - c) / a).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    let c1 = p0 + d1 * s;
    let c2 = q0 + d2 * t;
    (c1 - c2).norm_squared()
}

/// Even-odd point-in-polygon test after projecting onto the plane's
/// dominant axis. `p` is assumed to lie on the polygon's plane.
pub fn point_in_polygon(p: &Point3, polygon: &[Point3], normal: &Vector3) -> bool {
    let ax = normal.iamax();
    let (i, j) = match ax {
        0 => (1, 2),
        1 => (2, 0),
        _ => (0, 1),
    };

    let mut inside = false;
    let n = polygon.len();
    for k in 0..n {
        let a = &polygon[k];
        let b = &polygon[(k + 1) % n];
        if (a[j] > p[j]) != (b[j] > p[j]) {
            let x = a[i] + (p[j] - a[j]) * (b[i] - a[i]) / (b[j] - a[j]);
            if p[i] < x {
                inside = !inside;
            }
        }
    }
    inside
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn plane_from_unit_square_corner() {
        let tol = Tolerance::default();
        let plane = Plane::from_three(
            &Point3::new(0.0, 0.0, 0.0),
            &Point3::new(1.0, 0.0, 0.0),
            &Point3::new(1.0, 1.0, 0.0),
            &tol,
        )
        .unwrap();
        assert_relative_eq!(plane.normal, Vector3::new(0.0, 0.0, 1.0));
        assert_relative_eq!(plane.dist, 0.0);
    }

    #[test]
    fn plane_rejects_collinear_and_coincident() {
        let tol = Tolerance::default();
        let a = Point3::new(0.0, 0.0, 0.0);
        let b = Point3::new(1.0, 1.0, 1.0);
        let c = Point3::new(2.0, 2.0, 2.0);
        assert_eq!(Plane::from_three(&a, &b, &c, &tol), Err(PlaneError::Collinear));
        assert_eq!(Plane::from_three(&a, &a, &c, &tol), Err(PlaneError::Coincident));
    }

    #[test]
    fn newell_matches_winding() {
        let tol = Tolerance::default();
        let pts = [
            Point3::new(0.0, 0.0, 2.0),
            Point3::new(0.0, 1.0, 2.0),
            Point3::new(1.0, 1.0, 2.0),
            Point3::new(1.0, 0.0, 2.0),
        ];
        let plane = Plane::fit_polygon(&pts, &tol).unwrap();
        assert_relative_eq!(plane.normal, Vector3::new(0.0, 0.0, -1.0));
        assert_relative_eq!(plane.dist, -2.0);
    }

    #[test]
    fn segment_distance_cases() {
        let o = Point3::origin();
        let x = Point3::new(1.0, 0.0, 0.0);
        // Crossing segments.
        let (q0, q1) = (Point3::new(0.5, -1.0, 0.0), Point3::new(0.5, 1.0, 0.0));
        let d = segment_distance_sq(&o, &x, &q0, &q1);
        assert_relative_eq!(d, 0.0);
        // Parallel, offset by 2.
        let (q0, q1) = (Point3::new(0.0, 2.0, 0.0), Point3::new(1.0, 2.0, 0.0));
        let d = segment_distance_sq(&o, &x, &q0, &q1);
        assert_relative_eq!(d, 4.0);
    }

    #[test]
    fn polygon_containment() {
        let square = [
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 0.0),
            Point3::new(0.0, 2.0, 0.0),
        ];
        let n = Vector3::z();
        assert!(point_in_polygon(&Point3::new(1.0, 1.0, 0.0), &square, &n));
        assert!(!point_in_polygon(&Point3::new(3.0, 1.0, 0.0), &square, &n));
    }

    #[test]
    fn bbox_overlap_with_slack() {
        let a = BBox3::new(Point3::new(0.0, 0.0, 0.0), Point3::new(1.0, 1.0, 1.0));
        let b = BBox3::new(Point3::new(1.1, 0.0, 0.0), Point3::new(2.0, 1.0, 1.0));
        assert!(!a.overlaps(&b, 0.0));
        assert!(a.overlaps(&b, 0.2));
        let u = a.union(&b);
        assert_relative_eq!(u.max.x, 2.0);
    }
}
