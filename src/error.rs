//! Error types for recoverable failures.
//!
//! Structural corruption is not represented here: it panics (see
//! [`crate::topo::validate::assert_valid`]). These errors report bad
//! arguments and bad input, and are always raised before the model is
//! mutated.

use thiserror::Error;

use crate::math::PlaneError;
use crate::topo::{EdgeId, EdgeuseId, EntityKind, LoopuseId, ShellId, VertexId};

/// Result type for Euler operators and the decomposer.
pub type TopoResult<T> = Result<T, TopoError>;

/// Result type for polygon import.
pub type ImportResult<T> = Result<T, ImportError>;

/// Argument errors reported by Euler operators.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TopoError {
    /// An entity was expected to be parented by a particular kind of entity.
    #[error("{kind} {id} is not owned by a {expected}")]
    WrongParent {
        kind: EntityKind,
        id: String,
        expected: EntityKind,
    },

    /// An edge would start and end at the same vertex.
    #[error("edge endpoints coincide at vertex {0:?}")]
    DegenerateEdge(VertexId),

    /// A loop needs at least one edgeuse / a face at least three vertices.
    #[error("need at least {required} elements, got {actual}")]
    TooFew { required: usize, actual: usize },

    /// Consecutive edgeuses do not share a vertex.
    #[error("edgeuse chain is open between {from:?} and {to:?}")]
    OpenChain { from: EdgeuseId, to: EdgeuseId },

    /// The same edgeuse pair was listed twice.
    #[error("edgeuse {0:?} listed more than once")]
    DuplicateEdgeuse(EdgeuseId),

    /// A lone vertexuse may only be placed in an otherwise empty shell.
    #[error("shell {0:?} is not empty")]
    ShellNotEmpty(ShellId),

    /// Two edgeuses to be joined do not connect the same pair of vertices.
    #[error("edgeuses {0:?} and {1:?} do not span the same vertices")]
    EdgeMismatch(EdgeuseId, EdgeuseId),

    /// The requested kill would leave the owning loop or face inconsistent.
    #[error("cannot kill {kind} {id}: {reason}")]
    AmbiguousKill {
        kind: EntityKind,
        id: String,
        reason: &'static str,
    },

    /// A loopuse is not a wire loop with edges.
    #[error("loopuse {0:?} is not a wire loop of edges")]
    NotWireLoop(LoopuseId),

    /// Decomposition would place uses of one edge into two output shells.
    #[error("edge {0:?} would straddle two output shells")]
    EdgeStraddlesShells(EdgeId),
}

/// Errors from reading a polygon description.
#[derive(Debug, Error)]
pub enum ImportError {
    #[error("failed to read polygon input: {0}")]
    Io(#[from] std::io::Error),

    /// The input ended before an expected token.
    #[error("unexpected end of input while reading {what}")]
    MissingToken { what: String },

    /// A token could not be parsed as the expected number type.
    #[error("cannot parse {what} from {token:?}")]
    BadNumber { what: String, token: String },

    /// The header declared no facets.
    #[error("polygon input declares no facets")]
    NoFacets,

    /// A facet has fewer than three points.
    #[error("facet {facet} has {count} points (need at least 3)")]
    TooFewPoints { facet: usize, count: usize },

    /// A point index is zero or exceeds the point count (indices are 1-based).
    #[error("facet {facet} references point {index} (valid range 1..={point_count})")]
    IndexOutOfRange {
        facet: usize,
        index: usize,
        point_count: usize,
    },

    /// A facet repeats a point on consecutive corners.
    #[error("facet {facet} repeats point {index} on consecutive corners")]
    RepeatedPoint { facet: usize, index: usize },

    /// The first three points of a facet do not determine a plane.
    #[error("facet {facet} is degenerate: {source}")]
    DegeneratePlane {
        facet: usize,
        #[source]
        source: PlaneError,
    },

    /// Points of a facet lie off the plane of its first three points.
    #[error("facet {facet} is not planar: {off_plane} point(s) off its plane")]
    NonPlanar { facet: usize, off_plane: usize },

    /// An Euler operator refused a facet that passed the input checks.
    #[error("failed to build facet: {0}")]
    Topology(#[from] TopoError),
}
