//! Non-manifold boundary-representation topology kernel.
//!
//! A [`Model`] holds regions of shells built from faces, loops, edges and
//! vertices, each appearing through oriented *uses*. Uses come in mated
//! pairs, and every use of an edge sits in that edge's radial cycle, so
//! any number of faces and wire edges may meet at one edge or vertex.
//!
//! - [`topo`]: the arena store, entity types and the structural checker
//! - [`euler`]: the operators that change topology, one valid state to the next
//! - [`visit`]: the top-down traversal engine and its [`Visitor`] trait
//! - [`decompose`]: splitting a shell into connected pieces
//! - [`import`] / [`export`]: polygon text in and out
//!
//! Structural corruption panics. Bad arguments and bad input come back as
//! [`TopoError`] or [`ImportError`] before anything is changed.

#![cfg_attr(not(test), deny(clippy::unwrap_used, clippy::expect_used))]

pub mod decompose;
pub mod error;
pub mod euler;
pub mod export;
pub mod import;
pub mod math;
pub mod topo;
pub mod visit;

pub use decompose::{decompose_shell, DecomposeOptions, Remainder};
pub use error::{ImportError, ImportResult, TopoError, TopoResult};
pub use export::write_polygons;
pub use import::{import_polygons, parse_polygons, ImportOptions, ImportReport, PolygonSet};
pub use math::{Plane, Point3, Tolerance, Vector3};
pub use topo::{Entity, EntityKind, Model, Orientation};
pub use visit::{visit, EntityCounts, Visitor};
