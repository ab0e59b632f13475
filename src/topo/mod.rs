//! Arena-based non-manifold topology.
//!
//! The hierarchy runs model → region → shell → faceuse → loopuse →
//! edgeuse / vertexuse. Each use references shared geometry (face, loop,
//! edge, vertex), and faceuses, loopuses and edgeuses come in mated pairs.
//! Entities live in a central `Model` and are referenced via typed handles.

pub mod store;
pub mod types;
pub mod validate;

pub use store::Model;
pub use types::*;
pub use validate::{assert_valid, validate, validate_model, ValidationResult, Violation};
