//! Writers for topology built on the [`crate::visit`] engine.
//!
//! - **Polygon** text, the same format [`crate::import`] reads

pub mod poly;

pub use poly::write_polygons;
