//! Polygon text export.
//!
//! Writes one facet per face (the exterior loop of its `Same` faceuse) and
//! the distinct vertices of those loops, numbered in the order the walk
//! first reaches them. Holes and wire content have no place in the format
//! and are skipped.

use std::collections::HashMap;
use std::io::{self, Write};

use crate::math::Point3;
use crate::topo::*;
use crate::visit::{visit, Visitor};

/// Write the faces of `shell` as polygon text to the given writer.
pub fn write_polygons<W: Write>(model: &Model, shell: ShellId, writer: &mut W) -> io::Result<()> {
    let mut facets = FacetCollector::default();
    visit(model, Entity::Shell(shell), &mut facets);

    writeln!(writer, "{} {}", facets.points.len(), facets.facets.len())?;
    for p in &facets.points {
        writeln!(writer, "{} {} {}", p.x, p.y, p.z)?;
    }
    // Indices are 1-based.
    for facet in &facets.facets {
        write!(writer, "{}", facet.len())?;
        for i in facet {
            write!(writer, " {}", i + 1)?;
        }
        writeln!(writer)?;
    }
    Ok(())
}

#[derive(Default)]
struct FacetCollector {
    in_same_faceuse: bool,
    current: Option<Vec<usize>>,
    index: HashMap<VertexId, usize>,
    points: Vec<Point3>,
    facets: Vec<Vec<usize>>,
}

impl Visitor for FacetCollector {
    fn before_faceuse(&mut self, model: &Model, fu: FaceuseId) {
        self.in_same_faceuse = model.faceuse(fu).orientation == Orientation::Same;
    }

    fn after_faceuse(&mut self, _: &Model, _: FaceuseId) {
        self.in_same_faceuse = false;
    }

    fn before_loopuse(&mut self, model: &Model, lu: LoopuseId) {
        let exterior = model.loopuse(lu).orientation == Orientation::Same;
        if self.in_same_faceuse && exterior && !model.loopuse_edgeuses(lu).is_empty() {
            self.current = Some(Vec::new());
        }
    }

    fn after_loopuse(&mut self, _: &Model, _: LoopuseId) {
        if let Some(facet) = self.current.take() {
            self.facets.push(facet);
        }
    }

    // Each edgeuse contributes its start vertex, so a loop's vertices
    // arrive once each and in loop order.
    fn visit_vertex(&mut self, model: &Model, vertex: VertexId) {
        let Some(facet) = self.current.as_mut() else {
            return;
        };
        let points = &mut self.points;
        let i = *self.index.entry(vertex).or_insert_with(|| {
            points.push(model.point(vertex));
            points.len() - 1
        });
        facet.push(i);
    }
}
