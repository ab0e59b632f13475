//! Property-based tests for structural invariants.
//!
//! Random polygon files are imported and decomposed; afterwards every use
//! must still have an involutive mate, every radial cycle must close over
//! exactly the uses of its edge, and decomposition must conserve the
//! exterior-loop vertices.

use std::collections::HashMap;

use nmgkernel::euler::make_region;
use nmgkernel::topo::*;
use nmgkernel::{decompose_shell, import_polygons, DecomposeOptions, ImportOptions};
use proptest::prelude::*;

/// Triangles placed on a coarse grid. Several may land in the same cell,
/// where they overlap without sharing vertices.
fn grid_triangles() -> impl Strategy<Value = Vec<(u8, u8)>> {
    prop::collection::vec((0u8..4, 0u8..4), 1..10)
}

fn grid_text(cells: &[(u8, u8)]) -> String {
    let mut points = String::new();
    let mut facets = String::new();
    for (i, &(gx, gy)) in cells.iter().enumerate() {
        let (x, y) = (f64::from(gx) * 3.0, f64::from(gy) * 3.0);
        points.push_str(&format!("{x} {y} 0\n{} {y} 0\n{x} {} 0\n", x + 1.0, y + 1.0));
        let base = 3 * i;
        facets.push_str(&format!("3 {} {} {}\n", base + 1, base + 2, base + 3));
    }
    format!("{} {}\n{points}{facets}", 3 * cells.len(), cells.len())
}

/// A fan of triangles around point 1, each joined to the next.
fn fan_text(blades: usize) -> String {
    let mut text = format!("{} {}\n0 0 0\n", blades + 1, blades - 1);
    for k in 0..blades {
        let a = k as f64 * std::f64::consts::PI / blades as f64;
        text.push_str(&format!("{} {} {}\n", a.cos(), a.sin(), 0.25 * k as f64));
    }
    for k in 0..blades - 1 {
        text.push_str(&format!("3 1 {} {}\n", k + 2, k + 3));
    }
    text
}

fn load(text: &str) -> (Model, ShellId) {
    let mut model = Model::new();
    let region = make_region(&mut model);
    let report = import_polygons(&mut model, region, text, &ImportOptions::default()).unwrap();
    (model, report.shell)
}

/// Radial cycle length of every edge, computed from the edgeuses alone.
fn uses_per_edge(model: &Model, shells: &[ShellId]) -> HashMap<EdgeId, usize> {
    let mut counts = HashMap::new();
    for &s in shells {
        for fu in model.shell(s).faceuses.iter() {
            for &lu in &model.faceuse(*fu).loopuses {
                for &eu in model.loopuse_edgeuses(lu) {
                    *counts.entry(model.edgeuse(eu).edge).or_insert(0) += 1;
                }
            }
        }
    }
    counts
}

fn exterior_vertices(model: &Model, shells: &[ShellId]) -> Vec<VertexId> {
    let mut all: Vec<VertexId> = shells
        .iter()
        .flat_map(|&s| model.shell_faces(s))
        .flat_map(|fu| model.faceuse(fu).loopuses.clone())
        .filter(|&lu| model.loopuse(lu).orientation == Orientation::Same)
        .flat_map(|lu| model.loopuse_vertices(lu))
        .collect();
    all.sort();
    all
}

proptest! {
    #[test]
    fn imported_grid_is_valid(cells in grid_triangles()) {
        let (model, shell) = load(&grid_text(&cells));
        prop_assert!(validate_model(&model).valid);
        prop_assert_eq!(model.face_count(), cells.len());
        prop_assert_eq!(model.shell_faces(shell).len(), cells.len());
    }

    #[test]
    fn decomposition_conserves_vertices(cells in grid_triangles()) {
        let (mut model, shell) = load(&grid_text(&cells));
        let before = exterior_vertices(&model, &[shell]);

        let shells = decompose_shell(&mut model, shell, &DecomposeOptions::default()).unwrap();
        let mut occupied = cells.clone();
        occupied.sort();
        occupied.dedup();

        prop_assert_eq!(shells.len(), occupied.len());
        prop_assert_eq!(exterior_vertices(&model, &shells), before);
        prop_assert!(validate_model(&model).valid);
    }

    #[test]
    fn radial_cycles_close_over_their_uses(blades in 2usize..12) {
        let (model, shell) = load(&fan_text(blades));
        let counts = uses_per_edge(&model, &[shell]);
        for (&edge, &n) in &counts {
            let entry = model.edge(edge).edgeuse;
            prop_assert_eq!(model.radial_cycle(entry).len(), n);
            for eu in model.radial_cycle(entry) {
                prop_assert_eq!(model.edgeuse(model.edgeuse(eu).mate).mate, eu);
            }
        }
        // Spokes between neighbouring blades are shared by two faces.
        prop_assert_eq!(model.edge_count(), 2 * (blades - 1) + 1);
    }

    #[test]
    fn fan_never_splits(blades in 2usize..12) {
        let (mut model, shell) = load(&fan_text(blades));
        let shells = decompose_shell(&mut model, shell, &DecomposeOptions::default()).unwrap();
        prop_assert_eq!(shells, vec![shell]);
    }
}
