use nmgkernel::euler::{
    make_edge, make_face_from_vertices, make_region_shell, make_vertex, make_vertex_loop,
};
use nmgkernel::topo::{validate_model, Orientation, ShellId, VertexId};
use nmgkernel::{decompose_shell, DecomposeOptions, Model, Point3, Remainder, TopoError};

/// Route the decomposer's debug events to the test output.
fn init_logging() {
    let subscriber = tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(tracing::Level::DEBUG)
        .with_target(false)
        .with_test_writer()
        .finish();
    let _ = tracing::subscriber::set_global_default(subscriber);
}

fn vertex(model: &mut Model, x: f64, y: f64, z: f64) -> VertexId {
    make_vertex(model, Point3::new(x, y, z))
}

/// Unit right triangle in the z = 0 plane with its corner at `(x, y)`.
fn triangle_at(model: &mut Model, shell: ShellId, x: f64, y: f64) -> Vec<VertexId> {
    let v = vec![
        vertex(model, x, y, 0.0),
        vertex(model, x + 1.0, y, 0.0),
        vertex(model, x, y + 1.0, 0.0),
    ];
    make_face_from_vertices(model, shell, &v).unwrap();
    v
}

/// Sorted vertices of every exterior loop in the given shells, one entry
/// per loop corner.
fn exterior_vertices(model: &Model, shells: &[ShellId]) -> Vec<VertexId> {
    let mut all = Vec::new();
    for &s in shells {
        for fu in model.shell_faces(s) {
            for &lu in &model.faceuse(fu).loopuses {
                if model.loopuse(lu).orientation == Orientation::Same {
                    all.extend(model.loopuse_vertices(lu));
                }
            }
        }
    }
    all.sort();
    all
}

#[test]
fn disjoint_triangles_split() {
    init_logging();
    let mut model = Model::new();
    let (region, shell) = make_region_shell(&mut model);
    triangle_at(&mut model, shell, 0.0, 0.0);
    triangle_at(&mut model, shell, 5.0, 0.0);

    let shells = decompose_shell(&mut model, shell, &DecomposeOptions::default()).unwrap();
    assert_eq!(shells.len(), 2);
    assert_eq!(shells[0], shell);
    for &s in &shells {
        assert_eq!(model.shell(s).faceuses.len(), 2);
        assert_eq!(model.shell(s).region, region);
    }
    assert_eq!(model.region(region).shells.len(), 2);
    assert!(validate_model(&model).valid);
}

#[test]
fn shared_vertex_keeps_one_shell() {
    let mut model = Model::new();
    let (_, shell) = make_region_shell(&mut model);
    let first = triangle_at(&mut model, shell, 0.0, 0.0);
    let b = vertex(&mut model, 2.0, 0.0, 0.0);
    let c = vertex(&mut model, 2.0, 1.0, 0.0);
    make_face_from_vertices(&mut model, shell, &[first[1], b, c]).unwrap();

    let shells = decompose_shell(&mut model, shell, &DecomposeOptions::default()).unwrap();
    assert_eq!(shells, vec![shell]);
    assert_eq!(model.shell(shell).faceuses.len(), 4);
}

#[test]
fn contained_coplanar_face_keeps_one_shell() {
    let mut model = Model::new();
    let (_, shell) = make_region_shell(&mut model);
    let outer: Vec<_> = [(0.0, 0.0), (10.0, 0.0), (10.0, 10.0), (0.0, 10.0)]
        .iter()
        .map(|&(x, y)| vertex(&mut model, x, y, 0.0))
        .collect();
    make_face_from_vertices(&mut model, shell, &outer).unwrap();
    triangle_at(&mut model, shell, 4.0, 4.0);

    let shells = decompose_shell(&mut model, shell, &DecomposeOptions::default()).unwrap();
    assert_eq!(shells.len(), 1);
}

#[test]
fn single_face_is_returned_unchanged() {
    let mut model = Model::new();
    let (_, shell) = make_region_shell(&mut model);
    triangle_at(&mut model, shell, 0.0, 0.0);
    let before = model.clone();

    let shells = decompose_shell(&mut model, shell, &DecomposeOptions::default()).unwrap();
    assert_eq!(shells, vec![shell]);
    assert_eq!(model.shell(shell).faceuses, before.shell(shell).faceuses);
    assert_eq!(model.shell_count(), before.shell_count());
    assert_eq!(model.edgeuse_count(), before.edgeuse_count());
}

#[test]
fn vertices_are_conserved() {
    let mut model = Model::new();
    let (_, shell) = make_region_shell(&mut model);
    let a = triangle_at(&mut model, shell, 0.0, 0.0);
    // Touches the first triangle along its hypotenuse only.
    let d = vertex(&mut model, 1.0, 1.0, 0.0);
    make_face_from_vertices(&mut model, shell, &[a[1], d, a[2]]).unwrap();
    triangle_at(&mut model, shell, 10.0, 0.0);
    triangle_at(&mut model, shell, 0.0, 10.0);
    let before = exterior_vertices(&model, &[shell]);

    let shells = decompose_shell(&mut model, shell, &DecomposeOptions::default()).unwrap();
    assert_eq!(shells.len(), 3);
    assert_eq!(exterior_vertices(&model, &shells), before);
    assert_eq!(model.shell(shells[0]).faceuses.len(), 4);
    assert!(validate_model(&model).valid);
}

#[test]
fn wire_edge_on_moved_face_straddles() {
    init_logging();
    let mut model = Model::new();
    let (_, shell) = make_region_shell(&mut model);
    triangle_at(&mut model, shell, 0.0, 0.0);
    let far = triangle_at(&mut model, shell, 5.0, 0.0);
    let wire = make_edge(&mut model, shell, far[0], far[1]).unwrap();
    let edge = model.edgeuse(wire).edge;
    let shells_before = model.shell_count();

    let err = decompose_shell(&mut model, shell, &DecomposeOptions::default()).unwrap_err();
    assert_eq!(err, TopoError::EdgeStraddlesShells(edge));
    assert_eq!(model.shell_count(), shells_before);
    assert_eq!(model.shell(shell).edgeuses.len(), 2);
    assert!(validate_model(&model).valid);

    // Killing the wire content removes the conflict.
    let opts = DecomposeOptions { remainder: Remainder::Kill, ..DecomposeOptions::default() };
    let shells = decompose_shell(&mut model, shell, &opts).unwrap();
    assert_eq!(shells.len(), 2);
    assert!(model.shell(shell).edgeuses.is_empty());
    assert!(validate_model(&model).valid);
}

#[test]
fn remainder_kill_clears_wire_content() {
    let mut model = Model::new();
    let (_, shell) = make_region_shell(&mut model);
    triangle_at(&mut model, shell, 0.0, 0.0);
    let a = vertex(&mut model, 3.0, 3.0, 3.0);
    let b = vertex(&mut model, 4.0, 3.0, 3.0);
    make_edge(&mut model, shell, a, b).unwrap();
    let p = vertex(&mut model, 7.0, 7.0, 7.0);
    make_vertex_loop(&mut model, shell, p).unwrap();

    let kept = decompose_shell(&mut model, shell, &DecomposeOptions::default()).unwrap();
    assert_eq!(kept, vec![shell]);
    assert_eq!(model.shell(shell).edgeuses.len(), 2);
    assert_eq!(model.shell(shell).loopuses.len(), 2);

    let opts = DecomposeOptions { remainder: Remainder::Kill, ..DecomposeOptions::default() };
    decompose_shell(&mut model, shell, &opts).unwrap();
    assert!(model.shell(shell).edgeuses.is_empty());
    assert!(model.shell(shell).loopuses.is_empty());
    assert_eq!(model.vertex_count(), 3);
    assert!(validate_model(&model).valid);
}
