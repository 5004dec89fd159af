use super::*;
use glam::DVec3;

fn unit_quad_mesh() -> Mesh {
  // two CCW triangles covering the unit square
  let vertices = vec![
    DVec3::new(0.0, 0.0, 0.0),
    DVec3::new(1.0, 0.0, 0.0),
    DVec3::new(1.0, 1.0, 0.0),
    DVec3::new(0.0, 1.0, 0.0),
  ];
  let faces = vec![[0, 1, 2], [0, 2, 3]];
  Mesh::from_decomposed(vertices, faces)
}

#[test]
fn generate_triangles_matches_faces() {
  let mut mesh = unit_quad_mesh();
  mesh.generate_triangles();

  assert_eq!(mesh.triangles().len(), mesh.faces().len());
  assert_eq!(mesh.triangles()[0][1], DVec3::new(1.0, 0.0, 0.0));
}

#[test]
fn generate_decomposed_merges_shared_vertices() {
  let t0 = [
    DVec3::new(0.0, 0.0, 0.0),
    DVec3::new(1.0, 0.0, 0.0),
    DVec3::new(1.0, 1.0, 0.0),
  ];
  let t1 = [
    DVec3::new(0.0, 0.0, 0.0),
    DVec3::new(1.0, 1.0, 0.0),
    DVec3::new(0.0, 1.0, 0.0),
  ];

  let mut mesh = Mesh::from_triangles(vec![t0, t1]);
  mesh.generate_decomposed();

  assert_eq!(mesh.vertices().len(), 4);
  assert_eq!(mesh.faces().len(), 2);
  assert!(mesh.check_tin_properties());
}

#[test]
fn round_trip_preserves_poly_count() {
  let mut mesh = unit_quad_mesh();
  mesh.generate_triangles();

  let mut rebuilt = Mesh::from_triangles(mesh.take_triangles());
  rebuilt.generate_decomposed();

  assert_eq!(rebuilt.poly_count(), 2);
  assert_eq!(rebuilt.vertices().len(), 4);
}

#[test]
fn tin_check_rejects_downward_face() {
  let vertices = vec![
    DVec3::new(0.0, 0.0, 0.0),
    DVec3::new(1.0, 0.0, 0.0),
    DVec3::new(1.0, 1.0, 0.0),
  ];
  // CW winding
  let mesh = Mesh::from_decomposed(vertices, vec![[0, 2, 1]]);
  assert!(!mesh.check_tin_properties());
}

#[test]
fn tin_check_rejects_collapsed_face() {
  let vertices = vec![DVec3::new(0.0, 0.0, 0.0), DVec3::new(1.0, 0.0, 0.0)];
  let mesh = Mesh::from_decomposed(vertices, vec![[0, 1, 1]]);
  assert!(!mesh.check_tin_properties());
}

#[test]
fn tin_check_rejects_unreferenced_vertex() {
  let vertices = vec![
    DVec3::new(0.0, 0.0, 0.0),
    DVec3::new(1.0, 0.0, 0.0),
    DVec3::new(1.0, 1.0, 0.0),
    DVec3::new(9.0, 9.0, 9.0),
  ];
  let mesh = Mesh::from_decomposed(vertices, vec![[0, 1, 2]]);
  assert!(!mesh.check_tin_properties());
}

#[test]
fn tin_check_rejects_overlapping_faces() {
  // two triangles crossing each other in 2D
  let vertices = vec![
    DVec3::new(0.0, 0.0, 0.0),
    DVec3::new(2.0, 0.0, 0.0),
    DVec3::new(1.0, 2.0, 0.0),
    DVec3::new(0.0, 1.0, 0.0),
    DVec3::new(2.0, 1.0, 0.0),
    DVec3::new(1.0, -1.0, 0.0),
  ];
  let mesh = Mesh::from_decomposed(vertices, vec![[0, 1, 2], [5, 4, 3]]);
  assert!(!mesh.check_tin_properties());
}

#[test]
fn tin_check_accepts_proper_mesh() {
  assert!(unit_quad_mesh().check_tin_properties());
}

#[test]
fn bbox_covers_both_views() {
  let mut mesh = unit_quad_mesh();
  let bb = mesh.get_bbox();
  assert_eq!(bb.min, DVec3::new(0.0, 0.0, 0.0));
  assert_eq!(bb.max, DVec3::new(1.0, 1.0, 0.0));

  mesh.generate_triangles();
  let tri_only = Mesh::from_triangles(mesh.take_triangles());
  let bb2 = tri_only.get_bbox();
  assert_eq!(bb2.min, bb.min);
  assert_eq!(bb2.max, bb.max);
}

#[test]
fn compose_triangle_checks_indices() {
  let mesh = unit_quad_mesh();
  assert!(mesh.compose_triangle(&[0, 1, 2]).is_some());
  assert!(mesh.compose_triangle(&[0, 1, 9]).is_none());
}
