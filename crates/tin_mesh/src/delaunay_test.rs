use super::*;

fn no_scan() -> impl FnMut(&Subdivision, FaceHandle) {
  |_, _| {}
}

fn seeded_square(size: f64) -> DelaunayMesh {
  let mut dm = DelaunayMesh::new();
  dm.init_mesh(
    DVec2::new(0.0, 0.0),
    DVec2::new(0.0, size),
    DVec2::new(size, size),
    DVec2::new(size, 0.0),
  );
  dm
}

fn collect_face_points(dm: &DelaunayMesh) -> Vec<[DVec2; 3]> {
  dm.faces().map(|t| dm.sub().face_points(t)).collect()
}

/// Global Delaunay check on a small mesh: no mesh vertex lies strictly
/// inside the circumcircle of any face.
fn is_delaunay(dm: &DelaunayMesh) -> bool {
  let faces = collect_face_points(dm);
  let mut vertices: Vec<DVec2> = Vec::new();
  for f in &faces {
    for p in f {
      if !vertices.contains(p) {
        vertices.push(*p);
      }
    }
  }

  for f in &faces {
    // orient CCW before the incircle test
    let (a, b, c) = if ccw(f[0], f[1], f[2]) {
      (f[0], f[1], f[2])
    } else {
      (f[2], f[1], f[0])
    };
    for v in &vertices {
      if *v == a || *v == b || *v == c {
        continue;
      }
      if in_circle(a, b, c, *v) {
        return false;
      }
    }
  }
  true
}

#[test]
fn init_mesh_produces_two_faces() {
  let dm = seeded_square(10.0);
  assert_eq!(dm.faces().count(), 2);
  assert!(is_delaunay(&dm));
}

#[test]
fn insert_interior_point_adds_faces() {
  let mut dm = seeded_square(10.0);
  dm.insert(DVec2::new(3.0, 4.0), FaceHandle::NONE, &mut no_scan());

  // an interior site splits one triangle into three
  assert_eq!(dm.faces().count(), 4);
  assert!(is_delaunay(&dm));
}

#[test]
fn insert_many_points_keeps_delaunay_property() {
  let mut dm = seeded_square(16.0);
  let sites = [
    (3.0, 2.0),
    (12.0, 5.0),
    (7.0, 9.0),
    (2.0, 13.0),
    (10.0, 12.0),
    (5.0, 6.0),
    (14.0, 14.0),
    (9.0, 3.0),
  ];
  for (x, y) in sites {
    dm.insert(DVec2::new(x, y), FaceHandle::NONE, &mut no_scan());
  }

  assert!(is_delaunay(&dm));

  // every face is a non-degenerate triangle
  for t in dm.faces() {
    let [p1, p2, p3] = dm.sub().face_points(t);
    assert!(tri_area(p1, p2, p3).abs() > 0.0);
  }
}

#[test]
fn insert_existing_vertex_is_a_no_op_on_topology() {
  let mut dm = seeded_square(10.0);
  dm.insert(DVec2::new(5.0, 5.0), FaceHandle::NONE, &mut no_scan());
  let count = dm.faces().count();

  dm.insert(DVec2::new(5.0, 5.0), FaceHandle::NONE, &mut no_scan());
  assert_eq!(dm.faces().count(), count);

  // corner of the seed quadrilateral
  dm.insert(DVec2::new(0.0, 0.0), FaceHandle::NONE, &mut no_scan());
  assert_eq!(dm.faces().count(), count);
}

#[test]
fn insert_point_on_interior_edge() {
  let mut dm = seeded_square(10.0);
  // the seed diagonal runs (0,0)-(10,10)
  dm.insert(DVec2::new(5.0, 5.0), FaceHandle::NONE, &mut no_scan());

  assert_eq!(dm.faces().count(), 4);
  assert!(is_delaunay(&dm));
}

#[test]
fn insert_point_on_boundary_edge() {
  let mut dm = seeded_square(10.0);
  dm.insert(DVec2::new(5.0, 0.0), FaceHandle::NONE, &mut no_scan());

  assert!(is_delaunay(&dm));
  // boundary split: the bottom triangle becomes two
  assert_eq!(dm.faces().count(), 3);
}

#[test]
fn scan_callback_sees_incident_faces() {
  let mut dm = seeded_square(10.0);
  let mut scanned = Vec::new();
  dm.insert(DVec2::new(4.0, 3.0), FaceHandle::NONE, &mut |_, t| {
    scanned.push(t)
  });

  // every triangle around the site gets rescanned, each exactly once;
  // legalization swaps can raise the spoke count above three
  assert!(scanned.len() >= 3);
  let unique: std::collections::HashSet<_> = scanned.iter().collect();
  assert_eq!(unique.len(), scanned.len());
}

#[test]
fn locate_finds_containing_face() {
  let mut dm = seeded_square(10.0);
  let x = DVec2::new(2.0, 7.0);
  let e = dm.locate(x);

  // x must not be to the right of the returned edge
  let sub = dm.sub();
  assert!(!sub.point_right_of(x, e));
}

#[test]
fn locate_is_deterministic_across_runs() {
  let build = || {
    let mut dm = seeded_square(32.0);
    for i in 0..20 {
      let x = (i * 7 % 31) as f64 + 0.5;
      let y = (i * 13 % 29) as f64 + 0.5;
      dm.insert(DVec2::new(x, y), FaceHandle::NONE, &mut no_scan());
    }
    collect_face_points(&dm)
  };

  let a = build();
  let b = build();
  assert_eq!(a.len(), b.len());
  for (fa, fb) in a.iter().zip(b.iter()) {
    assert_eq!(fa, fb);
  }
}
