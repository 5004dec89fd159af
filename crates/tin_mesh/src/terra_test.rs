use super::*;

fn raster_from_fn(w: usize, h: usize, f: impl Fn(usize, usize) -> f64) -> RasterDouble {
  let mut r = RasterDouble::with_size(w, h);
  r.set_pos_x(0.0);
  r.set_pos_y(0.0);
  r.set_cell_size(1.0);
  for y in 0..h {
    for x in 0..w {
      *r.value_mut(y, x) = f(x, y);
    }
  }
  r
}

#[test]
fn candidate_consider_keeps_strict_maximum() {
  let mut c = Candidate::start(0, FaceHandle::NONE);
  c.consider(1, 1, 5.0, 2.0);
  c.consider(2, 2, 6.0, 2.0); // tie: first seen wins
  assert_eq!(c.x, 1);

  c.consider(3, 3, 7.0, 3.0);
  assert_eq!(c.x, 3);
  assert_eq!(c.importance, 3.0);
}

#[test]
fn candidate_heap_breaks_ties_by_token() {
  let mut list = CandidateList::new();
  let mut a = Candidate::start(1, FaceHandle::NONE);
  a.consider(1, 0, 0.0, 5.0);
  let mut b = Candidate::start(2, FaceHandle::NONE);
  b.consider(2, 0, 0.0, 5.0);
  let mut c = Candidate::start(3, FaceHandle::NONE);
  c.consider(3, 0, 0.0, 1.0);

  list.push(a);
  list.push(c);
  list.push(b);

  // equal importance: the later token pops first
  assert_eq!(list.grab_greatest().unwrap().x, 2);
  assert_eq!(list.grab_greatest().unwrap().x, 1);
  assert_eq!(list.grab_greatest().unwrap().x, 3);
  assert!(list.grab_greatest().is_none());
}

#[test]
fn flat_plane_needs_only_the_corners() {
  let raster = raster_from_fn(10, 10, |_, _| 0.0);
  let mesh = generate_tin_terra(raster, 0.01).unwrap();

  assert_eq!(mesh.vertices().len(), 4);
  assert_eq!(mesh.faces().len(), 2);
  assert!(mesh.check_tin_properties());
}

#[test]
fn linear_ramp_is_exactly_representable() {
  let raster = raster_from_fn(10, 10, |x, _| x as f64);
  let mesh = generate_tin_terra(raster, 0.01).unwrap();

  assert_eq!(mesh.vertices().len(), 4);
  assert_eq!(mesh.faces().len(), 2);
  assert!(mesh.check_tin_properties());
}

#[test]
fn gaussian_bump_stays_within_budget() {
  let raster = raster_from_fn(100, 100, |x, y| {
    let dx = x as f64 - 50.0;
    let dy = y as f64 - 50.0;
    (-(dx * dx + dy * dy) / 200.0).exp()
  });
  let mesh = generate_tin_terra(raster, 0.05).unwrap();

  let n = mesh.vertices().len();
  assert!(n >= 10, "expected at least 10 vertices, got {n}");
  assert!(n <= 500, "expected at most 500 vertices, got {n}");
  assert!(mesh.check_tin_properties());
}

#[test]
fn sine_terrain_produces_a_proper_tin() {
  let raster = raster_from_fn(10, 20, |x, y| (x as f64).sin() * (y as f64).sin());
  let mesh = generate_tin_terra(raster, 0.1).unwrap();

  assert!(!mesh.empty());
  assert!(mesh.check_tin_properties());
}

#[test]
fn two_by_two_with_missing_corner() {
  let mut raster = raster_from_fn(2, 2, |x, y| (y * 2 + x) as f64);
  raster.set_no_data_value(-9999.0);
  *raster.value_mut(0, 0) = -9999.0;

  let mesh = generate_tin_terra(raster, 0.001).unwrap();

  assert_eq!(mesh.faces().len(), 2);
  assert_eq!(mesh.vertices().len(), 4);
  assert!(mesh.check_tin_properties());
}

#[test]
fn iteration_cap_bounds_insertions() {
  let raster = raster_from_fn(32, 32, |x, y| ((x * 7 + y * 13) % 17) as f64);
  let capped = generate_tin_terra_with_cap(raster.clone(), 0.01, 5).unwrap();
  let uncapped = generate_tin_terra(raster, 0.01).unwrap();

  // 4 corners plus at most 5 inserted sites
  assert!(capped.vertices().len() <= 9);
  assert!(uncapped.vertices().len() >= capped.vertices().len());
}

#[test]
fn meshing_is_deterministic() {
  let make = || {
    let raster = raster_from_fn(40, 40, |x, y| {
      ((x as f64) * 0.3).sin() * ((y as f64) * 0.2).cos() * 10.0
    });
    let mut mesh = generate_tin_terra(raster, 0.5).unwrap();
    mesh.generate_triangles();
    mesh.take_triangles()
  };

  let a = make();
  let b = make();
  assert_eq!(a.len(), b.len());
  for (ta, tb) in a.iter().zip(b.iter()) {
    assert_eq!(ta, tb);
  }
}

#[test]
fn invalid_inputs_are_rejected() {
  let raster = raster_from_fn(10, 10, |_, _| 1.0);
  assert!(matches!(
    generate_tin_terra(raster.clone(), 0.0),
    Err(MeshError::InvalidInput(_))
  ));
  assert!(matches!(
    generate_tin_terra(raster.clone(), -1.0),
    Err(MeshError::InvalidInput(_))
  ));

  let tiny = raster_from_fn(1, 1, |_, _| 1.0);
  assert!(matches!(
    generate_tin_terra(tiny, 0.1),
    Err(MeshError::InvalidInput(_))
  ));

  let mut hollow = RasterDouble::with_size(4, 4);
  hollow.set_no_data_value(-9999.0);
  hollow.set_all(-9999.0);
  assert!(matches!(
    generate_tin_terra(hollow, 0.1),
    Err(MeshError::InvalidInput(_))
  ));
}
