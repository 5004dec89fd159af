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
fn average_of_skips_no_data() {
  assert_eq!(average_of(1.0, 3.0, f64::NAN, -9999.0, -9999.0), 2.0);
  assert!(average_of(f64::NAN, f64::NAN, -9999.0, -9999.0, -9999.0).is_nan());
  assert_eq!(average_of(2.0, 2.0, 2.0, 2.0, -9999.0), 2.0);
}

#[test]
fn flat_plane_needs_only_the_corners() {
  let raster = raster_from_fn(10, 10, |_, _| 3.5);
  let mesh = generate_tin_zemlya(raster, 0.01).unwrap();

  assert_eq!(mesh.vertices().len(), 4);
  assert_eq!(mesh.faces().len(), 2);
  assert!(mesh.check_tin_properties());
}

#[test]
fn gentle_ramp_within_coarse_tolerance() {
  // pyramid averages sit half a pixel off the true ramp, well inside a
  // 1.0 error bound, so no refinement is needed
  let raster = raster_from_fn(10, 10, |x, _| x as f64);
  let mesh = generate_tin_zemlya(raster, 1.0).unwrap();

  assert_eq!(mesh.vertices().len(), 4);
  assert_eq!(mesh.faces().len(), 2);
  assert!(mesh.check_tin_properties());
}

#[test]
fn gaussian_bump_refines_near_the_peak() {
  let raster = raster_from_fn(100, 100, |x, y| {
    let dx = x as f64 - 50.0;
    let dy = y as f64 - 50.0;
    (-(dx * dx + dy * dy) / 200.0).exp()
  });
  let mesh = generate_tin_zemlya(raster, 0.05).unwrap();

  let n = mesh.vertices().len();
  assert!(n >= 10, "expected at least 10 vertices, got {n}");
  assert!(n <= 500, "expected at most 500 vertices, got {n}");
  assert!(mesh.check_tin_properties());
}

#[test]
fn sine_terrain_produces_a_proper_tin() {
  let raster = raster_from_fn(20, 10, |x, y| (x as f64 * 0.5).sin() * (y as f64 * 0.5).sin());
  let mesh = generate_tin_zemlya(raster, 0.1).unwrap();

  assert!(!mesh.empty());
  assert!(mesh.check_tin_properties());
}

#[test]
fn handles_missing_samples() {
  let mut raster = raster_from_fn(16, 16, |x, y| ((x + y) % 5) as f64);
  raster.set_no_data_value(-9999.0);
  *raster.value_mut(0, 0) = -9999.0;
  *raster.value_mut(7, 7) = -9999.0;
  *raster.value_mut(8, 3) = -9999.0;

  let mesh = generate_tin_zemlya(raster, 0.5).unwrap();

  assert!(!mesh.empty());
  assert!(mesh.check_tin_properties());
}

#[test]
fn meshing_is_deterministic() {
  let make = || {
    let raster = raster_from_fn(33, 47, |x, y| {
      ((x as f64) * 0.21).sin() * ((y as f64) * 0.17).cos() * 8.0
    });
    let mut mesh = generate_tin_zemlya(raster, 0.4).unwrap();
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
  let raster = raster_from_fn(8, 8, |_, _| 1.0);
  assert!(matches!(
    generate_tin_zemlya(raster, 0.0),
    Err(MeshError::InvalidInput(_))
  ));

  let tiny = raster_from_fn(1, 2, |_, _| 1.0);
  assert!(matches!(
    generate_tin_zemlya(tiny, 0.1),
    Err(MeshError::InvalidInput(_))
  ));
}
