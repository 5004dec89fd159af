use super::*;

#[test]
fn downsample_takes_window_means() {
  let mut src = RasterDouble::with_size(4, 4);
  src.set_cell_size(1.0);
  for row in 0..4 {
    for col in 0..4 {
      *src.value_mut(row, col) = (row * 4 + col) as f64;
    }
  }

  let dst = integer_downsample_mean(&src, 2);

  assert_eq!(dst.width(), 2);
  assert_eq!(dst.height(), 2);
  assert_eq!(dst.cell_size(), 2.0);
  // mean of 0,1,4,5
  assert_eq!(dst.value(0, 0), 2.5);
  // mean of 10,11,14,15
  assert_eq!(dst.value(1, 1), 12.5);
}

#[test]
fn downsample_skips_no_data() {
  let mut src = RasterDouble::with_size(2, 2);
  src.set_no_data_value(-9999.0);
  *src.value_mut(0, 0) = 10.0;
  *src.value_mut(0, 1) = -9999.0;
  *src.value_mut(1, 0) = 20.0;
  *src.value_mut(1, 1) = -9999.0;

  let dst = integer_downsample_mean(&src, 2);
  assert_eq!(dst.value(0, 0), 15.0);
}

#[test]
fn downsample_all_no_data_stays_no_data() {
  let mut src = RasterDouble::with_size(2, 2);
  src.set_no_data_value(-9999.0);
  src.set_all(-9999.0);

  let dst = integer_downsample_mean(&src, 2);
  assert!(dst.is_no_data(dst.value(0, 0)));
}

#[test]
fn downsample_truncates_partial_windows() {
  let mut src = RasterDouble::with_size(5, 5);
  src.set_all(1.0);

  let dst = integer_downsample_mean(&src, 2);
  assert_eq!(dst.width(), 2);
  assert_eq!(dst.height(), 2);
}

#[test]
fn flips_mirror_data() {
  let mut r = RasterDouble::with_size(3, 2);
  for row in 0..2 {
    for col in 0..3 {
      *r.value_mut(row, col) = (row * 3 + col) as f64;
    }
  }

  flip_data_x(&mut r);
  assert_eq!(r.value(0, 0), 2.0);
  assert_eq!(r.value(0, 2), 0.0);

  flip_data_x(&mut r);
  flip_data_y(&mut r);
  assert_eq!(r.value(0, 0), 3.0);
  assert_eq!(r.value(1, 0), 0.0);
}

#[test]
fn minmax_ignores_no_data() {
  let mut r = RasterDouble::with_size(2, 2);
  r.set_no_data_value(-9999.0);
  *r.value_mut(0, 0) = 5.0;
  *r.value_mut(0, 1) = -3.0;
  *r.value_mut(1, 0) = -9999.0;
  *r.value_mut(1, 1) = 12.0;

  assert_eq!(find_minmax(&r), Some((-3.0, 12.0)));
  assert_eq!(find_minmax(&RasterDouble::new()), None);
}

#[test]
fn bounding_box_3d_includes_height_range() {
  let mut r = RasterDouble::with_size(3, 3);
  r.set_pos_x(0.0);
  r.set_pos_y(0.0);
  r.set_cell_size(1.0);
  r.set_all(2.0);
  *r.value_mut(1, 1) = 7.0;

  let bb = get_bounding_box3d(&r);
  assert_eq!(bb.min.z, 2.0);
  assert_eq!(bb.max.z, 7.0);
  assert_eq!(bb.min.x, 0.5);
  assert_eq!(bb.max.y, 2.5);
}

#[test]
fn nearest_valid_avg_returns_valid_pixel_directly() {
  let mut r = RasterDouble::with_size(3, 3);
  r.set_all(4.0);
  assert_eq!(sample_nearest_valid_avg(&r, 1, 1, 1), 4.0);
}

#[test]
fn nearest_valid_avg_imputes_from_neighbors() {
  let mut r = RasterDouble::with_size(5, 5);
  r.set_no_data_value(-9999.0);
  r.set_all(10.0);
  *r.value_mut(0, 0) = -9999.0;

  let z = sample_nearest_valid_avg(&r, 0, 0, 1);
  assert!((z - 10.0).abs() < 1e-9);
}

#[test]
fn nearest_valid_avg_on_all_missing_is_nan() {
  let mut r = RasterDouble::with_size(3, 3);
  r.set_no_data_value(-9999.0);
  r.set_all(-9999.0);

  assert!(sample_nearest_valid_avg(&r, 1, 1, 1).is_nan());
}
