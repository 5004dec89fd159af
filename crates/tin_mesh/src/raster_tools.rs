//! Raster utilities: downsampling, statistics, flips, and imputation of
//! missing samples from the nearest valid neighborhood.

use crate::geometry::BBox3D;
use crate::raster::RasterDouble;

/// Downsample by an integer factor, taking the mean of each
/// `window_size`×`window_size` block and skipping no-data cells.
/// The output size truncates to the nearest whole window.
pub fn integer_downsample_mean(src: &RasterDouble, window_size: usize) -> RasterDouble {
  let w = src.width();
  let h = src.height();

  let ws = w / window_size;
  let hs = h / window_size;

  let ndv = src.no_data_value();

  let mut dst = RasterDouble::with_size(ws, hs);
  dst.copy_parameters(src);
  dst.set_no_data_value(ndv);
  dst.set_cell_size(src.cell_size() * window_size as f64);
  dst.set_all(ndv);

  for rs in 0..hs {
    for cs in 0..ws {
      let mut count = 0usize;
      let mut sum = 0.0;

      for i in 0..window_size {
        for j in 0..window_size {
          let sv = src.value(rs * window_size + i, cs * window_size + j);
          if !src.is_no_data(sv) {
            sum += sv;
            count += 1;
          }
        }
      }

      if count > 0 {
        *dst.value_mut(rs, cs) = sum / count as f64;
      }
    }
  }

  dst
}

/// Mirror all rows horizontally in place.
pub fn flip_data_x(raster: &mut RasterDouble) {
  for row in 0..raster.height() {
    raster.row_mut(row).reverse();
  }
}

/// Mirror the raster vertically in place.
pub fn flip_data_y(raster: &mut RasterDouble) {
  let height = raster.height();
  let width = raster.width();
  let data = raster.data_mut();

  for row in 0..height / 2 {
    let opposite = height - 1 - row;
    for col in 0..width {
      data.swap(row * width + col, opposite * width + col);
    }
  }
}

/// Minimum and maximum over all valid samples. `None` when the raster is
/// empty or holds no valid data.
pub fn find_minmax(raster: &RasterDouble) -> Option<(f64, f64)> {
  if raster.empty() {
    return None;
  }

  let mut min = f64::INFINITY;
  let mut max = f64::NEG_INFINITY;
  let mut seen = false;

  for &v in raster.data() {
    if raster.is_no_data(v) {
      continue;
    }
    min = min.min(v);
    max = max.max(v);
    seen = true;
  }

  seen.then_some((min, max))
}

/// Treat the raster as a DEM and return its 3D bounding box.
pub fn get_bounding_box3d(raster: &RasterDouble) -> BBox3D {
  let (min_height, max_height) = find_minmax(raster).unwrap_or((0.0, 0.0));
  let bbox2d = raster.get_bounding_box();

  let mut bbox3d = BBox3D::new();
  bbox3d.min = glam::DVec3::new(bbox2d.min.x, bbox2d.min.y, min_height);
  bbox3d.max = glam::DVec3::new(bbox2d.max.x, bbox2d.max.y, max_height);
  bbox3d
}

fn safe_get_pixel(src: &RasterDouble, w: i64, h: i64, r: i64, c: i64) -> f64 {
  if r >= 0 && r < h && c >= 0 && c < w {
    src.value(r as usize, c as usize)
  } else {
    f64::NAN
  }
}

fn average_nan_slice(values: &[f64]) -> f64 {
  let mut sum = 0.0;
  let mut count = 0usize;
  for &v in values {
    if !v.is_nan() {
      sum += v;
      count += 1;
    }
  }
  if count == 0 {
    f64::NAN
  } else {
    sum / count as f64
  }
}

/// Weighted 3×3 subsample around (r, c): center counted three times, the
/// 4-cross average twice, the 4-diagonal average once.
fn subsample_raster_3x3(src: &RasterDouble, ndv: f64, w: i64, h: i64, r: i64, c: i64) -> f64 {
  let clean = |v: f64| if v == ndv { f64::NAN } else { v };

  let center = clean(safe_get_pixel(src, w, h, r, c));
  let cross = [
    clean(safe_get_pixel(src, w, h, r - 1, c)),
    clean(safe_get_pixel(src, w, h, r, c - 1)),
    clean(safe_get_pixel(src, w, h, r, c + 1)),
    clean(safe_get_pixel(src, w, h, r + 1, c)),
  ];
  let diag = [
    clean(safe_get_pixel(src, w, h, r - 1, c - 1)),
    clean(safe_get_pixel(src, w, h, r - 1, c + 1)),
    clean(safe_get_pixel(src, w, h, r + 1, c - 1)),
    clean(safe_get_pixel(src, w, h, r + 1, c + 1)),
  ];

  let cross_avg = average_nan_slice(&cross);
  let diag_avg = average_nan_slice(&diag);

  average_nan_slice(&[center, center, center, cross_avg, cross_avg, diag_avg])
}

const MAX_AVERAGING_SAMPLES: usize = 64;

/// Impute a value for (row, column) from the nearest valid samples.
///
/// Walks Bresenham circles of growing radius around the pixel, collecting
/// weighted 3×3 subsamples until at least `min_averaging_samples` are found
/// (capped at 64), and returns their average. Returns the pixel itself when
/// it is already valid; NaN when nothing valid exists in range.
pub fn sample_nearest_valid_avg(
  src: &RasterDouble,
  row: usize,
  column: usize,
  min_averaging_samples: usize,
) -> f64 {
  let min_samples = min_averaging_samples.min(MAX_AVERAGING_SAMPLES);

  let row = row as i64;
  let column = column as i64;
  let w = src.width() as i64;
  let h = src.height() as i64;
  let max_radius = ((w * w + h * h) as f64).sqrt() as i64;
  let ndv = src.no_data_value();

  if row < h && column < w {
    let z = src.value(row as usize, column as usize);
    if !src.is_no_data(z) {
      return z;
    }
  }

  let mut to_average = [0.0f64; MAX_AVERAGING_SAMPLES];
  let mut avg_count = 0usize;

  let mut put_pixel = |x: i64, y: i64, avg_count: &mut usize, to_average: &mut [f64]| {
    let dest_r = row + y;
    let dest_c = column + x;
    let z = subsample_raster_3x3(src, ndv, w, h, dest_r, dest_c);
    if !z.is_nan() && z != ndv && *avg_count < MAX_AVERAGING_SAMPLES {
      to_average[*avg_count] = z;
      *avg_count += 1;
    }
  };

  let mut radius = 2i64;
  while radius <= max_radius && avg_count < min_samples {
    // midpoint circle walk at this radius
    let mut x = radius - 1;
    let mut y = 0i64;
    let mut dx = 1i64;
    let mut dy = 1i64;
    let mut err = dx - (radius / 2);

    while x >= y {
      put_pixel(x, y, &mut avg_count, &mut to_average);
      put_pixel(y, x, &mut avg_count, &mut to_average);
      put_pixel(-y, x, &mut avg_count, &mut to_average);
      put_pixel(-x, y, &mut avg_count, &mut to_average);
      put_pixel(-x, -y, &mut avg_count, &mut to_average);
      put_pixel(-y, -x, &mut avg_count, &mut to_average);
      put_pixel(y, -x, &mut avg_count, &mut to_average);
      put_pixel(x, -y, &mut avg_count, &mut to_average);

      if err <= 0 {
        y += 1;
        err += dy;
        dy += 2;
      } else {
        x -= 1;
        dx += 2;
        err += dx - (radius / 2);
      }
    }

    radius += 1;
  }

  if avg_count == 0 {
    return f64::NAN;
  }
  if avg_count == 1 {
    return to_average[0];
  }
  average_nan_slice(&to_average[..avg_count])
}

#[cfg(test)]
#[path = "raster_tools_test.rs"]
mod raster_tools_test;
