//! Rasterize a TIN back into a grid, and compare rasters pixel-wise.
//! Used to measure the vertical error a meshing run actually achieved.

use crate::geometry::{BBox2D, Triangle};
use crate::mesh::Mesh;
use crate::raster::RasterDouble;

const RASTERIZE_NO_DATA: f64 = -99999.0;

/// A triangle prepared for barycentric interpolation in pixel space.
struct ScanTriangle {
  t: Triangle,
  bb: BBox2D,
  wdem: f64,
}

impl ScanTriangle {
  fn new(t: Triangle) -> Self {
    let v1 = t[0];
    let v2 = t[1];
    let v3 = t[2];
    let wdem = (v2.y - v3.y) * (v1.x - v3.x) + (v3.x - v2.x) * (v1.y - v3.y);
    let bb = BBox2D::from_triangle(&t);
    ScanTriangle { t, bb, wdem }
  }

  /// Barycentric interpolation at (x, y); false when outside the triangle.
  fn interpolate(&self, x: f64, y: f64, z: &mut f64) -> bool {
    let v1 = self.t[0];
    let v2 = self.t[1];
    let v3 = self.t[2];

    let w1 = ((v2.y - v3.y) * (x - v3.x) + (v3.x - v2.x) * (y - v3.y)) / self.wdem;
    let w2 = ((v3.y - v1.y) * (x - v3.x) + (v1.x - v3.x) * (y - v3.y)) / self.wdem;
    let w3 = 1.0 - w1 - w2;

    *z = v1.z * w1 + v2.z * w2 + v3.z * w3;

    (0.0..=1.0).contains(&w1) && (0.0..=1.0).contains(&w2) && (0.0..=1.0).contains(&w3)
  }
}

/// Summary statistics of a raster-vs-raster comparison.
#[derive(Clone, Copy, Debug, Default)]
pub struct ErrorStats {
  pub mean: f64,
  pub std_dev: f64,
  pub max_abs_error: f64,
}

pub struct MeshToRaster {
  bb: BBox2D,
}

impl Default for MeshToRaster {
  fn default() -> Self {
    Self::new()
  }
}

impl MeshToRaster {
  pub fn new() -> Self {
    MeshToRaster { bb: BBox2D::new() }
  }

  pub fn bounding_box(&self) -> BBox2D {
    self.bb
  }

  fn find_bounding_box(mesh: &Mesh) -> BBox2D {
    let mut bb = BBox2D::new();
    for v in mesh.vertices() {
      bb.add(v.truncate());
    }
    bb
  }

  fn scale_vertex(v: glam::DVec3, raster: &RasterDouble) -> glam::DVec3 {
    // continuous pixel coordinates of the output grid, top-left rows
    let cell = raster.cell_size();
    let px = (v.x - raster.pos_x()) / cell - 0.5;
    let r_ll = (v.y - raster.pos_y()) / cell - 0.5;
    let r_tl = raster.height() as f64 - 1.0 - r_ll;
    glam::DVec3::new(px, r_tl, v.z)
  }

  fn rasterize_triangle(&self, raster: &mut RasterDouble, tri: &ScanTriangle) {
    let w = raster.width() as i64;
    let h = raster.height() as i64;

    let rs = (tri.bb.min.y as i64).clamp(0, h);
    let re = ((tri.bb.max.y + 1.5) as i64).clamp(0, h);
    let cs = (tri.bb.min.x as i64).clamp(0, w);
    let ce = ((tri.bb.max.x + 1.5) as i64).clamp(0, w);

    let mut visited = false;
    for r in rs..re {
      for c in cs..ce {
        let mut terrain_height = 0.0;
        if tri.interpolate(c as f64, r as f64, &mut terrain_height) {
          visited = true;
          *raster.value_mut(r as usize, c as usize) = terrain_height;
        }
      }
    }

    if !visited {
      tracing::warn!(
        "triangle not rendered, bbox x [{}, {}] y [{}, {}]",
        tri.bb.min.x,
        tri.bb.max.x,
        tri.bb.min.y,
        tri.bb.max.y
      );
    }
  }

  /// Render the mesh into a `out_width` × `out_height` raster spanning its
  /// xy bounding box. `original_width`/`original_height` are the dimensions
  /// of the raster the mesh was derived from (pass the output size when
  /// they match); they fix the cell size so that comparisons against the
  /// source raster align pixel for pixel.
  pub fn rasterize(
    &mut self,
    mesh: &mut Mesh,
    out_width: usize,
    out_height: usize,
    original_width: usize,
  ) -> RasterDouble {
    self.bb = Self::find_bounding_box(mesh);

    let mesh_w = self.bb.max.x - self.bb.min.x;
    let mesh_h = self.bb.max.y - self.bb.min.y;

    let mut raster = RasterDouble::new();
    if mesh_w <= 0.0 || mesh_h <= 0.0 {
      tracing::error!("mesh dimensions zero");
      return raster;
    }

    let cell_original = mesh_w / (original_width as f64 - 1.0);
    let cell = (mesh_w + cell_original) / out_width as f64;

    raster.allocate(out_width, out_height);
    raster.set_no_data_value(RASTERIZE_NO_DATA);
    raster.set_all(RASTERIZE_NO_DATA);
    raster.set_cell_size(cell);
    raster.set_pos_x(self.bb.min.x - cell_original * 0.5);
    raster.set_pos_y(self.bb.min.y - cell_original * 0.5);

    mesh.generate_triangles();

    for t in mesh.triangles() {
      let scaled: Triangle = [
        Self::scale_vertex(t[0], &raster),
        Self::scale_vertex(t[1], &raster),
        Self::scale_vertex(t[2], &raster),
      ];
      let scan = ScanTriangle::new(scaled);
      self.rasterize_triangle(&mut raster, &scan);
    }

    raster
  }
}

/// Pixel-wise comparison of two equally sized rasters, skipping either
/// side's no-data. Returns the absolute-difference raster plus mean,
/// standard deviation (Welford) and maximum absolute error. A 2-pixel
/// border is ignored.
pub fn measure_error(r1: &RasterDouble, r2: &RasterDouble) -> Option<(RasterDouble, ErrorStats)> {
  let w = r1.width();
  let h = r1.height();

  if h != r2.height() || w != r2.width() || r1.empty() || r2.empty() {
    return None;
  }

  let mut error_map = RasterDouble::with_size(w, h);
  error_map.set_no_data_value(RASTERIZE_NO_DATA);
  error_map.set_all(RASTERIZE_NO_DATA);

  let mut m_sum = 0.0f64;
  let mut s_sum = 0.0f64;
  let mut sum = 0.0f64;
  let mut count = 0u64;
  let mut max_abs_error = 0.0f64;

  for r in 2..h.saturating_sub(2) {
    for c in 2..w.saturating_sub(2) {
      let a = r1.value(r, c);
      let b = r2.value(r, c);

      if !r1.is_no_data(a) && !r2.is_no_data(b) {
        let d = a - b;

        // single pass mean/variance, Welford's method
        let old_m = m_sum;
        m_sum += (d - m_sum) / (count + 1) as f64;
        s_sum += (d - m_sum) * (d - old_m);

        sum += d;

        let d_abs = d.abs();
        if d_abs > max_abs_error {
          max_abs_error = d_abs;
        }

        *error_map.value_mut(r, c) = d_abs;
        count += 1;
      }
    }
  }

  let mut stats = ErrorStats {
    max_abs_error,
    ..Default::default()
  };
  if count > 0 {
    stats.std_dev = (s_sum / count as f64).sqrt();
    stats.mean = sum / count as f64;
  }

  Some((error_map, stats))
}

#[cfg(test)]
#[path = "mesh_to_raster_test.rs"]
mod mesh_to_raster_test;
