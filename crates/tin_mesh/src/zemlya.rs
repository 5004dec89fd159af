//! Zemlya hierarchical refinement meshing.
//!
//! Zemlya runs Terra's greedy loop once per resolution level of a
//! mip-style pyramid. At coarse levels candidates are scored against
//! smoothed averages, so topologically important features are picked
//! first; finer levels then fill in local detail. On natural terrain this
//! yields sparser meshes than plain Terra at matched error.

use glam::{DVec2, DVec3};

use crate::delaunay::DelaunayMesh;
use crate::error::MeshError;
use crate::geometry::ccw;
use crate::mesh::Mesh;
use crate::raster::{Raster, RasterDouble};
use crate::raster_tools;
use crate::terra::{is_no_data, scan_triangle, CandidateList, ScanContext};

fn average_of(d1: f64, d2: f64, d3: f64, d4: f64, no_data_value: f64) -> f64 {
  let mut count = 0;
  let mut sum = 0.0;

  for d in [d1, d2, d3, d4] {
    if is_no_data(d, no_data_value) {
      continue;
    }
    count += 1;
    sum += d;
  }

  if count > 0 {
    sum / count as f64
  } else {
    f64::NAN
  }
}

pub struct ZemlyaMesh {
  dm: DelaunayMesh,
  raster: RasterDouble,
  sample: RasterDouble,
  insert: RasterDouble,
  result: RasterDouble,
  used: Raster<u8>,
  token: Raster<i32>,
  candidates: CandidateList,
  counter: i32,
  max_error: f64,
  max_level: i32,
}

impl ZemlyaMesh {
  pub fn new(raster: RasterDouble) -> Self {
    ZemlyaMesh {
      dm: DelaunayMesh::new(),
      raster,
      sample: RasterDouble::new(),
      insert: RasterDouble::new(),
      result: RasterDouble::new(),
      used: Raster::new(),
      token: Raster::new(),
      candidates: CandidateList::new(),
      counter: 0,
      max_error: 0.0,
      max_level: 0,
    }
  }

  pub fn into_raster(self) -> RasterDouble {
    self.raster
  }

  fn repair_point(&mut self, px: usize, py: usize) {
    let z = raster_tools::sample_nearest_valid_avg(&self.raster, py, px, 1);
    if is_no_data(z, self.raster.no_data_value()) {
      *self.raster.value_mut(py, px) = 0.0;
    } else {
      tracing::debug!("fill missing point: ({}, {}, {})", px, py, z);
      *self.raster.value_mut(py, px) = z;
    }
  }

  /// Build the averaged companion raster: at the finest step 2×2 means of
  /// the source, deeper steps 2×2 means of the previous step's centers.
  fn build_sample_pyramid(&mut self) {
    let w = self.raster.width();
    let h = self.raster.height();
    let ndv = self.raster.no_data_value();

    self.sample.allocate(w, h);
    self.sample.set_all(f64::NAN);

    for level in (1..self.max_level).rev() {
      let step = self.max_level - level;
      let stride = 1usize << step;

      for y in (0..h).step_by(stride) {
        for x in (0..w).step_by(stride) {
          if step == 1 {
            let v1 = self.raster.value(y, x);
            let v2 = if x + 1 < w {
              self.raster.value(y, x + 1)
            } else {
              f64::NAN
            };
            let v3 = if y + 1 < h {
              self.raster.value(y + 1, x)
            } else {
              f64::NAN
            };
            let v4 = if y + 1 < h && x + 1 < w {
              self.raster.value(y + 1, x + 1)
            } else {
              f64::NAN
            };

            if y + 1 < h && x + 1 < w {
              *self.sample.value_mut(y + 1, x + 1) = average_of(v1, v2, v3, v4, ndv);
            }
          } else {
            let co = 1usize << (step - 1);
            let d = 1usize << (step - 2);

            let fetch = |yy: usize, dy: i64, xx: usize, dx: i64| -> f64 {
              let r = yy as i64 + dy;
              let c = xx as i64 + dx;
              if r >= 0 && (r as usize) < h && c >= 0 && (c as usize) < w {
                self.sample.value(r as usize, c as usize)
              } else {
                f64::NAN
              }
            };

            let v1 = fetch(y, (co - d) as i64, x, (co - d) as i64);
            let v2 = fetch(y, (co - d) as i64, x, (co + d) as i64);
            let v3 = fetch(y, (co + d) as i64, x, (co - d) as i64);
            let v4 = fetch(y, (co + d) as i64, x, (co + d) as i64);

            if y + co < h && x + co < w {
              *self.sample.value_mut(y + co, x + co) = average_of(v1, v2, v3, v4, ndv);
            }
          }
        }
      }
    }
  }

  /// Refresh the insert layer for `level`: shrink the commanding area of
  /// already-inserted points, then copy in this level's new candidates.
  fn update_insert_layer(&mut self, level: i32) {
    let w = self.raster.width();
    let h = self.raster.height();
    let ndv = self.raster.no_data_value();

    if level >= 5 && level <= self.max_level - 1 {
      let step = self.max_level - level;
      let stride = 1usize << step;
      let co = 1usize << (step - 1);

      // points from previous levels switch to raw raster values to
      // compensate the half-pixel offset of the averages
      for y in 0..h {
        for x in 0..w {
          if is_no_data(self.insert.value(y, x), ndv) {
            continue;
          }
          *self.insert.value_mut(y, x) = self.raster.value(y, x);
        }
      }

      for y in (0..h).step_by(stride) {
        for x in (0..w).step_by(stride) {
          if y + co < h && x + co < w {
            *self.insert.value_mut(y + co, x + co) = self.raster.value(y + co, x + co);
          }
        }
      }
    } else if level < self.max_level {
      let step = self.max_level - level;
      let stride = 1usize << step;
      let co = 1usize << (step - 1);

      if step >= 3 {
        let d = 1i64 << (step - 3);

        for y in 0..h {
          for x in 0..w {
            if is_no_data(self.insert.value(y, x), ndv) {
              continue;
            }

            let fetch = |dy: i64, dx: i64| -> f64 {
              let r = y as i64 + dy;
              let c = x as i64 + dx;
              if r >= 0 && (r as usize) < h && c >= 0 && (c as usize) < w {
                self.sample.value(r as usize, c as usize)
              } else {
                f64::NAN
              }
            };

            let avg = average_of(
              fetch(-d, -d),
              fetch(-d, d),
              fetch(d, -d),
              fetch(d, d),
              ndv,
            );
            if is_no_data(avg, ndv) {
              continue;
            }
            *self.insert.value_mut(y, x) = avg;
          }
        }
      }

      for y in (0..h).step_by(stride) {
        for x in (0..w).step_by(stride) {
          if y + co < h && x + co < w {
            *self.insert.value_mut(y + co, x + co) = self.sample.value(y + co, x + co);
          }
        }
      }
    }
    // at the final level the scan samples the raster directly
  }

  /// Run the per-level refinement. `max_iterations` caps insertions per
  /// level (`0` disables the cap).
  pub fn greedy_insert(&mut self, max_error: f64, max_iterations: usize) {
    self.max_error = max_error;
    self.counter = 0;
    let w = self.raster.width();
    let h = self.raster.height();
    self.max_level = (w.max(h) as f64).log2().ceil() as i32;

    tracing::info!("starting greedy insertion with raster width {w}, height {h}");

    self.build_sample_pyramid();

    self.repair_point(0, 0);
    self.repair_point(0, h - 1);
    self.repair_point(w - 1, h - 1);
    self.repair_point(w - 1, 0);

    self.result.allocate(w, h);
    self.result.set_all(f64::NAN);
    *self.result.value_mut(0, 0) = self.raster.value(0, 0);
    *self.result.value_mut(h - 1, 0) = self.raster.value(h - 1, 0);
    *self.result.value_mut(h - 1, w - 1) = self.raster.value(h - 1, w - 1);
    *self.result.value_mut(0, w - 1) = self.raster.value(0, w - 1);

    self.insert.allocate(w, h);
    self.insert.set_all(f64::NAN);

    self.used.allocate(w, h);
    self.token.allocate(w, h);
    self.token.set_all(0);

    self.dm.init_mesh(
      DVec2::new(0.0, 0.0),
      DVec2::new(0.0, (h - 1) as f64),
      DVec2::new((w - 1) as f64, (h - 1) as f64),
      DVec2::new((w - 1) as f64, 0.0),
    );

    let ndv = self.raster.no_data_value();

    for level in 1..=self.max_level {
      tracing::debug!("starting level {level}");

      self.used.set_all(0);
      self.update_insert_layer(level);

      let at_final_level = level == self.max_level;

      {
        let Self {
          dm,
          raster,
          insert,
          result,
          used,
          token,
          candidates,
          counter,
          ..
        } = self;

        let sample_source: &RasterDouble = if at_final_level { raster } else { insert };

        for t in dm.faces() {
          let mut ctx = ScanContext {
            plane_source: &*result,
            sample_source,
            no_data_value: ndv,
            used: &*used,
            token: &mut *token,
            counter: &mut *counter,
            candidates: &mut *candidates,
          };
          scan_triangle(dm.sub(), t, &mut ctx);
        }
      }

      let mut iterations = 0usize;
      loop {
        if max_iterations != 0 && iterations >= max_iterations {
          break;
        }
        let Some(candidate) = self.candidates.grab_greatest() else {
          break;
        };

        if candidate.importance < self.max_error {
          continue;
        }
        if self.token.value(candidate.y as usize, candidate.x as usize) != candidate.token {
          continue;
        }

        *self
          .result
          .value_mut(candidate.y as usize, candidate.x as usize) = candidate.z;
        *self
          .used
          .value_mut(candidate.y as usize, candidate.x as usize) = 1;

        let Self {
          dm,
          raster,
          insert,
          result,
          used,
          token,
          candidates,
          counter,
          ..
        } = self;

        let sample_source: &RasterDouble = if at_final_level { raster } else { insert };

        dm.insert(
          DVec2::new(candidate.x as f64, candidate.y as f64),
          candidate.triangle,
          &mut |sub, t| {
            let mut ctx = ScanContext {
              plane_source: &*result,
              sample_source,
              no_data_value: ndv,
              used: &*used,
              token: &mut *token,
              counter: &mut *counter,
              candidates: &mut *candidates,
            };
            scan_triangle(sub, t, &mut ctx);
          },
        );

        iterations += 1;
      }
    }

    tracing::info!("finished greedy insertion");
  }

  /// Read the refinement result back out as a world-coordinate mesh.
  /// Every accepted sample (stored in the result layer) becomes a vertex.
  pub fn convert_to_mesh(&self) -> Mesh {
    let w = self.raster.width();
    let h = self.raster.height();
    let ndv = self.raster.no_data_value();

    let mut vertices = Vec::new();
    let mut vertex_id: Raster<i32> = Raster::with_size(w, h);
    vertex_id.set_all(0);

    let mut index = 0i32;
    for y in 0..h {
      for x in 0..w {
        let z = self.result.value(y, x);
        if !is_no_data(z, ndv) {
          vertices.push(DVec3::new(self.raster.col2x(x), self.raster.row2y(y), z));
          *vertex_id.value_mut(y, x) = index;
          index += 1;
        }
      }
    }

    let mut faces = Vec::new();
    for t in self.dm.faces() {
      let [p1, p2, p3] = self.dm.sub().face_points(t);

      let id = |p: DVec2| vertex_id.value(p.y as usize, p.x as usize) as usize;

      let f = if !ccw(p1, p2, p3) {
        [id(p1), id(p2), id(p3)]
      } else {
        [id(p3), id(p2), id(p1)]
      };
      faces.push(f);
    }

    Mesh::from_decomposed(vertices, faces)
  }
}

/// Mesh a raster with the Zemlya method.
pub fn generate_tin_zemlya(raster: RasterDouble, max_error: f64) -> Result<Mesh, MeshError> {
  if raster.width() < 2 || raster.height() < 2 {
    return Err(MeshError::InvalidInput(
      "raster must be at least 2x2".into(),
    ));
  }
  if !(max_error > 0.0) {
    return Err(MeshError::InvalidInput("max-error must be > 0".into()));
  }
  if raster_tools::find_minmax(&raster).is_none() {
    return Err(MeshError::InvalidInput(
      "raster holds no valid samples".into(),
    ));
  }

  let mut zemlya = ZemlyaMesh::new(raster);
  zemlya.greedy_insert(max_error, 0);
  Ok(zemlya.convert_to_mesh())
}

#[cfg(test)]
#[path = "zemlya_test.rs"]
mod zemlya_test;
