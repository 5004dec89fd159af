//! Terra greedy refinement meshing.
//!
//! Starting from the two triangles of the raster bounding rectangle, the
//! engine repeatedly inserts the raster sample with the largest vertical
//! error until every sample is approximated within `max_error`. Each
//! triangle is scan-converted once per reshape; the per-triangle worst
//! sample goes onto a max-heap, and a per-pixel token makes superseded
//! heap entries detectable at pop time instead of requiring decrease-key.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use glam::{DVec2, DVec3};

use crate::delaunay::DelaunayMesh;
use crate::error::MeshError;
use crate::geometry::{ccw, Plane};
use crate::mesh::Mesh;
use crate::quadedge::{FaceHandle, Subdivision};
use crate::raster::{Raster, RasterDouble};
use crate::raster_tools;

/// The worst-approximated sample found inside one triangle.
#[derive(Clone, Copy, Debug)]
pub struct Candidate {
  pub x: i32,
  pub y: i32,
  pub z: f64,
  pub importance: f64,
  pub token: i32,
  pub triangle: FaceHandle,
}

impl Candidate {
  fn start(token: i32, triangle: FaceHandle) -> Self {
    Candidate {
      x: 0,
      y: 0,
      z: 0.0,
      importance: -f64::MAX,
      token,
      triangle,
    }
  }

  /// Keep the strictly greater importance; the first seen wins ties.
  #[inline]
  pub fn consider(&mut self, sx: i32, sy: i32, sz: f64, importance: f64) {
    if importance > self.importance {
      self.x = sx;
      self.y = sy;
      self.z = sz;
      self.importance = importance;
    }
  }
}

// Heap order: importance first, then token, so that among equal errors the
// most recently scanned candidate wins and pop order is deterministic.
impl Ord for Candidate {
  fn cmp(&self, other: &Self) -> Ordering {
    self
      .importance
      .total_cmp(&other.importance)
      .then_with(|| self.token.cmp(&other.token))
  }
}

impl PartialOrd for Candidate {
  fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
    Some(self.cmp(other))
  }
}

impl PartialEq for Candidate {
  fn eq(&self, other: &Self) -> bool {
    self.cmp(other) == Ordering::Equal
  }
}

impl Eq for Candidate {}

/// Max-heap of candidates ordered by importance.
#[derive(Default)]
pub struct CandidateList {
  heap: BinaryHeap<Candidate>,
}

impl CandidateList {
  pub fn new() -> Self {
    CandidateList::default()
  }

  pub fn push(&mut self, candidate: Candidate) {
    self.heap.push(candidate);
  }

  /// Remove and return the greatest-importance candidate.
  pub fn grab_greatest(&mut self) -> Option<Candidate> {
    self.heap.pop()
  }

  pub fn len(&self) -> usize {
    self.heap.len()
  }

  pub fn is_empty(&self) -> bool {
    self.heap.is_empty()
  }
}

/// Everything a triangle scan needs besides the subdivision itself.
///
/// Terra fits planes against the raster it samples from; Zemlya fits
/// against its result layer while sampling a pyramid level.
pub(crate) struct ScanContext<'a> {
  pub plane_source: &'a RasterDouble,
  pub sample_source: &'a RasterDouble,
  pub no_data_value: f64,
  pub used: &'a Raster<u8>,
  pub token: &'a mut Raster<i32>,
  pub counter: &'a mut i32,
  pub candidates: &'a mut CandidateList,
}

#[inline]
pub(crate) fn is_no_data(value: f64, no_data_value: f64) -> bool {
  value.is_nan() || value == no_data_value
}

fn compute_plane(sub: &Subdivision, t: FaceHandle, source: &RasterDouble) -> Plane {
  let [p1, p2, p3] = sub.face_points(t);
  let v1 = DVec3::new(p1.x, p1.y, source.value(p1.y as usize, p1.x as usize));
  let v2 = DVec3::new(p2.x, p2.y, source.value(p2.y as usize, p2.x as usize));
  let v3 = DVec3::new(p3.x, p3.y, source.value(p3.y as usize, p3.x as usize));
  Plane::from_points(v1, v2, v3)
}

fn scan_triangle_line(
  plane: &Plane,
  y: i32,
  x1: f64,
  x2: f64,
  candidate: &mut Candidate,
  ctx: &mut ScanContext<'_>,
) {
  let startx = x1.min(x2).ceil() as i32;
  let endx = x1.max(x2).floor() as i32;

  if startx > endx {
    return;
  }

  let mut z0 = plane.eval(startx as f64, y as f64);
  let dz = plane.a;

  for x in startx..=endx {
    if ctx.used.value(y as usize, x as usize) == 0 {
      let z = ctx.sample_source.value(y as usize, x as usize);
      if !is_no_data(z, ctx.no_data_value) {
        let diff = (z - z0).abs();
        candidate.consider(x, y, z, diff);
      }
    }
    z0 += dz;
  }
}

/// Rasterize triangle `t` in horizontal spans and queue its worst sample.
///
/// Vertices sit on integer raster coordinates, so the spans run over the
/// integer scan lines between the y-sorted corners, with the x extents
/// interpolated along the two active edges.
pub(crate) fn scan_triangle(sub: &Subdivision, t: FaceHandle, ctx: &mut ScanContext<'_>) {
  let plane = compute_plane(sub, t, ctx.plane_source);

  let mut by_y = sub.face_points(t);
  if by_y[0].y > by_y[1].y {
    by_y.swap(0, 1);
  }
  if by_y[1].y > by_y[2].y {
    by_y.swap(1, 2);
  }
  if by_y[0].y > by_y[1].y {
    by_y.swap(0, 1);
  }

  let v0 = by_y[0];
  let v1 = by_y[1];
  let v2 = by_y[2];

  let mut candidate = Candidate::start(*ctx.counter, t);
  *ctx.counter += 1;

  let dx2 = (v2.x - v0.x) / (v2.y - v0.y);

  if v1.y != v0.y {
    let dx1 = (v1.x - v0.x) / (v1.y - v0.y);

    let mut x1 = v0.x;
    let mut x2 = v0.x;

    let starty = v0.y as i32;
    let endy = v1.y as i32;

    for y in starty..endy {
      scan_triangle_line(&plane, y, x1, x2, &mut candidate, ctx);
      x1 += dx1;
      x2 += dx2;
    }
  }

  if v2.y != v1.y {
    let dx1 = (v2.x - v1.x) / (v2.y - v1.y);

    let mut x1 = v1.x;
    let mut x2 = v0.x + dx2 * (v1.y - v0.y);

    let starty = v1.y as i32;
    let endy = v2.y as i32;

    for y in starty..=endy {
      scan_triangle_line(&plane, y, x1, x2, &mut candidate, ctx);
      x1 += dx1;
      x2 += dx2;
    }
  }

  // claim the pixel: the stored token marks this candidate as the latest
  *ctx
    .token
    .value_mut(candidate.y as usize, candidate.x as usize) = candidate.token;

  ctx.candidates.push(candidate);
}

/// Greedy refinement engine over a single raster.
pub struct TerraMesh {
  dm: DelaunayMesh,
  raster: RasterDouble,
  used: Raster<u8>,
  token: Raster<i32>,
  candidates: CandidateList,
  counter: i32,
  max_error: f64,
}

impl TerraMesh {
  pub fn new(raster: RasterDouble) -> Self {
    TerraMesh {
      dm: DelaunayMesh::new(),
      raster,
      used: Raster::new(),
      token: Raster::new(),
      candidates: CandidateList::new(),
      counter: 0,
      max_error: 0.0,
    }
  }

  /// Give the raster back to the caller once meshing is done.
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

  /// Run the refinement until the error bound is met everywhere or the
  /// iteration cap is reached (`max_iterations == 0` means no cap).
  pub fn greedy_insert(&mut self, max_error: f64, max_iterations: usize) {
    self.max_error = max_error;
    self.counter = 0;
    let w = self.raster.width();
    let h = self.raster.height();

    tracing::info!("starting greedy insertion with raster width {w}, height {h}");

    self.used.allocate(w, h);
    self.used.set_all(0);

    // the algorithm cannot proceed with NaN corners
    self.repair_point(0, 0);
    self.repair_point(0, h - 1);
    self.repair_point(w - 1, h - 1);
    self.repair_point(w - 1, 0);

    // two triangles over the height field grid corners
    self.dm.init_mesh(
      DVec2::new(0.0, 0.0),
      DVec2::new(0.0, (h - 1) as f64),
      DVec2::new((w - 1) as f64, (h - 1) as f64),
      DVec2::new((w - 1) as f64, 0.0),
    );

    *self.used.value_mut(0, 0) = 1;
    *self.used.value_mut(h - 1, 0) = 1;
    *self.used.value_mut(h - 1, w - 1) = 1;
    *self.used.value_mut(0, w - 1) = 1;

    self.token.allocate(w, h);
    self.token.set_all(0);

    let ndv = self.raster.no_data_value();

    // seed the queue from every face of the initial mesh
    {
      let Self {
        dm,
        raster,
        used,
        token,
        candidates,
        counter,
        ..
      } = self;

      for t in dm.faces() {
        let mut ctx = ScanContext {
          plane_source: &*raster,
          sample_source: &*raster,
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

      // skip candidates a later scan has overwritten
      if self.token.value(candidate.y as usize, candidate.x as usize) != candidate.token {
        continue;
      }

      *self
        .used
        .value_mut(candidate.y as usize, candidate.x as usize) = 1;

      let Self {
        dm,
        raster,
        used,
        token,
        candidates,
        counter,
        ..
      } = self;

      dm.insert(
        DVec2::new(candidate.x as f64, candidate.y as f64),
        candidate.triangle,
        &mut |sub, t| {
          let mut ctx = ScanContext {
            plane_source: &*raster,
            sample_source: &*raster,
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

    tracing::info!("finished greedy insertion after {iterations} insertions");
  }

  /// Read the refined triangulation back out as a world-coordinate mesh.
  pub fn convert_to_mesh(&self) -> Mesh {
    let w = self.raster.width();
    let h = self.raster.height();

    let mut vertices = Vec::new();
    let mut vertex_id: Raster<i32> = Raster::with_size(w, h);
    vertex_id.set_all(0);

    let mut index = 0i32;
    for y in 0..h {
      for x in 0..w {
        if self.used.value(y, x) == 1 {
          let z = self.raster.value(y, x);
          if is_no_data(z, self.raster.no_data_value()) {
            continue;
          }
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

      // row2y flips the y axis, so CW in raster coordinates becomes CCW
      // in world coordinates
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

/// Mesh a raster with the Terra method.
pub fn generate_tin_terra(raster: RasterDouble, max_error: f64) -> Result<Mesh, MeshError> {
  generate_tin_terra_with_cap(raster, max_error, 0)
}

/// Terra with an iteration cap (`0` disables the cap).
pub fn generate_tin_terra_with_cap(
  raster: RasterDouble,
  max_error: f64,
  max_iterations: usize,
) -> Result<Mesh, MeshError> {
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

  let mut terra = TerraMesh::new(raster);
  terra.greedy_insert(max_error, max_iterations);
  Ok(terra.convert_to_mesh())
}

#[cfg(test)]
#[path = "terra_test.rs"]
mod terra_test;
