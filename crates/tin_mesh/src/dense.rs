//! Dense regular meshing: one vertex per raster sample (or per step-th
//! sample), two triangles per quad. No error-driven simplification; useful
//! as a reference output and for very small rasters.

use glam::DVec3;

use crate::error::MeshError;
use crate::geometry::{Face, Vertex};
use crate::mesh::Mesh;
use crate::raster::RasterDouble;
use crate::raster_tools;

/*
 quad split, ccw order:
 +--+ upper-right
 |\A|
 |B\|
 +--+ lower-right
*/
fn make_quad_faces(this_vx_index: usize, vertices_per_row: usize, faces: &mut Vec<Face>) {
  // face A: lower-right, upper-right, upper-left
  faces.push([
    this_vx_index,
    this_vx_index - vertices_per_row,
    this_vx_index - vertices_per_row - 1,
  ]);

  // face B: lower-right, upper-left, lower-left
  faces.push([
    this_vx_index,
    this_vx_index - vertices_per_row - 1,
    this_vx_index - 1,
  ]);
}

fn sample_z(raster: &RasterDouble, r: usize, c: usize) -> f64 {
  let z = raster.value(r, c);
  if raster.is_no_data(z) {
    raster_tools::sample_nearest_valid_avg(raster, r, c, 1)
  } else {
    z
  }
}

fn make_row(
  raster: &RasterDouble,
  r: usize,
  w: usize,
  step: usize,
  vx_r: usize,
  vertices_per_row: usize,
  vertices: &mut Vec<Vertex>,
  faces: &mut Vec<Face>,
) {
  let y = raster.row2y(r);

  // first column carries no quad
  vertices.push(DVec3::new(raster.col2x(0), y, sample_z(raster, r, 0)));

  for vx_c in 1..vertices_per_row {
    let c = (vx_c * step).min(w - 1);
    vertices.push(DVec3::new(raster.col2x(c), y, sample_z(raster, r, c)));
    let this_vx_index = vx_r * vertices_per_row + vx_c;
    make_quad_faces(this_vx_index, vertices_per_row, faces);
  }
}

/// Walk the raster in a regular grid and emit two faces per quad.
/// Missing samples are imputed from their nearest valid neighborhood.
pub fn generate_tin_dense_quadwalk(
  raster: &RasterDouble,
  step: usize,
) -> Result<Mesh, MeshError> {
  if step == 0 {
    return Err(MeshError::InvalidInput(
      "step width for dense meshing must be at least 1".into(),
    ));
  }

  let h = raster.height();
  let w = raster.width();
  if h < 2 || w < 2 {
    return Err(MeshError::InvalidInput(
      "raster too small, must have at least 2x2 cells".into(),
    ));
  }

  let vertices_per_column = (h - 1) / step + usize::from((h - 1) % step != 0) + 1;
  let vertices_per_row = (w - 1) / step + usize::from((w - 1) % step != 0) + 1;
  tracing::debug!(
    "generating regular mesh with {}x{} vertices",
    vertices_per_row,
    vertices_per_column
  );

  let mut vertices = Vec::with_capacity(vertices_per_row * vertices_per_column);
  let mut faces = Vec::with_capacity((vertices_per_row - 1) * (vertices_per_column - 1) * 2);

  // first row, just vertices
  {
    let y = raster.row2y(0);
    for vx_c in 0..vertices_per_row {
      let c = (vx_c * step).min(w - 1);
      vertices.push(DVec3::new(raster.col2x(c), y, sample_z(raster, 0, c)));
    }
  }

  // every following row, vertices and quads
  for vx_r in 1..vertices_per_column {
    let r = (vx_r * step).min(h - 1);
    make_row(
      raster,
      r,
      w,
      step,
      vx_r,
      vertices_per_row,
      &mut vertices,
      &mut faces,
    );
  }

  Ok(Mesh::from_decomposed(vertices, faces))
}

#[cfg(test)]
#[path = "dense_test.rs"]
mod dense_test;
