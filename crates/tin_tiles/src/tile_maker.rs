//! Slice a meshed region into Web-Mercator tiles.
//!
//! For every tile the maker prefilters triangles by bounding box against
//! quarter-tile-buffered tile bounds, rescales them into the unit cube,
//! clips against the unit square, and hands the surviving submesh to a
//! [`MeshWriter`](crate::writer::MeshWriter) together with the world-space
//! z-range needed for dequantization.

use std::path::Path;

use glam::DVec3;

use tin_mesh::clip::clip_triangles_to_unit_quadrant;
use tin_mesh::{BBox2D, BBox3D, Mesh, Triangle};

use crate::error::TileError;
use crate::mercator::MercatorProjection;
use crate::writer::MeshWriter;

fn triangle_could_be_in_tile(t: &Triangle, tile_bounds: &BBox2D) -> bool {
  BBox2D::from_triangle(t).intersects(tile_bounds, 0.0)
}

#[derive(Default)]
pub struct TileMaker {
  mesh: Mesh,
}

impl TileMaker {
  pub fn new() -> Self {
    TileMaker::default()
  }

  pub fn load_mesh(&mut self, mesh: Mesh) {
    self.mesh = mesh;
  }

  /// Cut out tile (tx, ty) at `zoom` and write it through `mesh_writer`.
  /// Empty tiles are skipped silently.
  pub fn dump_tile(
    &mut self,
    tx: i32,
    ty: i32,
    zoom: i32,
    path: &Path,
    mesh_writer: &dyn MeshWriter,
  ) -> Result<(), TileError> {
    let projection = MercatorProjection::default();

    let tile_bounds = projection.tile_bounds(tx, ty, zoom);
    let buffer = tile_bounds.width() / 4.0;
    let mut tile_bounds_with_buffer = tile_bounds;
    tile_bounds_with_buffer.grow(buffer);

    self.mesh.generate_triangles();

    let mut triangles_in_tile: Vec<Triangle> = self
      .mesh
      .triangles()
      .iter()
      .filter(|t| triangle_could_be_in_tile(t, &tile_bounds_with_buffer))
      .copied()
      .collect();

    tracing::debug!(
      "before clipping: {} triangles in tile {}/{}/{}",
      triangles_in_tile.len(),
      zoom,
      tx,
      ty
    );

    // z-range of the tile from the candidate triangles
    let mut tile_space_bbox = BBox3D::new();
    tile_space_bbox.min.x = tile_bounds.min.x;
    tile_space_bbox.min.y = tile_bounds.min.y;
    tile_space_bbox.max.x = tile_bounds.max.x;
    tile_space_bbox.max.y = tile_bounds.max.y;

    for t in &triangles_in_tile {
      for v in t {
        tile_space_bbox.min.z = tile_space_bbox.min.z.min(v.z);
        tile_space_bbox.max.z = tile_space_bbox.max.z.max(v.z);
      }
    }

    // rescale into the unit cube; a flat tile collapses z onto 0
    let tile_origin = tile_bounds.min;
    let inv_scale_x = 1.0 / tile_bounds.width();
    let inv_scale_y = 1.0 / tile_bounds.height();
    let z_extent = tile_space_bbox.max.z - tile_space_bbox.min.z;
    let inv_scale_z = if z_extent > 0.0 { 1.0 / z_extent } else { 0.0 };

    for t in &mut triangles_in_tile {
      for v in t.iter_mut() {
        *v = DVec3::new(
          (v.x - tile_origin.x) * inv_scale_x,
          (v.y - tile_origin.y) * inv_scale_y,
          (v.z - tile_space_bbox.min.z) * inv_scale_z,
        );
      }
    }

    clip_triangles_to_unit_quadrant(&mut triangles_in_tile);

    tracing::debug!(
      "after clipping: {} triangles in tile {}/{}/{}",
      triangles_in_tile.len(),
      zoom,
      tx,
      ty
    );

    if triangles_in_tile.is_empty() {
      // ignore empty meshes
      return Ok(());
    }

    let mut tile_mesh = Mesh::from_triangles(triangles_in_tile);
    tile_mesh.generate_decomposed();

    mesh_writer.write_mesh_to_file(path, &mut tile_mesh, &tile_space_bbox)
  }
}

#[cfg(test)]
#[path = "tile_maker_test.rs"]
mod tile_maker_test;
