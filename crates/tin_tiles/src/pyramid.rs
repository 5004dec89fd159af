//! Partitioning of a raster into meshable tile batches and the per-zoom
//! tile generation loop.
//!
//! At every zoom level the overview raster is split into batches of
//! adjacent tiles. Each batch is cropped out of the raster with a safety
//! buffer, meshed once, and then sliced per tile, so the expensive
//! meshing cost is amortized over neighboring tiles.

use std::path::Path;

use glam::DVec2;

use tin_mesh::{
  generate_tin_dense_quadwalk, generate_tin_terra, generate_tin_zemlya, BBox2D, Mesh,
  RasterDouble,
};

use crate::error::TileError;
use crate::mercator::MercatorProjection;
use crate::overviews::RasterOverviews;
use crate::tile_maker::TileMaker;
use crate::writer::MeshWriter;

/// Meshing algorithm used per batch. The method parameter is the maximum
/// vertical error in meters (Terra/Zemlya) or the sampling step (Dense).
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MeshingMethod {
  Terra,
  Zemlya,
  Dense,
}

impl MeshingMethod {
  fn run(self, raster: RasterDouble, parameter: f64) -> Result<Mesh, TileError> {
    let mesh = match self {
      MeshingMethod::Terra => generate_tin_terra(raster, parameter)?,
      MeshingMethod::Zemlya => generate_tin_zemlya(raster, parameter)?,
      MeshingMethod::Dense => generate_tin_dense_quadwalk(&raster, parameter.max(1.0) as usize)?,
    };
    Ok(mesh)
  }
}

/// A batch of adjacent tiles plus the buffered crop window that covers
/// them.
#[derive(Clone, Debug)]
pub struct Partition {
  pub bbox: BBox2D,
  pub tmin: (i32, i32),
  pub tmax: (i32, i32),
}

/// Split the raster's extent at `zoom` into batches of adjacent tiles.
/// The batch side grows when tiles are small relative to the raster
/// resolution, so one meshing run feeds many tiles.
pub fn create_partitions_for_zoom_level(dem: &RasterDouble, zoom: i32) -> Vec<Partition> {
  let projection = MercatorProjection::default();
  let mut partitions = Vec::new();

  let resolution = dem.cell_size();
  let points_bbox = dem.get_bounding_box();

  let (tminx, tminy) = projection.meters_to_tile_xy(points_bbox.min, zoom);
  let (tmaxx, tmaxy) = projection.meters_to_tile_xy(points_bbox.max, zoom);

  let tile_size = projection.tile_size() as f64;
  let tile_size_in_meters = projection.tile_size_in_meters(zoom);
  let nt = ((resolution * 800.0 / tile_size_in_meters) as i32).max(1);

  let mut tx = tminx;
  while tx <= tmaxx {
    let mut ty = tminy;
    while ty <= tmaxy {
      let bbox_min =
        projection.pixels_to_meters(DVec2::new(tx as f64 * tile_size, ty as f64 * tile_size), zoom);
      let bbox_max = projection.pixels_to_meters(
        DVec2::new((tx + nt) as f64 * tile_size, (ty + nt) as f64 * tile_size),
        zoom,
      );

      let clipped_max = DVec2::new(
        bbox_max.x.min(points_bbox.max.x),
        bbox_max.y.min(points_bbox.max.y),
      );

      let buffer = resolution * 100.0;
      let mut bbox_with_buffer = BBox2D::from_corners(bbox_min, clipped_max);
      bbox_with_buffer.grow(buffer);

      partitions.push(Partition {
        bbox: bbox_with_buffer,
        tmin: (tx, ty),
        tmax: (
          if bbox_max.x > points_bbox.max.x {
            tmaxx
          } else {
            tx + nt - 1
          },
          if bbox_max.y > points_bbox.max.y {
            tmaxy
          } else {
            ty + nt - 1
          },
        ),
      });

      ty += nt;
    }
    tx += nt;
  }

  partitions
}

/// Mesh every partition of one zoom level and write its tiles under
/// `<output_basedir>/<zoom>/<tx>/<ty>.<ext>`.
pub fn create_tiles_for_zoom_level(
  dem: &RasterDouble,
  partitions: &[Partition],
  zoom: i32,
  output_basedir: &Path,
  method: MeshingMethod,
  method_parameter: f64,
  mesh_writer: &dyn MeshWriter,
) -> Result<(), TileError> {
  for part in partitions {
    let bbox = &part.bbox;
    tracing::debug!(
      "partition bbox (world coordinates) [({},{}),({},{})]",
      bbox.min.x,
      bbox.min.y,
      bbox.max.x,
      bbox.max.y
    );

    let mut x1 = dem.x2col(bbox.min.x);
    let mut y1 = dem.y2row(bbox.min.y);
    let mut x2 = dem.x2col(bbox.max.x);
    let mut y2 = dem.y2row(bbox.max.y);

    if x2 < x1 {
      std::mem::swap(&mut x1, &mut x2);
    }
    if y2 < y1 {
      std::mem::swap(&mut y1, &mut y2);
    }

    let raster_tile = dem.crop(x1, y1, x2 - x1, y2 - y1);
    if raster_tile.width() < 2 || raster_tile.height() < 2 {
      tracing::debug!("partition outside the raster, skipping");
      continue;
    }

    let mesh = match method.run(raster_tile, method_parameter) {
      Ok(mesh) => mesh,
      Err(TileError::Mesh(err)) => {
        // a failed batch yields no tiles but does not abort the pyramid
        tracing::warn!("meshing failed for partition: {err}");
        continue;
      }
      Err(err) => return Err(err),
    };

    if mesh.empty() {
      continue;
    }

    let mut tile_maker = TileMaker::new();
    tile_maker.load_mesh(mesh);

    std::fs::create_dir_all(output_basedir.join(zoom.to_string()))?;

    for tx in part.tmin.0..=part.tmax.0 {
      let tile_dir = output_basedir.join(zoom.to_string()).join(tx.to_string());
      std::fs::create_dir_all(&tile_dir)?;

      for ty in part.tmin.1..=part.tmax.1 {
        tracing::info!("creating tile {}/{}/{}", zoom, tx, ty);

        let file_path = tile_dir.join(format!("{}.{}", ty, mesh_writer.file_extension()));
        tile_maker.dump_tile(tx, ty, zoom, &file_path, mesh_writer)?;
      }
    }
  }

  Ok(())
}

/// Full pyramid drive: walk the overviews from the maximum zoom down and
/// emit every zoom level's tiles.
pub fn generate_tile_pyramid(
  dem: RasterDouble,
  min_zoom: i32,
  max_zoom: i32,
  output_basedir: &Path,
  method: MeshingMethod,
  method_parameter: f64,
  mesh_writer: &dyn MeshWriter,
) -> Result<(), TileError> {
  if dem.empty() {
    return Err(TileError::InvalidInput("input raster is empty".into()));
  }

  let mut overviews = RasterOverviews::new(dem, min_zoom, max_zoom);

  while let Some(overview) = overviews.next() {
    tracing::info!(
      "processing zoom level {} ({}x{} raster)",
      overview.zoom_level,
      overview.raster.width(),
      overview.raster.height()
    );

    let partitions = create_partitions_for_zoom_level(&overview.raster, overview.zoom_level);
    create_tiles_for_zoom_level(
      &overview.raster,
      &partitions,
      overview.zoom_level,
      output_basedir,
      method,
      method_parameter,
      mesh_writer,
    )?;
  }

  Ok(())
}

#[cfg(test)]
#[path = "pyramid_test.rs"]
mod pyramid_test;
