//! Zoom estimation and per-zoom raster overviews.
//!
//! The producer walks from the maximum zoom down to the minimum, handing
//! out a mean-downsampled copy of the base raster for each level.

use tin_mesh::{raster_tools, RasterDouble};

use crate::mercator::EARTH_RADIUS;

/// The raster must cover at least this many pixels per side at the
/// coarsest useful zoom.
const MINIMAL_RASTER_SIZE: usize = 128;

pub struct RasterOverview {
  pub zoom_level: i32,
  pub resolution: f64,
  pub raster: RasterDouble,
}

pub struct RasterOverviews {
  base_raster: RasterDouble,
  min_zoom: i32,
  max_zoom: i32,
  estimated_max_zoom: i32,
  current_zoom: i32,
}

impl RasterOverviews {
  /// Clamp the requested zoom range into what the raster can support and
  /// position the producer at the maximum zoom.
  pub fn new(base_raster: RasterDouble, min_zoom: i32, max_zoom: i32) -> Self {
    let estimated_max_zoom = Self::guess_max_zoom_level(base_raster.cell_size().abs());
    let estimated_min_zoom = Self::guess_min_zoom_level(&base_raster, estimated_max_zoom);

    let mut min_zoom = min_zoom.max(estimated_min_zoom);
    let mut max_zoom = max_zoom.max(0).min(estimated_max_zoom);
    if max_zoom < min_zoom {
      std::mem::swap(&mut min_zoom, &mut max_zoom);
    }

    tracing::debug!(
      "zoom range [{min_zoom}, {max_zoom}] (estimated [{estimated_min_zoom}, {estimated_max_zoom}])"
    );

    RasterOverviews {
      base_raster,
      min_zoom,
      max_zoom,
      estimated_max_zoom,
      current_zoom: max_zoom,
    }
  }

  pub fn zoom_range(&self) -> (i32, i32) {
    (self.min_zoom, self.max_zoom)
  }

  /// Maximal zoom at which one raster pixel still carries information:
  /// how often the raster resolution fits by factors of two into a pixel
  /// at zoom 0.
  fn guess_max_zoom_level(resolution: f64) -> i32 {
    let pixel_size_z0 = EARTH_RADIUS * 2.0 * std::f64::consts::PI / MINIMAL_RASTER_SIZE as f64;
    (pixel_size_z0 / resolution).log2().round() as i32
  }

  /// Coarsest zoom at which the raster still covers a minimally useful
  /// pixel count on its shorter side.
  fn guess_min_zoom_level(raster: &RasterDouble, max_zoom_level: i32) -> i32 {
    let num_pixels_at_max_zoom = (MINIMAL_RASTER_SIZE as f64) * (1u64 << max_zoom_level) as f64;

    let zoom_x = (num_pixels_at_max_zoom / raster.width() as f64).log2().floor() as i32;
    let zoom_y = (num_pixels_at_max_zoom / raster.height() as f64)
      .log2()
      .floor() as i32;

    zoom_x.min(zoom_y).max(0)
  }

  /// Produce the next overview, finest zoom first. `None` once the zoom
  /// range is exhausted.
  pub fn next(&mut self) -> Option<RasterOverview> {
    if self.current_zoom < self.min_zoom {
      return None;
    }

    let window_size = 1usize << (self.estimated_max_zoom - self.current_zoom).max(0);

    let output_raster = if window_size == 1 {
      self.base_raster.clone()
    } else {
      raster_tools::integer_downsample_mean(&self.base_raster, window_size)
    };

    let overview = RasterOverview {
      zoom_level: self.current_zoom,
      resolution: output_raster.cell_size(),
      raster: output_raster,
    };

    tracing::debug!(
      "generated overview at zoom {}, window size {}",
      self.current_zoom,
      window_size
    );

    self.current_zoom -= 1;
    Some(overview)
  }
}

#[cfg(test)]
#[path = "overviews_test.rs"]
mod overviews_test;
