//! Web-Mercator (EPSG:3857) tile math.
//!
//! The projection maps the earth onto a square of side 2·πR meters; a
//! tile holds 256 logical pixels and zoom z splits the square into 2^z
//! tiles per axis.

use glam::DVec2;
use tin_mesh::BBox2D;

pub const EARTH_RADIUS: f64 = 6378137.0;
pub const HALF_CIRCUMFERENCE: f64 = std::f64::consts::PI * EARTH_RADIUS;

#[derive(Clone, Copy, Debug)]
pub struct MercatorProjection {
  tile_size: u32,
  initial_resolution: f64,
}

impl Default for MercatorProjection {
  fn default() -> Self {
    Self::new(256)
  }
}

impl MercatorProjection {
  pub fn new(tile_size: u32) -> Self {
    MercatorProjection {
      tile_size,
      initial_resolution: 2.0 * HALF_CIRCUMFERENCE / tile_size as f64,
    }
  }

  pub fn tile_size(&self) -> u32 {
    self.tile_size
  }

  /// Side length of one tile in projected meters at `zoom`.
  pub fn tile_size_in_meters(&self, zoom: i32) -> f64 {
    2.0 * HALF_CIRCUMFERENCE / (1u64 << zoom) as f64
  }

  /// Meters per pixel at `zoom`.
  pub fn resolution(&self, zoom: i32) -> f64 {
    self.initial_resolution / (1u64 << zoom) as f64
  }

  /// WGS84 lon/lat degrees to projected meters.
  pub fn lon_lat_to_meters(&self, lon_lat: DVec2) -> DVec2 {
    let mx = lon_lat.x * HALF_CIRCUMFERENCE / 180.0;
    let my = ((90.0 + lon_lat.y) * std::f64::consts::PI / 360.0).tan().ln()
      / (std::f64::consts::PI / 180.0);
    DVec2::new(mx, my * HALF_CIRCUMFERENCE / 180.0)
  }

  /// Projected meters to WGS84 lon/lat degrees.
  pub fn meters_to_lon_lat(&self, meters: DVec2) -> DVec2 {
    let lon = meters.x / HALF_CIRCUMFERENCE * 180.0;
    let lat_m = meters.y / HALF_CIRCUMFERENCE * 180.0;
    let lat = 180.0 / std::f64::consts::PI
      * (2.0 * (lat_m * std::f64::consts::PI / 180.0).exp().atan() - std::f64::consts::PI / 2.0);
    DVec2::new(lon, lat)
  }

  /// Global pixel coordinates at `zoom` to projected meters.
  pub fn pixels_to_meters(&self, pixels: DVec2, zoom: i32) -> DVec2 {
    let res = self.resolution(zoom);
    DVec2::new(
      pixels.x * res - HALF_CIRCUMFERENCE,
      pixels.y * res - HALF_CIRCUMFERENCE,
    )
  }

  /// Projected meters to global pixel coordinates at `zoom`.
  pub fn meters_to_pixels(&self, meters: DVec2, zoom: i32) -> DVec2 {
    let res = self.resolution(zoom);
    DVec2::new(
      (meters.x + HALF_CIRCUMFERENCE) / res,
      (meters.y + HALF_CIRCUMFERENCE) / res,
    )
  }

  /// Tile indices covering a global pixel position. Pixels exactly on a
  /// tile boundary belong to the tile below/left of it.
  pub fn pixels_to_tile_xy(&self, pixels: DVec2) -> (i32, i32) {
    let tx = ((pixels.x / self.tile_size as f64).ceil() as i64 - 1).max(0) as i32;
    let ty = ((pixels.y / self.tile_size as f64).ceil() as i64 - 1).max(0) as i32;
    (tx, ty)
  }

  pub fn meters_to_tile_xy(&self, meters: DVec2, zoom: i32) -> (i32, i32) {
    self.pixels_to_tile_xy(self.meters_to_pixels(meters, zoom))
  }

  /// Bounds of tile (tx, ty) in projected meters.
  pub fn tile_bounds(&self, tx: i32, ty: i32, zoom: i32) -> BBox2D {
    let ts = self.tile_size as f64;
    let min = self.pixels_to_meters(DVec2::new(tx as f64 * ts, ty as f64 * ts), zoom);
    let max = self.pixels_to_meters(
      DVec2::new((tx + 1) as f64 * ts, (ty + 1) as f64 * ts),
      zoom,
    );
    BBox2D::from_corners(min, max)
  }
}

#[cfg(test)]
#[path = "mercator_test.rs"]
mod mercator_test;
