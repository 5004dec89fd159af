//! Analytic EPSG:3857 → EPSG:4978 (ECEF) conversion.
//!
//! The codec needs the tile center in Earth-centered fixed coordinates
//! for its header. The projected point is unrolled to geodetic lon/lat on
//! the sphere and then converted to geocentric Cartesian on the WGS84
//! ellipsoid.

use tin_codec::EcefProjector;
use tin_mesh::Vertex;

use crate::mercator::EARTH_RADIUS;

const WGS84_A: f64 = 6378137.0;
const WGS84_F: f64 = 1.0 / 298.257223563;

/// Mercator-meters → ECEF projector for tile centers.
#[derive(Clone, Copy, Debug, Default)]
pub struct WebMercatorEcef;

impl WebMercatorEcef {
  /// Geodetic (lon, lat in radians, height in meters) to geocentric.
  fn geodetic_to_ecef(lon: f64, lat: f64, height: f64) -> Vertex {
    let e2 = WGS84_F * (2.0 - WGS84_F);
    let sin_lat = lat.sin();
    let cos_lat = lat.cos();

    // prime vertical radius of curvature
    let n = WGS84_A / (1.0 - e2 * sin_lat * sin_lat).sqrt();

    Vertex::new(
      (n + height) * cos_lat * lon.cos(),
      (n + height) * cos_lat * lon.sin(),
      (n * (1.0 - e2) + height) * sin_lat,
    )
  }
}

impl EcefProjector for WebMercatorEcef {
  fn to_ecef(&self, point: Vertex) -> Option<Vertex> {
    if !point.is_finite() {
      return None;
    }

    let lon = point.x / EARTH_RADIUS;
    let lat = 2.0 * (point.y / EARTH_RADIUS).exp().atan() - std::f64::consts::PI / 2.0;

    Some(Self::geodetic_to_ecef(lon, lat, point.z))
  }
}

#[cfg(test)]
#[path = "ecef_test.rs"]
mod ecef_test;
