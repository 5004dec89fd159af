//! Error taxonomy of the meshing core.
//!
//! Only conditions the caller can act on become errors. Degenerate
//! geometry encountered inside the refinement loop (collinear seeds,
//! NaN propagation) short-circuits to an empty mesh instead of aborting.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum MeshError {
  /// Unusable input: empty raster, no valid samples, non-positive error
  /// bound, zero step width.
  #[error("invalid input: {0}")]
  InvalidInput(String),

  /// A geometric construction collapsed (collinear seed points, zero
  /// denominator) and no mesh could be produced.
  #[error("degenerate geometry: {0}")]
  DegenerateGeometry(String),
}
