//! Codec error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum CodecError {
  /// The Mercator→ECEF transform for the tile center could not be
  /// constructed.
  #[error("conversion of tile center to ECEF coordinate system unavailable")]
  ProjectionUnavailable,

  /// Quantization input out of range, unencodable mesh, or a non-finite
  /// dequantization bounding box.
  #[error("encoding error: {0}")]
  Encoding(String),

  /// Short read/write or unexpected end of stream; carries the positions
  /// collected by the error tracker.
  #[error("i/o error: {0}")]
  Io(String),
}
