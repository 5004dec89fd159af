//! Tile pipeline error taxonomy.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum TileError {
  #[error("invalid input: {0}")]
  InvalidInput(String),

  #[error(transparent)]
  Mesh(#[from] tin_mesh::MeshError),

  #[error(transparent)]
  Codec(#[from] tin_codec::CodecError),

  #[error("i/o error: {0}")]
  Io(#[from] std::io::Error),
}
