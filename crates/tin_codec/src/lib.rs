//! tin_codec - quantized-mesh terrain tile codec.
//!
//! Implements the binary "quantized mesh" format streamed by 3D globe
//! viewers: an 88-byte header, zig-zag delta-encoded 15-bit vertex
//! coordinates, high-watermark compressed triangle indices, and the four
//! edge index rings. On top sits a small endian-explicit binary I/O layer
//! whose error tracker records the first and last failure positions
//! instead of aborting mid-stream.

pub mod binary_io;
pub mod error;
pub mod quantized_mesh;

pub use binary_io::{BinaryIo, BinaryIoError, BinaryIoErrorTracker, Endianness};
pub use error::CodecError;
pub use quantized_mesh::{
  load_mesh_from_qm, write_mesh_as_qm, write_mesh_as_qm_with_bbox, EcefProjector,
  QuantizedMeshHeader, QUANTIZED_COORDINATE_SIZE,
};
