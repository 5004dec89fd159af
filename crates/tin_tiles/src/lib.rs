//! tin_tiles - Web-Mercator tile pyramid driver for TIN terrain meshes.
//!
//! Connects the meshing engines to the quantized-mesh codec: rasters are
//! downsampled per zoom level, partitioned into batches of adjacent
//! tiles, meshed once per batch, and sliced tile by tile into the
//! `<zoom>/<tx>/<ty>.terrain` layout expected by 3D globe viewers.

pub mod ecef;
pub mod error;
pub mod mercator;
pub mod overviews;
pub mod pyramid;
pub mod tile_maker;
pub mod writer;

pub use ecef::WebMercatorEcef;
pub use error::TileError;
pub use mercator::MercatorProjection;
pub use overviews::{RasterOverview, RasterOverviews};
pub use pyramid::{
  create_partitions_for_zoom_level, create_tiles_for_zoom_level, generate_tile_pyramid,
  MeshingMethod, Partition,
};
pub use tile_maker::TileMaker;
pub use writer::{MeshWriter, ObjWriter, QuantizedMeshWriter};
