//! Mesh sinks for tile emission: quantized-mesh `.terrain` files
//! (optionally gzip wrapped) and plain OBJ text.

use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;

use flate2::write::GzEncoder;
use flate2::Compression;

use tin_codec::write_mesh_as_qm_with_bbox;
use tin_mesh::{BBox3D, Mesh};

use crate::ecef::WebMercatorEcef;
use crate::error::TileError;

/// Sink for per-tile meshes. The bounding box carries the world-space
/// extents used as dequantization bounds; tile meshes themselves are
/// rescaled to the unit cube.
pub trait MeshWriter {
  fn file_extension(&self) -> &'static str;

  fn write_mesh_to_file(
    &self,
    path: &Path,
    mesh: &mut Mesh,
    bbox: &BBox3D,
  ) -> Result<(), TileError>;
}

/// Writes Cesium quantized-mesh tiles.
pub struct QuantizedMeshWriter {
  /// Wrap the stream in gzip; transparent to the codec.
  pub gzip: bool,
}

impl Default for QuantizedMeshWriter {
  fn default() -> Self {
    QuantizedMeshWriter { gzip: true }
  }
}

impl MeshWriter for QuantizedMeshWriter {
  fn file_extension(&self) -> &'static str {
    "terrain"
  }

  fn write_mesh_to_file(
    &self,
    path: &Path,
    mesh: &mut Mesh,
    bbox: &BBox3D,
  ) -> Result<(), TileError> {
    mesh.generate_triangles();

    let file = File::create(path)?;
    if self.gzip {
      let mut stream = GzEncoder::new(BufWriter::new(file), Compression::default());
      write_mesh_as_qm_with_bbox(&mut stream, mesh, bbox, true, &WebMercatorEcef)?;
      stream.finish()?.flush()?;
    } else {
      let mut stream = BufWriter::new(file);
      write_mesh_as_qm_with_bbox(&mut stream, mesh, bbox, true, &WebMercatorEcef)?;
      stream.flush()?;
    }
    Ok(())
  }
}

/// Writes plain-text Wavefront OBJ meshes (vertex and face lines only).
pub struct ObjWriter;

impl MeshWriter for ObjWriter {
  fn file_extension(&self) -> &'static str {
    "obj"
  }

  fn write_mesh_to_file(
    &self,
    path: &Path,
    mesh: &mut Mesh,
    _bbox: &BBox3D,
  ) -> Result<(), TileError> {
    mesh.generate_decomposed();

    let file = File::create(path)?;
    let mut out = BufWriter::new(file);

    for v in mesh.vertices() {
      writeln!(out, "v {} {} {}", v.x, v.y, v.z)?;
    }
    // OBJ face indices are 1-based
    for f in mesh.faces() {
      writeln!(out, "f {} {} {}", f[0] + 1, f[1] + 1, f[2] + 1)?;
    }

    out.flush()?;
    Ok(())
  }
}

#[cfg(test)]
#[path = "writer_test.rs"]
mod writer_test;
