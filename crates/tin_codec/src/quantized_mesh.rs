//! Quantized-mesh terrain tile encoder/decoder.
//!
//! Wire layout (all multi-byte integers little-endian):
//!
//! ```text
//! offset 0   header                      88 bytes
//! offset 88  vertexCount                 u32
//!            u[], v[], height[]          u16 × vertexCount each,
//!                                        zig-zag deltas
//!            (pad to 2/4 with 0xCA)
//!            triangleCount               u32
//!            indices                     u16/u32 × 3·triangleCount,
//!                                        high-watermark encoded
//!            west/south/east/northlings  u32 count + indices each
//! ```
//!
//! Vertex coordinates are quantized per axis onto [0, 32767]. Indices use
//! 16 bits when vertexCount ≤ 65536, else 32. The decoder tolerates
//! unknown trailing bytes (extensions) without parsing them.

use std::collections::HashMap;
use std::io::{Read, Write};

use glam::{DVec2, DVec3};
use tin_mesh::{BBox3D, Face, Mesh, Vertex};

use crate::binary_io::{BinaryIo, BinaryIoErrorTracker, Endianness, WireScalar};
use crate::error::CodecError;

/// Maximum quantized coordinate value (15 bit).
pub const QUANTIZED_COORDINATE_SIZE: i32 = 32767;

/// Supplies the projected→ECEF transform for tile centers.
///
/// The codec itself carries no geodesy; encoding fails with
/// [`CodecError::ProjectionUnavailable`] when no transform is available.
pub trait EcefProjector {
  fn to_ecef(&self, point: Vertex) -> Option<Vertex>;
}

/// The 88-byte quantized-mesh tile header.
#[derive(Clone, Copy, Debug, Default)]
pub struct QuantizedMeshHeader {
  /// Tile center in Earth-centered fixed coordinates.
  pub center: DVec3,

  /// Height range of the area covered by this tile, used as the
  /// dequantization bounds for the height axis.
  pub min_height: f32,
  pub max_height: f32,

  /// Bounding sphere in ECEF; the radius doubles as the horizontal
  /// dequantization extent.
  pub bounding_sphere_center: DVec3,
  pub bounding_sphere_radius: f64,

  /// If this point is below the horizon, the entire tile is below the
  /// horizon.
  pub horizon_occlusion: DVec3,
}

// =============================================================================
// Zig-zag and quantization primitives
// =============================================================================

#[inline]
pub fn zig_zag_encode(i: i16) -> u16 {
  (((i as i32) >> 15) ^ ((i as i32) << 1)) as u16
}

#[inline]
pub fn zig_zag_decode(i: u16) -> i16 {
  ((i >> 1) as i16) ^ -((i & 1) as i16)
}

fn scale_coordinate(v: f64) -> i32 {
  (v * QUANTIZED_COORDINATE_SIZE as f64) as i32
}

fn unscale_coordinate(v: i32) -> f64 {
  v as f64 / QUANTIZED_COORDINATE_SIZE as f64
}

fn quantize_coordinate(v: f64, min: f64, max: f64) -> Result<i32, CodecError> {
  if !(v >= min && v <= max) {
    return Err(CodecError::Encoding(format!(
      "quantization input {v} outside [{min}, {max}]"
    )));
  }
  let delta = max - min;
  if delta <= 0.0 {
    // collapsed axis: everything maps onto the lower bound
    return Ok(0);
  }
  Ok(scale_coordinate((v - min) / delta))
}

fn dequantize_coordinate(v: i32, min: f64, max: f64) -> f64 {
  min + unscale_coordinate(v) * (max - min)
}

// =============================================================================
// Encoder
// =============================================================================

fn add_alignment<W: Write>(
  bio: &mut BinaryIo<W>,
  e: &mut BinaryIoErrorTracker,
  alignment: u64,
) {
  let pos = bio.write_pos();
  let pad_size = if pos % alignment == 0 {
    0
  } else {
    alignment - (pos % alignment)
  };
  for _ in 0..pad_size {
    bio.write_u8(0xCA, e);
  }
}

fn write_qm_header<W: Write>(
  bio: &mut BinaryIo<W>,
  e: &mut BinaryIoErrorTracker,
  header: &QuantizedMeshHeader,
) {
  bio.write_f64(header.center.x, e);
  bio.write_f64(header.center.y, e);
  bio.write_f64(header.center.z, e);

  bio.write_f32(header.min_height, e);
  bio.write_f32(header.max_height, e);

  bio.write_f64(header.bounding_sphere_center.x, e);
  bio.write_f64(header.bounding_sphere_center.y, e);
  bio.write_f64(header.bounding_sphere_center.z, e);
  bio.write_f64(header.bounding_sphere_radius, e);

  bio.write_f64(header.horizon_occlusion.x, e);
  bio.write_f64(header.horizon_occlusion.y, e);
  bio.write_f64(header.horizon_occlusion.z, e);
}

fn vertex_key(v: &Vertex) -> [u64; 3] {
  [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()]
}

fn write_faces<W: Write, T>(
  bio: &mut BinaryIo<W>,
  e: &mut BinaryIoErrorTracker,
  triangles: &[tin_mesh::Triangle],
  order: &HashMap<[u64; 3], u32>,
) where
  T: WireScalar + TryFrom<u32>,
{
  let ntriangles = triangles.len() as u32;

  // high-watermark encode the triangle indices
  let mut indices: Vec<T> = Vec::with_capacity(triangles.len() * 3);
  let mut watermark: u32 = 0;
  for t in triangles {
    for v in t {
      let index = order[&vertex_key(v)];
      let delta = watermark - index;
      indices.push(T::try_from(delta).ok().unwrap_or_default());
      if index == watermark {
        watermark += 1;
      }
    }
  }

  add_alignment(bio, e, T::SIZE as u64);
  bio.write_u32(ntriangles, e);
  if ntriangles > 0 {
    bio.write_array(&indices, e);
  }
}

fn write_edge_indices<W: Write, T>(
  bio: &mut BinaryIo<W>,
  e: &mut BinaryIoErrorTracker,
  indices: &[u32],
) where
  T: WireScalar + TryFrom<u32>,
{
  bio.write_u32(indices.len() as u32, e);
  for &i in indices {
    bio.write_scalar(T::try_from(i).ok().unwrap_or_default(), e);
  }
}

/// Encode `mesh` with the dequantization bounds taken from its own
/// bounding box.
pub fn write_mesh_as_qm<W: Write>(
  stream: &mut W,
  mesh: &Mesh,
  projector: &dyn EcefProjector,
) -> Result<(), CodecError> {
  let bbox = mesh.get_bbox();
  write_mesh_as_qm_with_bbox(stream, mesh, &bbox, false, projector)
}

/// Encode `mesh` against an explicit bounding box. With
/// `mesh_is_rescaled` the vertices are assumed to sit in the unit cube
/// already and are scaled straight onto the quantized range.
pub fn write_mesh_as_qm_with_bbox<W: Write>(
  stream: &mut W,
  mesh: &Mesh,
  bbox: &BBox3D,
  mesh_is_rescaled: bool,
  projector: &dyn EcefProjector,
) -> Result<(), CodecError> {
  if !mesh.empty() && !mesh.has_triangles() {
    return Err(CodecError::Encoding(
      "mesh has to be triangulated in order to be written as quantized mesh".into(),
    ));
  }

  let center = (bbox.max + bbox.min) / 2.0;
  if !center.is_finite() {
    return Err(CodecError::Encoding(
      "mesh bounding box is not finite".into(),
    ));
  }

  let ecef_center = projector
    .to_ecef(center)
    .ok_or(CodecError::ProjectionUnavailable)?;

  // consumers rely on the 2D diagonal here, the z extent is ignored
  let radius = DVec2::new(bbox.min.x, bbox.min.y).distance(DVec2::new(bbox.max.x, bbox.max.y));

  let mut header = QuantizedMeshHeader {
    center: ecef_center,
    bounding_sphere_center: ecef_center,
    bounding_sphere_radius: radius,
    min_height: bbox.min.z as f32,
    max_height: bbox.max.z as f32,
    ..Default::default()
  };
  // the center of the tile elevated to the bbox's max z
  header.horizon_occlusion = ecef_center;
  header.horizon_occlusion.z = bbox.max.z;

  let mut bio = BinaryIo::new(stream, Endianness::Little);
  let mut e = BinaryIoErrorTracker::new();

  write_qm_header(&mut bio, &mut e, &header);
  if e.has_error() {
    return Err(CodecError::Io(e.to_string()));
  }
  debug_assert_eq!(bio.write_pos(), 88);

  // vertex data: first-encounter ordering over the triangle corners
  let triangles = mesh.triangles();

  let mut order: HashMap<[u64; 3], u32> = HashMap::with_capacity(triangles.len() / 2 * 3);
  let mut us: Vec<u16> = Vec::new();
  let mut vs: Vec<u16> = Vec::new();
  let mut hs: Vec<u16> = Vec::new();
  let mut westlings: Vec<u32> = Vec::new();
  let mut southlings: Vec<u32> = Vec::new();
  let mut eastlings: Vec<u32> = Vec::new();
  let mut northlings: Vec<u32> = Vec::new();

  let mut prev_u = 0i32;
  let mut prev_v = 0i32;
  let mut prev_h = 0i32;
  let mut vertex_index = 0u32;

  for t in triangles {
    for node in t {
      if order.contains_key(&vertex_key(node)) {
        continue;
      }
      order.insert(vertex_key(node), vertex_index);

      let (u, v, h) = if mesh_is_rescaled {
        (
          scale_coordinate(node.x),
          scale_coordinate(node.y),
          scale_coordinate(node.z),
        )
      } else {
        // quantize against the same center-radius square the decoder
        // reconstructs from the header, so positions survive the trip
        (
          quantize_coordinate(node.x, center.x - radius, center.x + radius)?,
          quantize_coordinate(node.y, center.y - radius, center.y + radius)?,
          quantize_coordinate(node.z, bbox.min.z, bbox.max.z)?,
        )
      };

      if u == 0 {
        westlings.push(vertex_index);
      } else if u == QUANTIZED_COORDINATE_SIZE {
        eastlings.push(vertex_index);
      }
      if v == 0 {
        northlings.push(vertex_index);
      } else if v == QUANTIZED_COORDINATE_SIZE {
        southlings.push(vertex_index);
      }

      us.push(zig_zag_encode((u - prev_u) as i16));
      vs.push(zig_zag_encode((v - prev_v) as i16));
      hs.push(zig_zag_encode((h - prev_h) as i16));

      prev_u = u;
      prev_v = v;
      prev_h = h;

      vertex_index += 1;
    }
  }

  let nvertices = vertex_index;

  bio.write_u32(nvertices, &mut e);
  bio.write_array(&us, &mut e);
  bio.write_array(&vs, &mut e);
  bio.write_array(&hs, &mut e);
  if e.has_error() {
    return Err(CodecError::Io(e.to_string()));
  }

  if nvertices <= 65536 {
    write_faces::<_, u16>(&mut bio, &mut e, triangles, &order);
    write_edge_indices::<_, u16>(&mut bio, &mut e, &westlings);
    write_edge_indices::<_, u16>(&mut bio, &mut e, &southlings);
    write_edge_indices::<_, u16>(&mut bio, &mut e, &eastlings);
    write_edge_indices::<_, u16>(&mut bio, &mut e, &northlings);
  } else {
    write_faces::<_, u32>(&mut bio, &mut e, triangles, &order);
    write_edge_indices::<_, u32>(&mut bio, &mut e, &westlings);
    write_edge_indices::<_, u32>(&mut bio, &mut e, &southlings);
    write_edge_indices::<_, u32>(&mut bio, &mut e, &eastlings);
    write_edge_indices::<_, u32>(&mut bio, &mut e, &northlings);
  }

  if e.has_error() {
    return Err(CodecError::Io(e.to_string()));
  }

  tracing::debug!(
    "wrote quantized mesh: {} vertices, {} triangles",
    nvertices,
    triangles.len()
  );
  Ok(())
}

// =============================================================================
// Decoder
// =============================================================================

fn read_qm_header<R: Read>(
  bio: &mut BinaryIo<R>,
  e: &mut BinaryIoErrorTracker,
) -> QuantizedMeshHeader {
  let mut header = QuantizedMeshHeader::default();

  bio.read_f64(&mut header.center.x, e);
  bio.read_f64(&mut header.center.y, e);
  bio.read_f64(&mut header.center.z, e);

  bio.read_f32(&mut header.min_height, e);
  bio.read_f32(&mut header.max_height, e);

  bio.read_f64(&mut header.bounding_sphere_center.x, e);
  bio.read_f64(&mut header.bounding_sphere_center.y, e);
  bio.read_f64(&mut header.bounding_sphere_center.z, e);
  bio.read_f64(&mut header.bounding_sphere_radius, e);

  bio.read_f64(&mut header.horizon_occlusion.x, e);
  bio.read_f64(&mut header.horizon_occlusion.y, e);
  bio.read_f64(&mut header.horizon_occlusion.z, e);

  header
}

/// Dequantization box reconstructed from the header: the bounding-sphere
/// center ± radius horizontally, the height range vertically.
fn bbox_from_header(header: &QuantizedMeshHeader) -> BBox3D {
  let top_left = DVec2::new(
    header.bounding_sphere_center.x - header.bounding_sphere_radius,
    header.bounding_sphere_center.y - header.bounding_sphere_radius,
  );
  let bottom_right = DVec2::new(
    header.bounding_sphere_center.x + header.bounding_sphere_radius,
    header.bounding_sphere_center.y + header.bounding_sphere_radius,
  );

  BBox3D::from_corners(
    DVec3::new(top_left.x, top_left.y, header.min_height as f64),
    DVec3::new(bottom_right.x, bottom_right.y, header.max_height as f64),
  )
}

fn decode_qm_vertices(
  bbox: &BBox3D,
  u_buffer: &[u16],
  v_buffer: &[u16],
  height_buffer: &[u16],
) -> Vec<Vertex> {
  let mut vertices = Vec::with_capacity(u_buffer.len());

  let mut u = 0i32;
  let mut v = 0i32;
  let mut height = 0i32;
  for i in 0..u_buffer.len() {
    u += zig_zag_decode(u_buffer[i]) as i32;
    v += zig_zag_decode(v_buffer[i]) as i32;
    height += zig_zag_decode(height_buffer[i]) as i32;

    vertices.push(DVec3::new(
      dequantize_coordinate(u, bbox.min.x, bbox.max.x),
      dequantize_coordinate(v, bbox.min.y, bbox.max.y),
      dequantize_coordinate(height, bbox.min.z, bbox.max.z),
    ));
  }

  vertices
}

fn decode_qm_faces(codes: &[u32]) -> Vec<Face> {
  let mut faces = Vec::with_capacity(codes.len() / 3);
  let mut highest: u32 = 0;
  for chunk in codes.chunks_exact(3) {
    let mut f: Face = [0; 3];
    for (k, &code) in chunk.iter().enumerate() {
      // saturate on malformed streams rather than underflowing
      f[k] = highest.saturating_sub(code) as usize;
      if code == 0 {
        highest += 1;
      }
    }
    faces.push(f);
  }
  faces
}

/// Decode a quantized-mesh stream back into a mesh. Extension data after
/// the index rings is ignored.
pub fn load_mesh_from_qm<R: Read>(stream: &mut R) -> Result<Mesh, CodecError> {
  let mut bio = BinaryIo::new(stream, Endianness::Little);
  let mut e = BinaryIoErrorTracker::new();

  let header = read_qm_header(&mut bio, &mut e);
  if e.has_error() {
    return Err(CodecError::Io(format!("{e} during header")));
  }

  let mut vertex_count = 0u32;
  bio.read_u32(&mut vertex_count, &mut e);
  if e.has_error() {
    return Err(CodecError::Io(format!("{e} during vertexCount")));
  }
  tracing::debug!("vertex_count: {vertex_count}");

  let mut u_buffer: Vec<u16> = Vec::new();
  let mut v_buffer: Vec<u16> = Vec::new();
  let mut height_buffer: Vec<u16> = Vec::new();
  if vertex_count > 0 {
    u_buffer = bio.read_array(vertex_count as usize, &mut e);
    v_buffer = bio.read_array(vertex_count as usize, &mut e);
    height_buffer = bio.read_array(vertex_count as usize, &mut e);
    if e.has_error() {
      return Err(CodecError::Io(format!("{e} during vertex data")));
    }
  }

  // padding before the index block
  let alignment: u64 = if vertex_count <= 65536 { 2 } else { 4 };
  let read_pos = bio.read_pos();
  if read_pos % alignment != 0 {
    bio.read_skip((alignment - read_pos % alignment) as usize, &mut e);
  }

  let mut triangle_count = 0u32;
  bio.read_u32(&mut triangle_count, &mut e);
  if e.has_error() {
    return Err(CodecError::Io(format!("{e} during triangleCount")));
  }

  let mut codes: Vec<u32> = Vec::new();
  if triangle_count > 0 {
    if vertex_count <= 65536 {
      let raw: Vec<u16> = bio.read_array(triangle_count as usize * 3, &mut e);
      codes = raw.into_iter().map(u32::from).collect();
    } else {
      codes = bio.read_array(triangle_count as usize * 3, &mut e);
    }
    if e.has_error() {
      return Err(CodecError::Io(format!("{e} during index data")));
    }
  }

  let header_bbox = bbox_from_header(&header);
  let vertices = decode_qm_vertices(&header_bbox, &u_buffer, &v_buffer, &height_buffer);
  let faces = decode_qm_faces(&codes);

  tracing::debug!(
    "{} vertices, {} faces after decoding",
    vertices.len(),
    faces.len()
  );

  Ok(Mesh::from_decomposed(vertices, faces))
}

#[cfg(test)]
#[path = "quantized_mesh_test.rs"]
mod quantized_mesh_test;
