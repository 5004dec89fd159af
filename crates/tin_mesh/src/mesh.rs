//! Triangle mesh container with two redundant representations.
//!
//! A [`Mesh`] can hold an expanded triangle soup, an indexed
//! vertices-plus-faces decomposition, or both. Either view is generated
//! from the other on demand; when both are present they describe the same
//! set of triangles.

use std::collections::HashMap;

use crate::geometry::{
  face_is_facing_upwards, BBox3D, Face, MeshEdge, Triangle, Vertex, VertexIndex,
};

/// Bit-pattern key so vertices can be deduplicated through a hash map.
fn vertex_key(v: &Vertex) -> [u64; 3] {
  [v.x.to_bits(), v.y.to_bits(), v.z.to_bits()]
}

#[derive(Default)]
pub struct Mesh {
  vertices: Vec<Vertex>,
  faces: Vec<Face>,
  triangles: Vec<Triangle>,
}

impl Mesh {
  pub fn new() -> Self {
    Mesh::default()
  }

  pub fn from_decomposed(vertices: Vec<Vertex>, faces: Vec<Face>) -> Self {
    Mesh {
      vertices,
      faces,
      triangles: Vec::new(),
    }
  }

  pub fn from_triangles(triangles: Vec<Triangle>) -> Self {
    Mesh {
      vertices: Vec::new(),
      faces: Vec::new(),
      triangles,
    }
  }

  pub fn clear(&mut self) {
    self.vertices.clear();
    self.faces.clear();
    self.triangles.clear();
  }

  pub fn has_triangles(&self) -> bool {
    !self.triangles.is_empty()
  }

  pub fn has_decomposed(&self) -> bool {
    !self.vertices.is_empty() && !self.faces.is_empty()
  }

  pub fn poly_count(&self) -> usize {
    if self.has_decomposed() {
      self.faces.len()
    } else {
      self.triangles.len()
    }
  }

  pub fn empty(&self) -> bool {
    self.poly_count() == 0
  }

  pub fn vertices(&self) -> &[Vertex] {
    &self.vertices
  }

  pub fn faces(&self) -> &[Face] {
    &self.faces
  }

  pub fn triangles(&self) -> &[Triangle] {
    &self.triangles
  }

  /// Expand faces into inline triangles. Faces with out-of-range indices
  /// are dropped.
  pub fn generate_triangles(&mut self) {
    if self.has_triangles() {
      return;
    }

    tracing::debug!("generate triangles from {} faces", self.faces.len());
    self.triangles.reserve(self.faces.len());

    for face in &self.faces {
      if face.iter().all(|&vi| vi < self.vertices.len()) {
        self.triangles.push([
          self.vertices[face[0]],
          self.vertices[face[1]],
          self.vertices[face[2]],
        ]);
      }
    }
  }

  /// Build the indexed representation from the triangle soup, merging
  /// bit-identical vertices.
  pub fn generate_decomposed(&mut self) {
    if self.has_decomposed() {
      return;
    }

    tracing::debug!("generate decomposed from {} triangles", self.triangles.len());

    let mut vertex_lookup: HashMap<[u64; 3], VertexIndex> =
      HashMap::with_capacity(self.triangles.len());
    self.faces.reserve(self.triangles.len());

    for t in &self.triangles {
      let mut f: Face = [0; 3];
      for (i, v) in t.iter().enumerate() {
        let next_index = self.vertices.len();
        let index = *vertex_lookup.entry(vertex_key(v)).or_insert(next_index);
        if index == next_index {
          self.vertices.push(*v);
        }
        f[i] = index;
      }
      self.faces.push(f);
    }
  }

  /// Resolve a face to an inline triangle. `None` when an index is invalid.
  pub fn compose_triangle(&self, f: &Face) -> Option<Triangle> {
    if f.iter().any(|&vi| vi >= self.vertices.len()) {
      return None;
    }
    Some([self.vertices[f[0]], self.vertices[f[1]], self.vertices[f[2]]])
  }

  pub fn take_triangles(&mut self) -> Vec<Triangle> {
    std::mem::take(&mut self.triangles)
  }

  pub fn take_decomposed(&mut self) -> (Vec<Vertex>, Vec<Face>) {
    (
      std::mem::take(&mut self.vertices),
      std::mem::take(&mut self.faces),
    )
  }

  pub fn get_bbox(&self) -> BBox3D {
    let mut bbox = BBox3D::new();
    if self.has_decomposed() || !self.vertices.is_empty() {
      for v in &self.vertices {
        bbox.add(*v);
      }
    } else {
      for t in &self.triangles {
        bbox.add_triangle(t);
      }
    }
    bbox
  }

  /// Check the "proper TIN" contract: valid and referenced vertex indices,
  /// no collapsed faces, all faces up-facing, no duplicate vertices, and no
  /// two faces crossing in 2D.
  pub fn check_tin_properties(&self) -> bool {
    tracing::debug!("checking mesh consistency / TIN properties");
    if !self.has_decomposed() {
      return false;
    }

    let vertices_len = self.vertices.len();
    let mut vertex_used = vec![false; vertices_len];

    for f in &self.faces {
      if f[0] >= vertices_len || f[1] >= vertices_len || f[2] >= vertices_len {
        tracing::debug!("not a proper TIN: face with invalid vertex index");
        return false;
      }

      vertex_used[f[0]] = true;
      vertex_used[f[1]] = true;
      vertex_used[f[2]] = true;

      if f[0] == f[1] || f[0] == f[2] || f[1] == f[2] {
        tracing::debug!("not a proper TIN: face with collapsed corner points");
        return false;
      }

      if !face_is_facing_upwards(f, &self.vertices) {
        tracing::debug!("not a proper TIN: face not oriented upwards");
        return false;
      }
    }

    if !vertex_used.iter().all(|&u| u) {
      tracing::debug!("not a proper TIN: unreferenced vertices");
      return false;
    }

    let mut seen = HashMap::with_capacity(vertices_len);
    for (i, v) in self.vertices.iter().enumerate() {
      if seen.insert(vertex_key(v), i).is_some() {
        tracing::debug!("not a proper TIN: duplicate vertices");
        return false;
      }
    }

    for fi in 0..self.faces.len() {
      if self.face_edge_crosses_other_edge(fi) {
        tracing::debug!("not a proper TIN: overlapping triangles");
        return false;
      }
    }

    true
  }

  fn face_edge_crosses_other_edge(&self, fi: usize) -> bool {
    let f = self.faces[fi];
    let face_edges = [
      MeshEdge::new(f[0], f[1]),
      MeshEdge::new(f[1], f[2]),
      MeshEdge::new(f[2], f[0]),
    ];

    let ft_bbox = crate::geometry::BBox2D::from_triangle(&[
      self.vertices[f[0]],
      self.vertices[f[1]],
      self.vertices[f[2]],
    ]);

    for oi in fi + 1..self.faces.len() {
      let o = self.faces[oi];
      let ot_bbox = crate::geometry::BBox2D::from_triangle(&[
        self.vertices[o[0]],
        self.vertices[o[1]],
        self.vertices[o[2]],
      ]);

      if !ft_bbox.intersects(&ot_bbox, 0.0) {
        continue;
      }

      let other_edges = [
        MeshEdge::new(o[0], o[1]),
        MeshEdge::new(o[1], o[2]),
        MeshEdge::new(o[2], o[0]),
      ];

      for e in &face_edges {
        for oe in &other_edges {
          if !e.shares_point(oe) && e.intersects_2d(oe, &self.vertices) {
            return true;
          }
        }
      }
    }

    false
  }
}

#[cfg(test)]
#[path = "mesh_test.rs"]
mod mesh_test;
