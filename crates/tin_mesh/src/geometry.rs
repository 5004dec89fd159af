//! Planar and 2.5D geometry primitives shared by the meshing core.
//!
//! Points are `glam` double vectors. A [`Triangle`] carries its vertices
//! inline; a [`Face`] indexes into a vertex array. The orientation
//! convention everywhere is counter-clockwise in the xy plane = up-facing.

use glam::{DVec2, DVec3};

/// Predicate tolerance used by the incircle test and on-edge checks.
pub const EPS: f64 = 1e-6;

/// A 3D mesh vertex.
pub type Vertex = DVec3;

/// Index into a vertex array.
pub type VertexIndex = usize;

/// Ordered triple of vertex indices, counter-clockwise in xy.
pub type Face = [VertexIndex; 3];

/// Ordered triple of vertices, counter-clockwise in xy.
pub type Triangle = [Vertex; 3];

/// Twice the signed area of the oriented triangle abc.
/// Positive when abc is oriented counter-clockwise.
#[inline]
pub fn tri_area(a: DVec2, b: DVec2, c: DVec2) -> f64 {
  (b.x - a.x) * (c.y - a.y) - (b.y - a.y) * (c.x - a.x)
}

#[inline]
pub fn ccw(a: DVec2, b: DVec2, c: DVec2) -> bool {
  tri_area(a, b, c) > 0.0
}

#[inline]
pub fn right_of(x: DVec2, org: DVec2, dest: DVec2) -> bool {
  ccw(x, dest, org)
}

#[inline]
pub fn left_of(x: DVec2, org: DVec2, dest: DVec2) -> bool {
  ccw(x, org, dest)
}

/// True if point d lies inside the circle through a, b, c.
/// See Guibas and Stolfi (1985) p.107; a, b, c are assumed CCW.
pub fn in_circle(a: DVec2, b: DVec2, c: DVec2, d: DVec2) -> bool {
  (a.x * a.x + a.y * a.y) * tri_area(b, c, d) - (b.x * b.x + b.y * b.y) * tri_area(a, c, d)
    + (c.x * c.x + c.y * c.y) * tri_area(a, b, d)
    - (d.x * d.x + d.y * d.y) * tri_area(a, b, c)
    > EPS
}

/// Normalized implicit 2D line `a*x + b*y + c = 0` through two points.
pub struct Line {
  a: f64,
  b: f64,
  c: f64,
}

impl Line {
  pub fn new(p: DVec2, q: DVec2) -> Self {
    let t = q - p;
    let l = t.length();
    let a = t.y / l;
    let b = -t.x / l;
    let c = -(a * p.x + b * p.y);
    Line { a, b, c }
  }

  /// Signed distance of `p` from the line.
  #[inline]
  pub fn eval(&self, p: DVec2) -> f64 {
    self.a * p.x + self.b * p.y + self.c
  }
}

/// Affine plane `z = a*x + b*y + c` through three points.
#[derive(Clone, Copy, Debug, Default)]
pub struct Plane {
  pub a: f64,
  pub b: f64,
  pub c: f64,
}

impl Plane {
  pub fn from_points(p: DVec3, q: DVec3, r: DVec3) -> Self {
    let ux = q.x - p.x;
    let uy = q.y - p.y;
    let uz = q.z - p.z;

    let vx = r.x - p.x;
    let vy = r.y - p.y;
    let vz = r.z - p.z;

    // den == 0 for collinear points; the non-finite coefficients propagate
    // into NaN evaluations which callers discard
    let den = ux * vy - uy * vx;

    let a = (uz * vy - uy * vz) / den;
    let b = (ux * vz - uz * vx) / den;
    let c = p.z - a * p.x - b * p.y;

    Plane { a, b, c }
  }

  #[inline]
  pub fn eval(&self, x: f64, y: f64) -> f64 {
    self.a * x + self.b * y + self.c
  }
}

/// Face normal z-component test: CCW in xy means the face points up.
#[inline]
pub fn is_facing_upwards(t: &Triangle) -> bool {
  facing_upwards_xy(t[0].x, t[0].y, t[1].x, t[1].y, t[2].x, t[2].y)
}

pub fn face_is_facing_upwards(f: &Face, vertices: &[Vertex]) -> bool {
  let t0 = vertices[f[0]];
  let t1 = vertices[f[1]];
  let t2 = vertices[f[2]];
  facing_upwards_xy(t0.x, t0.y, t1.x, t1.y, t2.x, t2.y)
}

#[inline]
fn facing_upwards_xy(t0x: f64, t0y: f64, t1x: f64, t1y: f64, t2x: f64, t2y: f64) -> bool {
  let n_z = (t0x - t1x) * (t0y - t2y) - (t0x - t2x) * (t0y - t1y);
  n_z >= 0.0
}

/// Undirected mesh edge as a pair of vertex indices.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct MeshEdge {
  pub first: VertexIndex,
  pub second: VertexIndex,
}

impl MeshEdge {
  pub fn new(first: VertexIndex, second: VertexIndex) -> Self {
    MeshEdge { first, second }
  }

  pub fn shares_point(&self, other: &MeshEdge) -> bool {
    self.first == other.first
      || self.first == other.second
      || self.second == other.first
      || self.second == other.second
  }

  /// True if the two segments properly cross in the xy plane.
  pub fn intersects_2d(&self, other: &MeshEdge, vertices: &[Vertex]) -> bool {
    let p0 = vertices[self.first].truncate();
    let p1 = vertices[self.second].truncate();
    let l0 = vertices[other.first].truncate();
    let l1 = vertices[other.second].truncate();

    let e1_bbox = BBox2D::from_corners(p0, p1);
    let e2_bbox = BBox2D::from_corners(l0, l1);

    if !e1_bbox.intersects(&e2_bbox, 0.0) {
      return false;
    }

    let crossing = intersect_2d_lines(p0, p1, l0, l1);
    if crossing.x.is_nan() || crossing.y.is_nan() {
      return false;
    }

    e1_bbox.contains(crossing, 0.0) && e2_bbox.contains(crossing, 0.0)
  }
}

/// Crossing point of the infinite lines through (p0, p1) and (l0, l1).
/// NaN components when the lines are (close to) parallel.
fn intersect_2d_lines(p0: DVec2, p1: DVec2, l0: DVec2, l1: DVec2) -> DVec2 {
  let denom = (p0.x - p1.x) * (l0.y - l1.y) - (p0.y - p1.y) * (l0.x - l1.x);
  let eps = 1e-9;
  if denom.abs() < eps {
    return DVec2::new(f64::NAN, f64::NAN);
  }

  let d01 = p0.x * p1.y - p0.y * p1.x;
  let d23 = l0.x * l1.y - l0.y * l1.x;
  let cx = (d01 * (l0.x - l1.x) - (p0.x - p1.x) * d23) / denom;
  let cy = (d01 * (l0.y - l1.y) - (p0.y - p1.y) * d23) / denom;

  DVec2::new(
    if cx == -0.0 { 0.0 } else { cx },
    if cy == -0.0 { 0.0 } else { cy },
  )
}

/// Axis-aligned 2D bounding box, infinity-initialized.
#[derive(Clone, Copy, Debug)]
pub struct BBox2D {
  pub min: DVec2,
  pub max: DVec2,
}

impl Default for BBox2D {
  fn default() -> Self {
    BBox2D {
      min: DVec2::splat(f64::INFINITY),
      max: DVec2::splat(f64::NEG_INFINITY),
    }
  }
}

impl BBox2D {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_corners(a: DVec2, b: DVec2) -> Self {
    BBox2D {
      min: a.min(b),
      max: a.max(b),
    }
  }

  pub fn from_triangle(t: &Triangle) -> Self {
    let mut bb = Self::from_corners(t[0].truncate(), t[1].truncate());
    bb.add(t[2].truncate());
    bb
  }

  pub fn add(&mut self, p: DVec2) {
    self.min = self.min.min(p);
    self.max = self.max.max(p);
  }

  pub fn grow(&mut self, delta: f64) {
    self.min -= DVec2::splat(delta);
    self.max += DVec2::splat(delta);
  }

  pub fn width(&self) -> f64 {
    (self.max.x - self.min.x).abs()
  }

  pub fn height(&self) -> f64 {
    (self.max.y - self.min.y).abs()
  }

  /// Epsilon grows both rectangles.
  pub fn intersects(&self, other: &BBox2D, epsilon: f64) -> bool {
    if self.min.y - epsilon > other.max.y + epsilon {
      return false;
    }
    if self.max.y + epsilon < other.min.y - epsilon {
      return false;
    }
    if self.max.x + epsilon < other.min.x - epsilon {
      return false;
    }
    if self.min.x - epsilon > other.max.x + epsilon {
      return false;
    }
    true
  }

  pub fn contains(&self, point: DVec2, epsilon: f64) -> bool {
    (self.min.x - epsilon) <= point.x
      && (self.min.y - epsilon) <= point.y
      && (self.max.x + epsilon) >= point.x
      && (self.max.y + epsilon) >= point.y
  }
}

/// Axis-aligned 3D bounding box, infinity-initialized.
#[derive(Clone, Copy, Debug)]
pub struct BBox3D {
  pub min: DVec3,
  pub max: DVec3,
}

impl Default for BBox3D {
  fn default() -> Self {
    BBox3D {
      min: DVec3::splat(f64::INFINITY),
      max: DVec3::splat(f64::NEG_INFINITY),
    }
  }
}

impl BBox3D {
  pub fn new() -> Self {
    Self::default()
  }

  pub fn from_corners(a: DVec3, b: DVec3) -> Self {
    BBox3D {
      min: a.min(b),
      max: a.max(b),
    }
  }

  pub fn add(&mut self, p: DVec3) {
    self.min = self.min.min(p);
    self.max = self.max.max(p);
  }

  pub fn add_triangle(&mut self, t: &Triangle) {
    for v in t {
      self.add(*v);
    }
  }

  pub fn grow(&mut self, delta: f64) {
    self.min -= DVec3::splat(delta);
    self.max += DVec3::splat(delta);
  }

  pub fn contains(&self, point: DVec3, epsilon: f64) -> bool {
    (self.min.x - epsilon) <= point.x
      && (self.min.y - epsilon) <= point.y
      && (self.min.z - epsilon) <= point.z
      && (self.max.x + epsilon) >= point.x
      && (self.max.y + epsilon) >= point.y
      && (self.max.z + epsilon) >= point.z
  }
}

#[cfg(test)]
#[path = "geometry_test.rs"]
mod geometry_test;
