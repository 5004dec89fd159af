//! Guibas–Stolfi quad-edge algebra over pooled records.
//!
//! Every undirected edge of the subdivision is represented by a quartet of
//! directed half-edges {e, rot(e), sym(e), inv_rot(e)} — the edge, its dual,
//! its reverse, and the reverse dual. The only topological mutator is
//! [`Subdivision::splice`]; everything else is navigation.
//!
//! "next" means next in a counter-clockwise sense around a neighboring
//! face or vertex, "prev" the clockwise equivalent:
//!
//! ```text
//!           \         _/
//!   <lnext   \   |   /    <dnext
//!             \__|__/
//!                | dest
//!                ^
//!                |e
//!               _|_ org
//!              / | \
//!    <onext  /   |  \  <rnext
//!           /         \
//! ```

use glam::DVec2;

use crate::pool::{Handle, Pool};

pub type EdgeHandle = Handle<EdgeRec>;
pub type FaceHandle = Handle<FaceRec>;

/// One directed half-edge of a quad-edge quartet.
#[derive(Default, Clone)]
pub struct EdgeRec {
  /// Next edge with the same origin, counter-clockwise (Onext).
  next: EdgeHandle,
  /// Dual edge pointing to the left (Rot).
  rot: EdgeHandle,
  /// Dual edge pointing to the right (invRot).
  inv_rot: EdgeHandle,
  /// Origin point of the primal edge.
  org: DVec2,
  /// Face on the left.
  lface: FaceHandle,
}

/// Triangle face record anchored at one of its bordering half-edges.
///
/// All faces of a subdivision form a singly-linked list through
/// `next_face`, in insertion order.
#[derive(Default, Clone)]
pub struct FaceRec {
  anchor: EdgeHandle,
  next_face: FaceHandle,
}

/// A planar subdivision: the edge pool, the face pool, and the operations
/// of the quad-edge algebra.
pub struct Subdivision {
  edges: Pool<EdgeRec>,
  faces: Pool<FaceRec>,
}

impl Default for Subdivision {
  fn default() -> Self {
    Self::new()
  }
}

impl Subdivision {
  pub fn new() -> Self {
    Subdivision {
      edges: Pool::with_capacity(4096),
      faces: Pool::with_capacity(1024),
    }
  }

  pub fn edge_count(&self) -> usize {
    self.edges.len()
  }

  pub fn face_count(&self) -> usize {
    self.faces.len()
  }

  // ===========================================================================
  // Edge construction
  // ===========================================================================

  /// Allocate a new isolated edge: four records wired so that `rot` cycles
  /// e0→e1→e2→e3→e0, the primal ends are loose (`onext` = self) and the
  /// dual forms a loop.
  pub fn make_edge(&mut self) -> EdgeHandle {
    let e0 = self.edges.spawn();
    let e1 = self.edges.spawn();
    let e2 = self.edges.spawn();
    let e3 = self.edges.spawn();

    self.edges[e0].rot = e1;
    self.edges[e1].rot = e2;
    self.edges[e2].rot = e3;
    self.edges[e3].rot = e0;

    self.edges[e0].inv_rot = e3;
    self.edges[e1].inv_rot = e0;
    self.edges[e2].inv_rot = e1;
    self.edges[e3].inv_rot = e2;

    self.edges[e0].next = e0;
    self.edges[e1].next = e3;
    self.edges[e2].next = e2;
    self.edges[e3].next = e1;

    e0
  }

  // ===========================================================================
  // Primitive navigation
  // ===========================================================================

  /// Next edge around the origin, with the same origin.
  #[inline]
  pub fn onext(&self, e: EdgeHandle) -> EdgeHandle {
    self.edges[e].next
  }

  /// Dual edge pointing to the left.
  #[inline]
  pub fn rot(&self, e: EdgeHandle) -> EdgeHandle {
    self.edges[e].rot
  }

  /// Dual edge pointing to the right.
  #[inline]
  pub fn inv_rot(&self, e: EdgeHandle) -> EdgeHandle {
    self.edges[e].inv_rot
  }

  /// Edge pointing opposite to this one.
  #[inline]
  pub fn sym(&self, e: EdgeHandle) -> EdgeHandle {
    self.rot(self.rot(e))
  }

  // ===========================================================================
  // Synthesized navigation
  // ===========================================================================

  pub fn oprev(&self, e: EdgeHandle) -> EdgeHandle {
    self.rot(self.onext(self.rot(e)))
  }

  pub fn dnext(&self, e: EdgeHandle) -> EdgeHandle {
    self.sym(self.onext(self.sym(e)))
  }

  pub fn dprev(&self, e: EdgeHandle) -> EdgeHandle {
    self.inv_rot(self.onext(self.inv_rot(e)))
  }

  /// Next edge around the left face, with the same left face.
  pub fn lnext(&self, e: EdgeHandle) -> EdgeHandle {
    self.rot(self.onext(self.inv_rot(e)))
  }

  /// Previous edge around the left face.
  pub fn lprev(&self, e: EdgeHandle) -> EdgeHandle {
    self.sym(self.onext(e))
  }

  pub fn rnext(&self, e: EdgeHandle) -> EdgeHandle {
    self.inv_rot(self.onext(self.rot(e)))
  }

  pub fn rprev(&self, e: EdgeHandle) -> EdgeHandle {
    self.onext(self.sym(e))
  }

  // ===========================================================================
  // Endpoint data
  // ===========================================================================

  #[inline]
  pub fn org(&self, e: EdgeHandle) -> DVec2 {
    self.edges[e].org
  }

  #[inline]
  pub fn dest(&self, e: EdgeHandle) -> DVec2 {
    self.edges[self.sym(e)].org
  }

  pub fn set_endpoints(&mut self, e: EdgeHandle, org: DVec2, dest: DVec2) {
    let s = self.sym(e);
    self.edges[e].org = org;
    self.edges[s].org = dest;
  }

  #[inline]
  pub fn lface(&self, e: EdgeHandle) -> FaceHandle {
    self.edges[e].lface
  }

  pub fn set_lface(&mut self, e: EdgeHandle, t: FaceHandle) {
    self.edges[e].lface = t;
  }

  // ===========================================================================
  // The fundamental topological operator
  // ===========================================================================

  /// Exchange the `onext` rings of `a` and `b` (and of their duals).
  ///
  /// If a and b share an origin the ring is split in two; if they do not,
  /// the two rings merge into one.
  pub fn splice(&mut self, a: EdgeHandle, b: EdgeHandle) {
    let alpha = self.rot(self.onext(a));
    let beta = self.rot(self.onext(b));

    let t1 = self.onext(b);
    let t2 = self.onext(a);
    let t3 = self.onext(beta);
    let t4 = self.onext(alpha);

    self.edges[a].next = t1;
    self.edges[b].next = t2;
    self.edges[alpha].next = t3;
    self.edges[beta].next = t4;
  }

  // ===========================================================================
  // Faces
  // ===========================================================================

  /// Spawn a face anchored at `e` and claim the triangle around it.
  pub fn spawn_face(&mut self, e: EdgeHandle) -> FaceHandle {
    let t = self.faces.spawn();
    self.reshape(t, e);
    t
  }

  /// Re-anchor `t` at `e` and mark the three edges of its triangle as
  /// bordering `t`.
  pub fn reshape(&mut self, t: FaceHandle, e: EdgeHandle) {
    self.faces[t].anchor = e;
    self.set_lface(e, t);
    let ln = self.lnext(e);
    self.set_lface(ln, t);
    let lp = self.lprev(e);
    self.set_lface(lp, t);
  }

  /// Move the anchor off `e` if it currently points there.
  pub fn dont_anchor(&mut self, t: FaceHandle, e: EdgeHandle) {
    if self.faces[t].anchor == e {
      self.faces[t].anchor = self.lnext(e);
    }
  }

  pub fn face_anchor(&self, t: FaceHandle) -> EdgeHandle {
    self.faces[t].anchor
  }

  pub fn face_link(&self, t: FaceHandle) -> FaceHandle {
    self.faces[t].next_face
  }

  pub fn set_face_link(&mut self, t: FaceHandle, next: FaceHandle) {
    self.faces[t].next_face = next;
  }

  /// The three corner points of a face:
  /// (anchor.org, anchor.dest, anchor.lprev.org).
  pub fn face_points(&self, t: FaceHandle) -> [DVec2; 3] {
    let a = self.face_anchor(t);
    [self.org(a), self.dest(a), self.org(self.lprev(a))]
  }

  // ===========================================================================
  // Point-edge predicates
  // ===========================================================================

  pub fn point_right_of(&self, x: DVec2, e: EdgeHandle) -> bool {
    crate::geometry::right_of(x, self.org(e), self.dest(e))
  }

  pub fn point_left_of(&self, x: DVec2, e: EdgeHandle) -> bool {
    crate::geometry::left_of(x, self.org(e), self.dest(e))
  }
}

#[cfg(test)]
#[path = "quadedge_test.rs"]
mod quadedge_test;
