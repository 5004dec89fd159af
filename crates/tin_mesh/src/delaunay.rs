//! Incremental Delaunay triangulation on the quad-edge substrate.
//!
//! Point location walks half-edges from a hint; insertion builds a spoke
//! fan around the new site and legalizes the surrounding edges with the
//! incircle test. Engines hook the `scan` callback to re-examine every
//! triangle incident to an inserted point.

use glam::DVec2;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use smallvec::SmallVec;

use crate::geometry::{ccw, in_circle, left_of, tri_area, BBox2D, Line, EPS};
use crate::quadedge::{EdgeHandle, FaceHandle, Subdivision};

/// Fixed seed for the locate tie-breaker; mandatory for reproducible
/// meshing runs.
const LOCATE_RNG_SEED: u64 = 42;

/// Callback invoked for each face incident to a freshly inserted point.
pub type ScanFn<'a> = dyn FnMut(&Subdivision, FaceHandle) + 'a;

pub struct DelaunayMesh {
  sub: Subdivision,
  rng: StdRng,
  starting_edge: EdgeHandle,
  first_face: FaceHandle,
}

impl Default for DelaunayMesh {
  fn default() -> Self {
    Self::new()
  }
}

impl DelaunayMesh {
  pub fn new() -> Self {
    DelaunayMesh {
      sub: Subdivision::new(),
      rng: StdRng::seed_from_u64(LOCATE_RNG_SEED),
      starting_edge: EdgeHandle::NONE,
      first_face: FaceHandle::NONE,
    }
  }

  pub fn sub(&self) -> &Subdivision {
    &self.sub
  }

  /// Head of the face linked list, in reverse insertion order.
  pub fn first_face(&self) -> FaceHandle {
    self.first_face
  }

  /// Iterate all faces following the linked list.
  pub fn faces(&self) -> FaceIter<'_> {
    FaceIter {
      sub: &self.sub,
      current: self.first_face,
    }
  }

  fn next_random_bit(&mut self) -> bool {
    self.rng.random::<u32>() & 1 == 0
  }

  fn make_face(&mut self, e: EdgeHandle) -> FaceHandle {
    let t = self.sub.spawn_face(e);
    self.sub.set_face_link(t, self.first_face);
    self.first_face = t;
    t
  }

  /// Seed the triangulation with the CCW quadrilateral (a, b, c, d):
  /// four boundary edges plus the a-c diagonal, two faces.
  pub fn init_mesh(&mut self, a: DVec2, b: DVec2, c: DVec2, d: DVec2) {
    let ea = self.sub.make_edge();
    self.sub.set_endpoints(ea, a, b);

    let eb = self.sub.make_edge();
    let sym_ea = self.sub.sym(ea);
    self.sub.splice(sym_ea, eb);
    self.sub.set_endpoints(eb, b, c);

    let ec = self.sub.make_edge();
    let sym_eb = self.sub.sym(eb);
    self.sub.splice(sym_eb, ec);
    self.sub.set_endpoints(ec, c, d);

    let ed = self.sub.make_edge();
    let sym_ec = self.sub.sym(ec);
    self.sub.splice(sym_ec, ed);
    self.sub.set_endpoints(ed, d, a);
    let sym_ed = self.sub.sym(ed);
    self.sub.splice(sym_ed, ea);

    let diag = self.sub.make_edge();
    let sym_ed = self.sub.sym(ed);
    self.sub.splice(sym_ed, diag);
    let sym_eb = self.sub.sym(eb);
    let sym_diag = self.sub.sym(diag);
    self.sub.splice(sym_eb, sym_diag);
    self.sub.set_endpoints(diag, a, c);

    self.starting_edge = ea;
    self.first_face = FaceHandle::NONE;

    let sym_ea = self.sub.sym(ea);
    self.make_face(sym_ea);
    let sym_ec = self.sub.sym(ec);
    self.make_face(sym_ec);
  }

  /// Convenience seeding from a 2D bounding box, corners in perimeter
  /// order with the a-c diagonal.
  pub fn init_mesh_from_bbox(&mut self, bb: &BBox2D) {
    let a = bb.min;
    let b = DVec2::new(bb.min.x, bb.max.y);
    let c = bb.max;
    let d = DVec2::new(bb.max.x, bb.min.y);
    self.init_mesh(a, b, c, d);
  }

  fn delete_edge(&mut self, e: EdgeHandle) {
    let op = self.sub.oprev(e);
    self.sub.splice(e, op);
    let s = self.sub.sym(e);
    let sop = self.sub.oprev(s);
    self.sub.splice(s, sop);
    // records stay in the pool; the wires are simply detached
  }

  /// New edge from a.dest to b.org inside the face left of both.
  fn connect(&mut self, a: EdgeHandle, b: EdgeHandle) -> EdgeHandle {
    let e = self.sub.make_edge();
    let a_lnext = self.sub.lnext(a);
    self.sub.splice(e, a_lnext);
    let sym_e = self.sub.sym(e);
    self.sub.splice(sym_e, b);
    let org = self.sub.dest(a);
    let dest = self.sub.org(b);
    self.sub.set_endpoints(e, org, dest);
    e
  }

  /// Flip the diagonal of the quadrilateral spanning e.
  fn swap(&mut self, e: EdgeHandle) {
    let f1 = self.sub.lface(e);
    let f2 = {
      let s = self.sub.sym(e);
      self.sub.lface(s)
    };

    let a = self.sub.oprev(e);
    let sym_e = self.sub.sym(e);
    let b = self.sub.oprev(sym_e);

    self.sub.splice(e, a);
    self.sub.splice(sym_e, b);
    let a_lnext = self.sub.lnext(a);
    self.sub.splice(e, a_lnext);
    let b_lnext = self.sub.lnext(b);
    self.sub.splice(sym_e, b_lnext);

    let org = self.sub.dest(a);
    let dest = self.sub.dest(b);
    self.sub.set_endpoints(e, org, dest);

    self.sub.reshape(f1, e);
    let sym_e = self.sub.sym(e);
    self.sub.reshape(f2, sym_e);
  }

  /// True when e lies on the counter-clockwise hull boundary.
  fn ccw_boundary(&self, e: EdgeHandle) -> bool {
    let op = self.sub.oprev(e);
    let op_dest = self.sub.dest(op);
    !crate::geometry::right_of(op_dest, self.sub.org(e), self.sub.dest(e))
  }

  /// True when x lies on the edge e (within the predicate tolerance).
  fn on_edge(&self, x: DVec2, e: EdgeHandle) -> bool {
    let org = self.sub.org(e);
    let dest = self.sub.dest(e);

    let t1 = (x - org).length();
    let t2 = (x - dest).length();
    if t1 < EPS || t2 < EPS {
      return true;
    }

    let t3 = (org - dest).length();
    if t1 > t3 || t2 > t3 {
      return false;
    }

    let line = Line::new(org, dest);
    line.eval(x).abs() < EPS
  }

  /// An edge is interior when both its orbits close into triangles.
  pub fn is_interior(&self, e: EdgeHandle) -> bool {
    let l3 = self.sub.lnext(self.sub.lnext(self.sub.lnext(e)));
    let r3 = self.sub.rnext(self.sub.rnext(self.sub.rnext(e)));
    l3 == e && r3 == e
  }

  fn should_swap(&self, x: DVec2, e: EdgeHandle) -> bool {
    let t = self.sub.oprev(e);
    in_circle(self.sub.org(e), self.sub.dest(t), self.sub.dest(e), x)
  }

  /// Locate the edge whose left face contains x (or whose origin is x),
  /// walking from the remembered starting edge.
  pub fn locate(&mut self, x: DVec2) -> EdgeHandle {
    self.locate_from(x, self.starting_edge)
  }

  /// Locate walking from `start`. Symmetric ties break on a fixed-seed
  /// pseudo-random bit so runs are reproducible.
  pub fn locate_from(&mut self, x: DVec2, start: EdgeHandle) -> EdgeHandle {
    let mut e = start;
    let mut t = tri_area(x, self.sub.dest(e), self.sub.org(e));

    if t > 0.0 {
      // x is to the right of edge e
      t = -t;
      e = self.sub.sym(e);
    }

    loop {
      let eo = self.sub.onext(e);
      let ed = self.sub.dprev(e);

      let to = tri_area(x, self.sub.dest(eo), self.sub.org(eo));
      let td = tri_area(x, self.sub.dest(ed), self.sub.org(ed));

      if td > 0.0 {
        // x is below ed
        if to > 0.0 || (to == 0.0 && t == 0.0) {
          // x is interior, or origin endpoint
          self.starting_edge = e;
          return e;
        } else {
          // x is below ed, below eo
          t = to;
          e = eo;
        }
      } else {
        // x is on or above ed
        if to > 0.0 {
          // x is above eo
          if td == 0.0 && t == 0.0 {
            // x is destination endpoint
            self.starting_edge = e;
            return e;
          } else {
            // x is on or above ed and above eo
            t = td;
            e = ed;
          }
        } else {
          // x is on or below eo
          let eo_dest = self.sub.dest(eo);
          if t == 0.0 && !left_of(eo_dest, self.sub.org(e), self.sub.dest(e)) {
            // x on e but the mesh is to the right
            e = self.sub.sym(e);
          } else if self.next_random_bit() {
            // x is on or above ed and on or below eo; step randomly
            t = to;
            e = eo;
          } else {
            t = td;
            e = ed;
          }
        }
      }
    }
  }

  /// Wire the spoke fan from x to the surrounding vertices. `e` anchors
  /// the face (or edge) x lands in. Returns the first spoke, pointing
  /// from x's hub outwards.
  fn spoke(&mut self, x: DVec2, e: EdgeHandle) -> EdgeHandle {
    let mut reusable_faces: SmallVec<[FaceHandle; 4]> = SmallVec::new();
    let mut boundary_edge = EdgeHandle::NONE;
    let mut e = e;

    let lface = self.sub.lface(e);
    self.sub.dont_anchor(lface, e);
    reusable_faces.push(lface);

    if self.on_edge(x, e) {
      if self.ccw_boundary(e) {
        // e lies on the boundary; defer deletion until the fan is built
        boundary_edge = e;
      } else {
        let sym_e = self.sub.sym(e);
        let sym_lface = self.sub.lface(sym_e);
        self.sub.dont_anchor(sym_lface, sym_e);
        reusable_faces.push(sym_lface);

        e = self.sub.oprev(e);
        let doomed = self.sub.onext(e);
        self.delete_edge(doomed);
      }
    }

    let base = self.sub.make_edge();
    let e_org = self.sub.org(e);
    self.sub.set_endpoints(base, e_org, x);
    self.sub.splice(base, e);

    self.starting_edge = base;
    let mut base = base;
    loop {
      let sym_base = self.sub.sym(base);
      base = self.connect(e, sym_base);
      e = self.sub.oprev(base);
      if self.sub.lnext(e) == self.starting_edge {
        break;
      }
    }

    if boundary_edge.is_some() {
      self.delete_edge(boundary_edge);
    }

    // update all faces of the new spoked polygon; when x sits on the
    // perimeter no exterior face is added
    let mut walk = if boundary_edge.is_some() {
      self.sub.rprev(self.starting_edge)
    } else {
      self.sub.sym(self.starting_edge)
    };
    let stop = self.sub.sym(self.starting_edge);

    loop {
      if let Some(f) = reusable_faces.pop() {
        self.sub.reshape(f, walk);
      } else {
        self.make_face(walk);
      }
      walk = self.sub.onext(walk);
      if walk == stop {
        break;
      }
    }

    self.starting_edge
  }

  /// Legalize the edges around x, then hand every incident triangle to
  /// `scan`. `s` is a spoke pointing out from x.
  fn optimize(&mut self, x: DVec2, s: EdgeHandle, scan: &mut ScanFn<'_>) {
    let start_spoke = s;
    let mut spoke = s;

    loop {
      let e = self.sub.lnext(spoke);
      if self.is_interior(e) && self.should_swap(x, e) {
        self.swap(e);
      } else {
        spoke = self.sub.onext(spoke);
        if spoke == start_spoke {
          break;
        }
      }
    }

    // now rescan all triangles incident to x
    let mut spoke = start_spoke;
    loop {
      let e = self.sub.lnext(spoke);
      let t = self.sub.lface(e);
      if t.is_some() {
        scan(&self.sub, t);
      }
      spoke = self.sub.onext(spoke);
      if spoke == start_spoke {
        break;
      }
    }
  }

  /// Insert site x, using `hint` as the locate start when valid.
  ///
  /// Existing vertices are not duplicated; inserting a point equal to a
  /// mesh vertex only re-optimizes its surroundings.
  pub fn insert(&mut self, x: DVec2, hint: FaceHandle, scan: &mut ScanFn<'_>) {
    let e = if hint.is_some() {
      let anchor = self.sub.face_anchor(hint);
      self.locate_from(x, anchor)
    } else {
      self.locate(x)
    };

    if x == self.sub.org(e) || x == self.sub.dest(e) {
      // point is already in the mesh; update the triangles around it
      self.optimize(x, e, scan);
    } else {
      let start_spoke = self.spoke(x, e);
      let sym_spoke = self.sub.sym(start_spoke);
      self.optimize(x, sym_spoke, scan);
    }
  }

  /// True when the three face corners wind counter-clockwise.
  pub fn face_is_ccw(&self, t: FaceHandle) -> bool {
    let [p1, p2, p3] = self.sub.face_points(t);
    ccw(p1, p2, p3)
  }
}

/// Iterator over the face linked list.
pub struct FaceIter<'a> {
  sub: &'a Subdivision,
  current: FaceHandle,
}

impl Iterator for FaceIter<'_> {
  type Item = FaceHandle;

  fn next(&mut self) -> Option<FaceHandle> {
    if self.current.is_none() {
      return None;
    }
    let t = self.current;
    self.current = self.sub.face_link(t);
    Some(t)
  }
}

#[cfg(test)]
#[path = "delaunay_test.rs"]
mod delaunay_test;
