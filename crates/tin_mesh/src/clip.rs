//! Clipping of 2.5D triangles (2D triangles carrying z) against directed
//! lines, and against the unit quadrant used for tile emission.
//!
//! A clip line keeps the left half-plane. Triangles that fall away are
//! marked with NaN vertices and swept at the end of a clip pass.

use glam::{DVec2, DVec3};

use crate::geometry::Triangle;

const CLIP_EPS: f64 = 1e-9;

fn abs_zero(v: DVec3) -> DVec3 {
  DVec3::new(
    if v.x == -0.0 { 0.0 } else { v.x },
    if v.y == -0.0 { 0.0 } else { v.y },
    if v.z == -0.0 { 0.0 } else { v.z },
  )
}

/// Intersection of the 2.5D segment p0-p1 with the 2D line through
/// `l_org` along `l_dir`; z is interpolated linearly by 2D distance.
/// NaN when the lines are (close to) parallel or the crossing lies
/// outside the segment.
pub fn intersect_25d_segment_line(p0: DVec3, p1: DVec3, l_org: DVec2, l_dir: DVec2) -> DVec3 {
  let x3 = l_org.x;
  let x4 = l_org.x + l_dir.x;
  let y3 = l_org.y;
  let y4 = l_org.y + l_dir.y;

  let denom = (p0.x - p1.x) * (y3 - y4) - (p0.y - p1.y) * (x3 - x4);
  if denom.abs() < CLIP_EPS {
    return DVec3::NAN;
  }

  let d01 = p0.x * p1.y - p0.y * p1.x;
  let d34 = x3 * y4 - y3 * x4;
  let cx = (d01 * (x3 - x4) - (p0.x - p1.x) * d34) / denom;
  let cy = (d01 * (y3 - y4) - (p0.y - p1.y) * d34) / denom;

  // z = m*d + n along the segment
  let d_p0p1 = p0.truncate().distance(p1.truncate());
  let m = (p1.z - p0.z) / d_p0p1;
  let n = p0.z;

  let d_p0c = p0.truncate().distance(DVec2::new(cx, cy));
  if d_p0c < -CLIP_EPS || d_p0c > d_p0p1 + CLIP_EPS {
    return DVec3::NAN;
  }

  abs_zero(DVec3::new(cx, cy, m * d_p0c + n))
}

/// Side of `p` relative to the directed line: -1 left, 0 on, +1 right.
///
/// Axis-aligned lines are compared exactly so that points on a clip edge
/// classify as on it; other directions fall back to the cross product.
pub fn sign_2d(p: DVec3, l_org: DVec2, l_dir: DVec2) -> i32 {
  if l_dir.x == 0.0 {
    // left-right clipping
    let direction_sign = if l_dir.y > 0.0 { -1 } else { 1 };
    if p.x < l_org.x {
      direction_sign
    } else if p.x > l_org.x {
      -direction_sign
    } else {
      0
    }
  } else if l_dir.y == 0.0 {
    // top-bottom clipping
    let direction_sign = if l_dir.x > 0.0 { -1 } else { 1 };
    if p.y < l_org.y {
      -direction_sign
    } else if p.y > l_org.y {
      direction_sign
    } else {
      0
    }
  } else {
    let d = (p.x - l_org.x) * l_dir.y - (p.y - l_org.y) * l_dir.x;
    if d < CLIP_EPS {
      -1
    } else if d > CLIP_EPS {
      1
    } else {
      0
    }
  }
}

/// -1/0/+1 comparison of the squared lengths of segments a and b.
pub fn compare_length(a1: DVec3, a2: DVec3, b1: DVec3, b2: DVec3) -> i32 {
  let da_sq = a1.distance_squared(a2);
  let db_sq = b1.distance_squared(b2);

  if da_sq < db_sq {
    -1
  } else if da_sq == db_sq {
    0
  } else {
    1
  }
}

fn has_nans(t: &Triangle) -> bool {
  t.iter().any(|v| v.x.is_nan() || v.y.is_nan() || v.z.is_nan())
}

#[inline]
fn is_front_facing(t: &Triangle) -> bool {
  let n_z = (t[0].x - t[1].x) * (t[0].y - t[2].y) - (t[0].x - t[2].x) * (t[0].y - t[1].y);
  n_z >= 0.0
}

pub fn make_front_facing(t: &mut Triangle) {
  if !is_front_facing(t) {
    t.swap(0, 1);
  }
}

/// Clip the triangle at `triangle_idx` against a directed line, keeping
/// the left half-plane. May append one extra triangle to `tv` (the
/// two-left-points case splits the remaining quad along its shorter
/// diagonal to avoid slivers). Fully discarded triangles are NaN-marked.
pub fn clip_triangle_by_line(
  tv: &mut Vec<Triangle>,
  triangle_idx: usize,
  l_org: DVec2,
  l_dir: DVec2,
) {
  if has_nans(&tv[triangle_idx]) {
    return;
  }

  let mut left_points = [DVec3::ZERO; 3];
  let mut other_points = [DVec3::ZERO; 3];
  let mut other_signs = [0i32; 3];
  let mut num_left = 0usize;
  let mut num_other = 0usize;

  for point in &tv[triangle_idx] {
    let d = sign_2d(*point, l_org, l_dir);
    if d < 0 {
      left_points[num_left] = *point;
      num_left += 1;
    } else {
      other_points[num_other] = *point;
      other_signs[num_other] = d;
      num_other += 1;
    }
  }

  match num_left {
    0 => {
      // nothing survives; mark for the sweep
      tv[triangle_idx][0] = DVec3::NAN;
    }
    1 => {
      // a vertex exactly on the line is kept as its own intersection
      let s0 = if other_signs[0] == 0 {
        other_points[0]
      } else {
        intersect_25d_segment_line(left_points[0], other_points[0], l_org, l_dir)
      };
      let s1 = if other_signs[1] == 0 {
        other_points[1]
      } else {
        intersect_25d_segment_line(left_points[0], other_points[1], l_org, l_dir)
      };

      let t = &mut tv[triangle_idx];
      t[0] = left_points[0];
      t[1] = s0;
      t[2] = s1;
      make_front_facing(t);
    }
    2 => {
      if other_signs[0] == 0 {
        // third point already on the clip line, keep the triangle
        return;
      }

      let s0 = intersect_25d_segment_line(other_points[0], left_points[0], l_org, l_dir);
      let s1 = intersect_25d_segment_line(other_points[0], left_points[1], l_org, l_dir);

      // split the quad along the shorter of the two candidate diagonals
      let d0_d1_cmp = compare_length(s0, left_points[1], s1, left_points[0]);

      let t = &mut tv[triangle_idx];
      t[0] = if d0_d1_cmp >= 0 { s1 } else { s0 };
      t[1] = left_points[0];
      t[2] = left_points[1];
      make_front_facing(t);

      let mut t_new: Triangle = [
        s1,
        s0,
        if d0_d1_cmp >= 0 {
          left_points[0]
        } else {
          left_points[1]
        },
      ];
      make_front_facing(&mut t_new);
      tv.push(t_new);
    }
    _ => {
      // all three strictly left; keep as is
    }
  }
}

/// Clip triangles against the four edges of the unit square, in the order
/// bottom, right, top, left, then sweep the NaN-marked ones.
///
/// ```text
///   (0,1)     (1,1)
///        +---+
///        |   |     winding order: counter-clockwise = inside
///        +---+
///   (0,0)     (1,0)
/// ```
pub fn clip_triangles_to_unit_quadrant(tv: &mut Vec<Triangle>) {
  let edges: [(DVec2, DVec2); 4] = [
    (DVec2::new(0.0, 0.0), DVec2::new(1.0, 0.0)),  // bottom, right-wards
    (DVec2::new(1.0, 0.0), DVec2::new(0.0, 1.0)),  // right, upwards
    (DVec2::new(1.0, 1.0), DVec2::new(-1.0, 0.0)), // top, left-wards
    (DVec2::new(0.0, 1.0), DVec2::new(0.0, -1.0)), // left, downwards
  ];

  for (l_org, l_dir) in edges {
    let tv_size = tv.len();
    for i in 0..tv_size {
      clip_triangle_by_line(tv, i, l_org, l_dir);
    }
  }

  tv.retain(|t| !has_nans(t));
}

#[cfg(test)]
#[path = "clip_test.rs"]
mod clip_test;
