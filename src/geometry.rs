//! Exact integer predicates shared by the splitter, connector and classifier.
//!
//! `x` is longitude and `y` is latitude throughout; a positive signed area
//! means counter-clockwise winding.

use crate::coordinate_system::{BBox, Coord};

/// Where a point lies relative to a closed ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PointLocation {
    Inside,
    OnBoundary,
    Outside,
}

/// Twice the signed area of a ring. The closing edge is implied when the
/// sequence is not explicitly closed.
pub fn signed_area2(points: &[Coord]) -> i64 {
    if points.len() < 3 {
        return 0;
    }
    let origin = points[0];
    let mut sum: i64 = 0;
    for i in 0..points.len() {
        let a = points[i];
        let b = points[(i + 1) % points.len()];
        let ax = a.lon as i64 - origin.lon as i64;
        let ay = a.lat as i64 - origin.lat as i64;
        let bx = b.lon as i64 - origin.lon as i64;
        let by = b.lat as i64 - origin.lat as i64;
        sum += ax * by - bx * ay;
    }
    sum
}

/// Orientation of `c` relative to the directed line `a -> b`:
/// positive for left, negative for right, zero for collinear.
pub fn orientation(a: Coord, b: Coord, c: Coord) -> i128 {
    let abx = b.lon as i128 - a.lon as i128;
    let aby = b.lat as i128 - a.lat as i128;
    let acx = c.lon as i128 - a.lon as i128;
    let acy = c.lat as i128 - a.lat as i128;
    abx * acy - aby * acx
}

/// True when `p` lies on the closed segment `a - b`.
pub fn on_segment(p: Coord, a: Coord, b: Coord) -> bool {
    orientation(a, b, p) == 0
        && p.lon >= a.lon.min(b.lon)
        && p.lon <= a.lon.max(b.lon)
        && p.lat >= a.lat.min(b.lat)
        && p.lat <= a.lat.max(b.lat)
}

/// Proper crossing: the segments intersect in a single point interior to both.
/// Touching at an endpoint or overlapping collinearly is not a crossing.
pub fn segments_cross(a: Coord, b: Coord, c: Coord, d: Coord) -> bool {
    let o1 = orientation(a, b, c).signum();
    let o2 = orientation(a, b, d).signum();
    let o3 = orientation(c, d, a).signum();
    let o4 = orientation(c, d, b).signum();
    o1 * o2 < 0 && o3 * o4 < 0
}

/// Any shared point, touching included.
pub fn segments_intersect(a: Coord, b: Coord, c: Coord, d: Coord) -> bool {
    if segments_cross(a, b, c, d) {
        return true;
    }
    on_segment(c, a, b) || on_segment(d, a, b) || on_segment(a, c, d) || on_segment(b, c, d)
}

/// Locates `p` against a ring given as a point sequence (closing edge implied).
pub fn locate_point(p: Coord, ring: &[Coord]) -> PointLocation {
    locate_scaled(p.lon as i64, p.lat as i64, ring, 1)
}

/// Locates the midpoint of `a - b` exactly by working in doubled coordinates.
pub fn locate_midpoint(a: Coord, b: Coord, ring: &[Coord]) -> PointLocation {
    locate_scaled(
        a.lon as i64 + b.lon as i64,
        a.lat as i64 + b.lat as i64,
        ring,
        2,
    )
}

fn locate_scaled(px: i64, py: i64, ring: &[Coord], scale: i64) -> PointLocation {
    let n = ring.len();
    if n < 3 {
        return PointLocation::Outside;
    }
    let mut inside = false;
    for i in 0..n {
        let a = ring[i];
        let b = ring[(i + 1) % n];
        let (ax, ay) = (a.lon as i64 * scale, a.lat as i64 * scale);
        let (bx, by) = (b.lon as i64 * scale, b.lat as i64 * scale);

        let cross = (bx - ax) as i128 * (py - ay) as i128 - (by - ay) as i128 * (px - ax) as i128;
        if cross == 0
            && px >= ax.min(bx)
            && px <= ax.max(bx)
            && py >= ay.min(by)
            && py <= ay.max(by)
        {
            return PointLocation::OnBoundary;
        }

        if (ay > py) != (by > py) {
            // the edge's x at height py lies right of px
            let right_of_point = if by > ay { cross > 0 } else { cross < 0 };
            if right_of_point {
                inside = !inside;
            }
        }
    }
    if inside {
        PointLocation::Inside
    } else {
        PointLocation::Outside
    }
}

/// True when the segment `a - b` enters the open interior of `bounds`.
///
/// Checked exactly: a proper crossing with any of the four edges, or a
/// chord whose midpoint lies strictly inside. Running along or touching the
/// border does not count.
pub fn segment_crosses_bbox(a: Coord, b: Coord, bounds: &BBox) -> bool {
    if bounds.contains_strict(a) || bounds.contains_strict(b) {
        return true;
    }
    let corners = bounds.corners();
    for i in 0..4 {
        if segments_cross(a, b, corners[i], corners[(i + 1) % 4]) {
            return true;
        }
    }
    let mx = a.lon as i64 + b.lon as i64;
    let my = a.lat as i64 + b.lat as i64;
    mx > 2 * bounds.min_lon as i64
        && mx < 2 * bounds.max_lon as i64
        && my > 2 * bounds.min_lat as i64
        && my < 2 * bounds.max_lat as i64
}
