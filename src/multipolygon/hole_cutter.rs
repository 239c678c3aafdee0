//! Cuts holes into an outer ring by bridging each hole to the boundary.
//!
//! The result is a single weakly simple ring: each hole is entered and left
//! through a zero-width horizontal bridge, so the ring's signed area equals the
//! outer area minus the hole areas.

use crate::coordinate_system::{Coord, CoordArena, CoordId};
use crate::error::{MultiPolygonError, Result};
use crate::geometry::signed_area2;
use log::debug;

/// Returns the outer ring (closed, counter-clockwise when holes were cut)
/// with every hole spliced in. Without holes the outer ring is returned as is.
pub fn cut_holes(
    arena: &mut CoordArena,
    outer: &[CoordId],
    holes: &[&[CoordId]],
) -> Result<Vec<CoordId>> {
    if holes.is_empty() {
        return Ok(outer.to_vec());
    }

    let mut boundary = open_ring(arena, outer);
    if boundary.len() < 3 {
        return Err(MultiPolygonError::Degenerate(format!(
            "outer ring with {} distinct point(s)",
            boundary.len()
        )));
    }
    if signed_area2(&arena.resolve(&boundary)) < 0 {
        boundary.reverse();
    }

    let mut prepared: Vec<Vec<CoordId>> = Vec::with_capacity(holes.len());
    for hole in holes {
        let mut hole = open_ring(arena, hole);
        let area2 = signed_area2(&arena.resolve(&hole));
        if hole.len() < 3 || area2 == 0 {
            debug!("Skipping degenerate hole with {} point(s)", hole.len());
            continue;
        }
        if area2 > 0 {
            hole.reverse();
        }
        prepared.push(hole);
    }

    // rightmost hole first, so later bridges can end on earlier holes
    prepared.sort_by_cached_key(|hole| {
        std::cmp::Reverse(hole.iter().map(|&id| arena.get(id).lon).max().unwrap_or(i32::MIN))
    });

    for hole in prepared {
        if !bridge_hole(arena, &mut boundary, &hole) {
            debug!("No boundary found east of hole with {} point(s), skipping it", hole.len());
        }
    }

    if let Some(&first) = boundary.first() {
        boundary.push(first);
    }
    Ok(boundary)
}

fn open_ring(arena: &CoordArena, ring: &[CoordId]) -> Vec<CoordId> {
    let mut points = ring.to_vec();
    if points.len() > 1 {
        if let (Some(&first), Some(&last)) = (points.first(), points.last()) {
            if arena.same_location(first, last) {
                points.pop();
            }
        }
    }
    points
}

/// Splices `hole` into `boundary` through a bridge from the hole's eastmost
/// vertex to the nearest boundary edge in the east.
fn bridge_hole(arena: &mut CoordArena, boundary: &mut Vec<CoordId>, hole: &[CoordId]) -> bool {
    let coords: Vec<Coord> = arena.resolve(hole);
    let Some(m) = (0..hole.len()).max_by_key(|&i| (coords[i].lon, coords[i].lat))
    else {
        return false;
    };
    let anchor = coords[m];

    let Some((edge, x)) = nearest_edge_east(arena, boundary, anchor) else {
        return false;
    };

    let n = boundary.len();
    let a = arena.get(boundary[edge]);
    let b = arena.get(boundary[(edge + 1) % n]);
    // nearest grid point to the crossing, never west of the anchor
    let hit = Coord::new(anchor.lat, (x.round() as i32).max(anchor.lon));

    let insert_after = if a == hit {
        edge
    } else if b == hit {
        (edge + 1) % n
    } else {
        let bridge = arena.pooled(hit);
        boundary.insert(edge + 1, bridge);
        edge + 1
    };
    let bridge = boundary[insert_after];

    let mut splice: Vec<CoordId> = Vec::with_capacity(hole.len() + 2);
    splice.extend(hole[m..].iter().chain(hole[..m].iter()));
    splice.push(hole[m]);
    splice.push(bridge);
    boundary.splice(insert_after + 1..insert_after + 1, splice);
    true
}

/// Edge of `boundary` hit first by a ray from `from` towards increasing
/// longitude, with the longitude of the hit.
fn nearest_edge_east(arena: &CoordArena, boundary: &[CoordId], from: Coord) -> Option<(usize, f64)> {
    let n = boundary.len();
    let y = from.lat as f64;
    let mut best: Option<(usize, f64)> = None;

    for i in 0..n {
        let a = arena.get(boundary[i]);
        let b = arena.get(boundary[(i + 1) % n]);
        if a.lat == b.lat {
            continue;
        }
        if from.lat < a.lat.min(b.lat) || from.lat > a.lat.max(b.lat) {
            continue;
        }
        let t = (y - a.lat as f64) / (b.lat as f64 - a.lat as f64);
        let x = a.lon as f64 + t * (b.lon as f64 - a.lon as f64);
        if x < from.lon as f64 {
            continue;
        }
        if best.is_none_or(|(_, bx)| x < bx) {
            best = Some((i, x));
        }
    }
    best
}
