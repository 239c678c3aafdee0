//! Closes chains left open because their ways leave the tile.
//!
//! New segments are only ever added outside of (or along) the tile, so the
//! part of a ring that matters inside the tile is never changed.

use super::diagnostics::{Diagnostic, Diagnostics};
use super::ring::Ring;
use crate::config::MultiPolygonConfig;
use crate::coordinate_system::{BBox, Coord, CoordArena};
use crate::geometry::{segment_crosses_bbox, segments_intersect};
use log::debug;

#[derive(Debug, Default)]
pub struct ConnectResult {
    pub closed: Vec<Ring>,
    /// Chains that could not be closed, already reported.
    pub dropped: Vec<Ring>,
}

const WEST: u8 = 1;
const EAST: u8 = 2;
const SOUTH: u8 = 4;
const NORTH: u8 = 8;

/// Tile sides a point lies on or beyond.
fn outside_sides(coord: Coord, tile: &BBox) -> u8 {
    let mut sides = 0;
    if coord.lon <= tile.min_lon {
        sides |= WEST;
    }
    if coord.lon >= tile.max_lon {
        sides |= EAST;
    }
    if coord.lat <= tile.min_lat {
        sides |= SOUTH;
    }
    if coord.lat >= tile.max_lat {
        sides |= NORTH;
    }
    sides
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum End {
    First,
    Last,
}

#[derive(Debug, Clone, Copy)]
struct Connection {
    from: (usize, End),
    to: (usize, End),
    corner: Option<Coord>,
    cost: f64,
}

pub fn connect_rings(
    open: Vec<Ring>,
    tile: &BBox,
    arena: &mut CoordArena,
    config: &MultiPolygonConfig,
    diagnostics: &mut Diagnostics,
) -> ConnectResult {
    let mut result = ConnectResult::default();
    let mut remaining = Vec::with_capacity(open.len());

    for mut ring in open {
        if can_close_directly(&ring, tile, arena) {
            debug!(
                "Relation {}: closing ring of ways {:?} along the tile border",
                diagnostics.relation_id(),
                ring.way_ids()
            );
            ring.close_artificially(arena);
            result.closed.push(ring);
        } else {
            remaining.push(ring);
        }
    }

    let mut slots: Vec<Option<Ring>> = remaining.into_iter().map(Some).collect();
    while let Some(connection) = cheapest_connection(&slots, tile, arena, config) {
        apply_connection(&mut slots, connection, arena, &mut result.closed);
    }

    for ring in slots.into_iter().flatten() {
        diagnostics.record(Diagnostic::UnclosedRing {
            way_ids: ring.way_ids(),
        });
        result.dropped.push(ring);
    }
    result
}

/// Both ends on or beyond the same tile side, and the closing segment does
/// not touch the ring anywhere but at its own ends.
fn can_close_directly(ring: &Ring, tile: &BBox, arena: &CoordArena) -> bool {
    let coords = ring.coords(arena);
    let (Some(&first), Some(&last)) = (coords.first(), coords.last()) else {
        return false;
    };
    if outside_sides(first, tile) & outside_sides(last, tile) == 0 {
        return false;
    }

    let edges = coords.len().saturating_sub(1);
    (1..edges.saturating_sub(1)).all(|k| !segments_intersect(last, first, coords[k], coords[k + 1]))
}

/// Path from `p` to `q` that stays out of the tile interior, with its length.
fn feasible_path(p: Coord, q: Coord, tile: &BBox) -> Option<(Option<Coord>, f64)> {
    if !segment_crosses_bbox(p, q, tile) {
        return Some((None, p.distance(&q)));
    }
    [Coord::new(p.lat, q.lon), Coord::new(q.lat, p.lon)]
        .into_iter()
        .filter(|&corner| {
            !segment_crosses_bbox(p, corner, tile) && !segment_crosses_bbox(corner, q, tile)
        })
        .map(|corner| (Some(corner), p.distance(&corner) + corner.distance(&q)))
        .min_by(|a, b| a.1.total_cmp(&b.1))
}

fn cheapest_connection(
    slots: &[Option<Ring>],
    tile: &BBox,
    arena: &CoordArena,
    config: &MultiPolygonConfig,
) -> Option<Connection> {
    let mut ends: Vec<((usize, End), Coord)> = Vec::new();
    for (i, ring) in slots.iter().enumerate() {
        let Some(ring) = ring else {
            continue;
        };
        for (end, id) in [(End::First, ring.first()), (End::Last, ring.last())] {
            let Some(id) = id else {
                continue;
            };
            let coord = arena.get(id);
            if config.connect_outside_only && tile.contains_strict(coord) {
                continue;
            }
            ends.push(((i, end), coord));
        }
    }

    let mut best: Option<Connection> = None;
    for (a, &(from, p)) in ends.iter().enumerate() {
        for &(to, q) in &ends[a + 1..] {
            let Some((corner, cost)) = feasible_path(p, q, tile) else {
                continue;
            };
            if best.is_none_or(|b| cost < b.cost) {
                best = Some(Connection {
                    from,
                    to,
                    corner,
                    cost,
                });
            }
        }
    }
    best
}

fn apply_connection(
    slots: &mut [Option<Ring>],
    connection: Connection,
    arena: &mut CoordArena,
    closed: &mut Vec<Ring>,
) {
    let (i, from_end) = connection.from;
    let (j, to_end) = connection.to;
    let corner = connection.corner.map(|c| arena.pooled(c));

    if i == j {
        let Some(mut ring) = slots[i].take() else {
            return;
        };
        ring.points.extend(corner);
        ring.close_artificially(arena);
        closed.push(ring);
        return;
    }

    let (Some(mut ring), Some(mut other)) = (slots[i].take(), slots[j].take()) else {
        return;
    };
    // walk `ring` towards the connecting end, then `other` away from it
    if from_end == End::First {
        ring.reverse();
    }
    if to_end == End::Last {
        other.reverse();
    }
    ring.points.extend(corner);
    ring.points.extend_from_slice(&other.points);
    ring.absorb(&other);
    ring.closed_artificially = true;

    if ring.is_closed() {
        ring.refresh(arena);
        closed.push(ring);
    } else {
        slots[i] = Some(ring);
    }
}
