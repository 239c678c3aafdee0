//! Joins the member ways of a relation into closed rings.

use super::diagnostics::{Diagnostic, Diagnostics};
use super::ring::{RoleMask, Ring, SourceWay};
use crate::coordinate_system::{CoordArena, CoordId};
use crate::osm_parser::ProcessedRelation;
use fnv::{FnvHashMap, FnvHashSet};
use log::debug;

#[derive(Debug, Default)]
pub struct JoinResult {
    pub closed: Vec<Ring>,
    /// Chains that could not be closed from the member ways alone.
    pub open: Vec<Ring>,
}

/// Turns every usable member way into a single-way ring.
///
/// Duplicate members and ways with fewer than two points are dropped. A way
/// that is closed in the source but arrives cut short is closed with a
/// straight segment.
pub fn collect_members(
    relation: &ProcessedRelation,
    arena: &mut CoordArena,
    diagnostics: &mut Diagnostics,
) -> Vec<Ring> {
    let mut seen: FnvHashSet<u64> = FnvHashSet::default();
    let mut rings = Vec::with_capacity(relation.members.len());

    for (index, member) in relation.members.iter().enumerate() {
        let way = &member.way;
        if !seen.insert(way.id) {
            diagnostics.record(Diagnostic::DuplicateMember { way_id: way.id });
            continue;
        }
        if way.nodes.len() < 2 {
            diagnostics.record(Diagnostic::TooFewPoints {
                way_id: way.id,
                points: way.nodes.len(),
            });
            continue;
        }

        let points: Vec<CoordId> = way
            .nodes
            .iter()
            .map(|node| arena.node(node.id, node.coord))
            .collect();
        let source = SourceWay {
            member: index,
            way_id: way.id,
        };
        let mut ring = Ring::new(arena, points, RoleMask::from(member.role), vec![source]);

        if !ring.is_closed() && !ring.close_if_coincident(arena) && way.closed_in_source {
            ring.close_artificially(arena);
            diagnostics.record(Diagnostic::ArtificiallyClosed { way_id: way.id });
        }
        rings.push(ring);
    }

    rings
}

/// Joins single-way rings into maximal closed rings.
pub fn join_ways(
    rings: Vec<Ring>,
    arena: &CoordArena,
    diagnostics: &mut Diagnostics,
) -> JoinResult {
    let mut result = JoinResult::default();

    let open = join_in_order(rings, &mut result.closed);
    let open = join_by_index(open, &mut result.closed);

    for mut ring in open {
        if ring.close_if_coincident(arena) {
            result.closed.push(ring);
        } else {
            result.open.push(ring);
        }
    }

    for ring in result.closed.iter_mut() {
        ring.refresh(arena);
    }
    for ring in result.closed.iter().chain(result.open.iter()) {
        if ring.roles.is_mixed() {
            diagnostics.record(Diagnostic::MixedRoles {
                way_ids: ring.way_ids(),
            });
        }
    }

    debug!(
        "Relation {}: joined {} closed and {} open ring(s)",
        diagnostics.relation_id(),
        result.closed.len(),
        result.open.len()
    );
    result
}

/// Appends `segment` to `chain` when they share an end vertex.
fn join_segments(chain: &mut Ring, segment: &Ring) -> bool {
    let (Some(chain_first), Some(chain_last), Some(seg_first), Some(seg_last)) =
        (chain.first(), chain.last(), segment.first(), segment.last())
    else {
        return false;
    };

    let points: Vec<CoordId> = if chain_last == seg_first {
        chain
            .points
            .iter()
            .chain(segment.points.iter().skip(1))
            .copied()
            .collect()
    } else if chain_last == seg_last {
        chain
            .points
            .iter()
            .chain(segment.points.iter().rev().skip(1))
            .copied()
            .collect()
    } else if chain_first == seg_last {
        segment
            .points
            .iter()
            .chain(chain.points.iter().skip(1))
            .copied()
            .collect()
    } else if chain_first == seg_first {
        segment
            .points
            .iter()
            .rev()
            .chain(chain.points.iter().skip(1))
            .copied()
            .collect()
    } else {
        return false;
    };

    chain.points = points;
    chain.absorb(segment);
    true
}

/// First pass: extend the current chain with the next way for as long as
/// consecutive members connect.
fn join_in_order(rings: Vec<Ring>, closed: &mut Vec<Ring>) -> Vec<Ring> {
    let mut open = Vec::new();
    let mut current: Option<Ring> = None;

    for ring in rings {
        if ring.is_closed() {
            closed.push(ring);
            continue;
        }
        let joined = match current.as_mut() {
            Some(chain) => join_segments(chain, &ring),
            None => false,
        };
        if !joined {
            open.extend(current.take());
            current = Some(ring);
        }
        if current.as_ref().is_some_and(Ring::is_closed) {
            closed.extend(current.take());
        }
    }
    open.extend(current);
    open
}

/// Second pass: join the remaining chains through an endpoint index.
fn join_by_index(open: Vec<Ring>, closed: &mut Vec<Ring>) -> Vec<Ring> {
    let mut slots: Vec<Option<Ring>> = open.into_iter().map(Some).collect();
    let mut index: FnvHashMap<CoordId, Vec<usize>> = FnvHashMap::default();
    for (i, ring) in slots.iter().enumerate() {
        if let Some(ring) = ring {
            index_endpoints(&mut index, ring, i);
        }
    }

    loop {
        let mut joined_any = false;
        for i in 0..slots.len() {
            while let Some(partner) = best_partner(&slots, &index, i) {
                let Some(other) = slots[partner].take() else {
                    break;
                };
                let Some(ring) = slots[i].as_mut() else {
                    break;
                };
                unindex_endpoints(&mut index, &other, partner);
                unindex_endpoints(&mut index, ring, i);

                if !join_segments(ring, &other) {
                    // the index only pairs rings sharing an endpoint
                    index_endpoints(&mut index, ring, i);
                    index_endpoints(&mut index, &other, partner);
                    slots[partner] = Some(other);
                    break;
                }
                joined_any = true;

                if ring.is_closed() {
                    closed.extend(slots[i].take());
                    break;
                }
                index_endpoints(&mut index, ring, i);
            }
        }
        if !joined_any {
            break;
        }
    }

    slots.into_iter().flatten().collect()
}

/// Picks the partner for slot `i`: one that closes the ring if any,
/// otherwise the lowest slot index.
fn best_partner(
    slots: &[Option<Ring>],
    index: &FnvHashMap<CoordId, Vec<usize>>,
    i: usize,
) -> Option<usize> {
    let ring = slots[i].as_ref()?;
    let (first, last) = (ring.first()?, ring.last()?);

    let mut candidates: Vec<usize> = [first, last]
        .iter()
        .filter_map(|end| index.get(end))
        .flatten()
        .copied()
        .filter(|&j| j != i && slots[j].is_some())
        .collect();
    candidates.sort_unstable();
    candidates.dedup();

    let closes = |j: usize| {
        slots[j].as_ref().is_some_and(|other| {
            (other.first() == Some(first) && other.last() == Some(last))
                || (other.first() == Some(last) && other.last() == Some(first))
        })
    };
    candidates
        .iter()
        .copied()
        .find(|&j| closes(j))
        .or_else(|| candidates.first().copied())
}

fn index_endpoints(index: &mut FnvHashMap<CoordId, Vec<usize>>, ring: &Ring, slot: usize) {
    for end in [ring.first(), ring.last()].into_iter().flatten() {
        let slots = index.entry(end).or_default();
        if !slots.contains(&slot) {
            slots.push(slot);
        }
    }
}

fn unindex_endpoints(index: &mut FnvHashMap<CoordId, Vec<usize>>, ring: &Ring, slot: usize) {
    for end in [ring.first(), ring.last()].into_iter().flatten() {
        if let Some(slots) = index.get_mut(&end) {
            slots.retain(|&s| s != slot);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::osm_parser::ProcessedMemberRole::{Inner, Outer};
    use crate::test_utilities::{relation, square_way, way};

    fn join(rel: &ProcessedRelation) -> (JoinResult, CoordArena, Diagnostics) {
        let mut arena = CoordArena::new();
        let mut diagnostics = Diagnostics::new(rel.id);
        let rings = collect_members(rel, &mut arena, &mut diagnostics);
        let result = join_ways(rings, &arena, &mut diagnostics);
        (result, arena, diagnostics)
    }

    #[test]
    fn test_two_segments_form_a_square() {
        let rel = relation(
            1,
            &[],
            vec![
                (Outer, way(10, &[(1, 0, 0), (2, 0, 10), (3, 10, 10)])),
                (Outer, way(11, &[(3, 10, 10), (4, 10, 0), (1, 0, 0)])),
            ],
        );
        let (result, _, _) = join(&rel);

        assert!(result.open.is_empty());
        assert_eq!(result.closed.len(), 1);
        let ring = &result.closed[0];
        assert_eq!(ring.len(), 5);
        assert_eq!(ring.first(), ring.last());
        assert_eq!(ring.way_ids(), vec![10, 11]);
        assert_eq!(ring.area2.abs(), 200);
    }

    #[test]
    fn test_out_of_order_segments_join_by_index() {
        let rel = relation(
            1,
            &[],
            vec![
                (Outer, way(10, &[(1, 0, 0), (2, 0, 10)])),
                (Outer, way(11, &[(3, 10, 10), (4, 10, 0)])),
                (Outer, way(12, &[(2, 0, 10), (3, 10, 10)])),
                (Outer, way(13, &[(4, 10, 0), (1, 0, 0)])),
            ],
        );
        let (result, _, _) = join(&rel);

        assert!(result.open.is_empty());
        assert_eq!(result.closed.len(), 1);
        let mut ways = result.closed[0].way_ids();
        ways.sort_unstable();
        assert_eq!(ways, vec![10, 11, 12, 13]);
    }

    #[test]
    fn test_prefers_ring_closing_partner() {
        let rel = relation(
            1,
            &[],
            vec![
                (Outer, way(10, &[(1, 0, 0), (2, 0, 10)])),
                (Outer, way(20, &[(7, 50, 50), (8, 60, 60)])),
                (Outer, way(11, &[(2, 0, 10), (5, 20, 20)])),
                (Outer, way(21, &[(9, 70, 70), (6, 80, 80)])),
                (Outer, way(12, &[(2, 0, 10), (3, 10, 10), (1, 0, 0)])),
            ],
        );
        let (result, _, _) = join(&rel);

        assert_eq!(result.closed.len(), 1);
        assert_eq!(result.closed[0].way_ids(), vec![10, 12]);
        let mut open: Vec<u64> = result.open.iter().flat_map(Ring::way_ids).collect();
        open.sort_unstable();
        assert_eq!(open, vec![11, 20, 21]);
    }

    #[test]
    fn test_closed_rings_close_by_value() {
        let rel = relation(
            1,
            &[],
            vec![
                (Outer, square_way(10, 1, 0, 0, 10)),
                (Outer, way(11, &[(5, 20, 20), (6, 20, 30), (7, 30, 30)])),
                (Outer, way(12, &[(7, 30, 30), (8, 30, 20), (9, 20, 20)])),
            ],
        );
        let (result, arena, _) = join(&rel);

        assert_eq!(result.closed.len(), 2);
        for ring in &result.closed {
            let first = ring.first().unwrap();
            let last = ring.last().unwrap();
            assert_eq!(arena.get(first), arena.get(last));
        }
    }

    #[test]
    fn test_rejects_bad_members() {
        let rel = relation(
            1,
            &[],
            vec![
                (Outer, square_way(10, 1, 0, 0, 10)),
                (Outer, square_way(10, 1, 0, 0, 10)),
                (Outer, way(11, &[(9, 5, 5)])),
            ],
        );
        let (result, _, diagnostics) = join(&rel);

        assert_eq!(result.closed.len(), 1);
        assert_eq!(
            diagnostics.entries(),
            &[
                Diagnostic::DuplicateMember { way_id: 10 },
                Diagnostic::TooFewPoints {
                    way_id: 11,
                    points: 1
                },
            ]
        );
    }

    #[test]
    fn test_incomplete_closed_way_is_closed_artificially() {
        let mut cut = square_way(10, 1, 0, 0, 10);
        cut.nodes.pop();
        assert!(cut.closed_in_source);

        let rel = relation(1, &[], vec![(Outer, cut)]);
        let (result, _, diagnostics) = join(&rel);

        assert_eq!(result.closed.len(), 1);
        assert!(result.closed[0].closed_artificially);
        assert_eq!(
            diagnostics.entries(),
            &[Diagnostic::ArtificiallyClosed { way_id: 10 }]
        );
    }

    #[test]
    fn test_mixed_roles_are_reported() {
        let rel = relation(
            1,
            &[],
            vec![
                (Outer, way(10, &[(1, 0, 0), (2, 0, 10), (3, 10, 10)])),
                (Inner, way(11, &[(3, 10, 10), (4, 10, 0), (1, 0, 0)])),
            ],
        );
        let (result, _, diagnostics) = join(&rel);

        assert_eq!(result.closed.len(), 1);
        assert!(result.closed[0].roles.is_mixed());
        assert_eq!(
            diagnostics.entries(),
            &[Diagnostic::MixedRoles {
                way_ids: vec![10, 11]
            }]
        );
    }
}
