//! Walks the nesting of a partition from the outside in.
//!
//! Rings alternate between outer and inner levels: the outermost rings are
//! outer, the rings directly inside them are their holes, rings directly
//! inside a hole are islands (outer again), and so on. Each outer ring is
//! emitted with its holes cut out.

use super::containment::ContainmentMatrix;
use super::diagnostics::{Diagnostic, Diagnostics};
use super::hole_cutter::cut_holes;
use super::partition::Partition;
use super::ring::{RoleMask, SourceWay};
use crate::coordinate_system::{CoordArena, CoordId};
use crate::error::Result;
use crate::geometry::signed_area2;
use log::trace;
use std::collections::VecDeque;

/// Where an emitted polygon takes its tags from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TagSource {
    /// The relation's own tags.
    Relation,
    /// Tags shared by these member ways.
    Ways(Vec<SourceWay>),
}

#[derive(Debug, Clone)]
struct PolygonStatus {
    ring: usize,
    outer: bool,
    tags: TagSource,
}

#[derive(Debug, Clone)]
pub struct ResolvedPolygon {
    /// Closed point list, holes spliced in.
    pub points: Vec<CoordId>,
    /// Index of the outer ring in the partition.
    pub ring: usize,
    pub holes: Vec<usize>,
    pub tags: TagSource,
    pub area2: i64,
}

#[derive(Debug, Default)]
pub struct Resolution {
    pub polygons: Vec<ResolvedPolygon>,
    /// Sum of the absolute doubled areas of the emitted polygons.
    pub outer_area2: i64,
    /// `(outer, hole)` ring index pairs, as cut.
    pub hole_links: Vec<(usize, usize)>,
}

/// True when a ring carries the role of the level it was found under,
/// i.e. it nests directly inside a ring of its own role.
fn has_level_role(roles: RoleMask, outer: bool) -> bool {
    if outer {
        roles.is_pure_outer()
    } else {
        roles.is_pure_inner()
    }
}

pub fn resolve_partition(
    arena: &mut CoordArena,
    partition: &Partition,
    diagnostics: &mut Diagnostics,
) -> Result<Resolution> {
    let rings = &partition.rings;
    let matrix = ContainmentMatrix::build(arena, rings, diagnostics)?;
    let n = rings.len();
    // repeated rings are reported by the matrix and never emitted
    let mut finished: Vec<bool> = (0..n).map(|i| matrix.is_duplicate(i)).collect();
    let mut queue: VecDeque<PolygonStatus> = VecDeque::new();
    let mut resolution = Resolution::default();

    // Seed with the outermost rings, skipping inner rings that no outer ring holds
    loop {
        let unfinished: Vec<usize> = (0..n).filter(|&i| !finished[i]).collect();
        let outermost = matrix.outermost(&unfinished);
        let stray: Vec<usize> = outermost
            .iter()
            .copied()
            .filter(|&i| rings[i].roles.is_pure_inner())
            .collect();
        if stray.is_empty() {
            queue.extend(outermost.into_iter().map(|ring| PolygonStatus {
                ring,
                outer: true,
                tags: TagSource::Relation,
            }));
            break;
        }
        for i in stray {
            diagnostics.record(Diagnostic::InnerRingOutermost {
                way_ids: rings[i].way_ids(),
            });
            finished[i] = true;
        }
    }

    while let Some(status) = queue.pop_front() {
        let r = status.ring;
        if finished[r] {
            continue;
        }
        finished[r] = true;

        let mut candidates: Vec<usize> = (0..n)
            .filter(|&c| !finished[c] && matrix.contains(r, c))
            .collect();

        let children = loop {
            let children = matrix.outermost(&candidates);
            let misplaced = children
                .iter()
                .copied()
                .find(|&c| has_level_role(rings[c].roles, status.outer));
            let Some(nested) = misplaced else {
                break children;
            };

            diagnostics.record(Diagnostic::NestedSameRole {
                way_ids: rings[nested].way_ids(),
                role: rings[nested].roles.label(),
                candidates: children
                    .iter()
                    .filter(|&&c| c != nested)
                    .map(|&c| rings[c].way_ids())
                    .collect(),
            });
            // the nested ring leaves this level together with its contents
            candidates.retain(|&c| c != nested && !matrix.contains(nested, c));
            if status.outer {
                queue.push_back(PolygonStatus {
                    ring: nested,
                    outer: true,
                    tags: TagSource::Ways(rings[nested].sources.clone()),
                });
            } else {
                finished[nested] = true;
            }
        };

        let child_tags = if status.outer {
            TagSource::Relation
        } else {
            TagSource::Ways(rings[r].sources.clone())
        };
        queue.extend(children.iter().map(|&ring| PolygonStatus {
            ring,
            outer: !status.outer,
            tags: child_tags.clone(),
        }));

        if !status.outer {
            continue;
        }

        trace!(
            "Relation {}: outer ring {} with {} hole(s)",
            diagnostics.relation_id(),
            r,
            children.len()
        );
        let holes: Vec<&[CoordId]> = children.iter().map(|&c| rings[c].points.as_slice()).collect();
        let points = cut_holes(arena, &rings[r].points, &holes)?;
        let area2 = signed_area2(&arena.resolve(&points)).abs();

        resolution.outer_area2 += area2;
        resolution.hole_links.extend(children.iter().map(|&c| (r, c)));
        resolution.polygons.push(ResolvedPolygon {
            points,
            ring: r,
            holes: children,
            tags: status.tags,
            area2,
        });
    }

    for i in (0..n).filter(|&i| !finished[i]) {
        diagnostics.record(Diagnostic::UnfinishedRing {
            way_ids: rings[i].way_ids(),
            candidates: matrix
                .innermost_containers(i)
                .into_iter()
                .map(|c| rings[c].way_ids())
                .collect(),
        });
    }

    Ok(resolution)
}
