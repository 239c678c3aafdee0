//! Splits large ring sets into smaller partitions.
//!
//! The containment matrix is quadratic in the number of rings and each test is
//! linear in the ring size, so relations with huge rings (coastlines, country
//! borders) are cut in halves along the longer axis of their extent until the
//! largest ring is small enough or the depth cap is reached.

use super::diagnostics::{Diagnostic, Diagnostics};
use super::ring::Ring;
use crate::config::MultiPolygonConfig;
use crate::coordinate_system::{BBox, CoordArena};
use crate::shape_splitter::{split_shape, SplitLine};
use log::debug;

#[derive(Debug, Clone)]
pub struct Partition {
    pub rings: Vec<Ring>,
    pub depth: u32,
}

impl Partition {
    pub fn has_outer(&self) -> bool {
        self.rings.iter().any(|r| r.roles.is_outer_like())
    }

    pub fn max_points(&self) -> usize {
        self.rings.iter().map(Ring::len).max().unwrap_or(0)
    }

    /// Rings closed with made-up segments may self-intersect, splitting them
    /// could produce garbage.
    pub fn expects_self_intersection(&self) -> bool {
        self.rings.iter().any(|r| r.closed_artificially)
    }

    pub fn bbox(&self) -> Option<BBox> {
        self.rings.iter().map(|r| r.bbox).reduce(|a, b| a.union(&b))
    }
}

pub fn partition_rings(
    rings: Vec<Ring>,
    arena: &mut CoordArena,
    config: &MultiPolygonConfig,
    diagnostics: &mut Diagnostics,
) -> Vec<Partition> {
    let mut done = Vec::new();
    let mut stack = vec![Partition { rings, depth: 0 }];

    while let Some(partition) = stack.pop() {
        if partition.rings.is_empty() {
            continue;
        }
        if !partition.has_outer() {
            diagnostics.record(Diagnostic::NoOuterInPartition {
                rings: partition.rings.len(),
                depth: partition.depth,
            });
            continue;
        }

        let needs_split = partition.max_points() > config.partition_point_threshold
            && !partition.expects_self_intersection()
            && partition.depth < config.max_partition_depth;
        if !needs_split {
            done.push(partition);
            continue;
        }

        let Some((less, more)) = split_partition(partition, arena) else {
            continue;
        };
        stack.push(more);
        stack.push(less);
    }

    debug!(
        "Relation {}: {} partition(s)",
        diagnostics.relation_id(),
        done.len()
    );
    done
}

fn split_partition(partition: Partition, arena: &mut CoordArena) -> Option<(Partition, Partition)> {
    let bbox = partition.bbox()?;
    let center = bbox.center();
    let line = if bbox.width() >= bbox.height() {
        SplitLine::Lon(center.lon)
    } else {
        SplitLine::Lat(center.lat)
    };
    debug!(
        "Splitting partition of {} ring(s) at depth {} along {:?}",
        partition.rings.len(),
        partition.depth,
        line
    );

    let depth = partition.depth + 1;
    let mut less = Partition {
        rings: Vec::new(),
        depth,
    };
    let mut more = Partition {
        rings: Vec::new(),
        depth,
    };

    for ring in partition.rings {
        let parts = split_shape(arena, &ring.points, line);
        for (side, pieces) in [(&mut less, parts.less), (&mut more, parts.more)] {
            for piece in pieces {
                side.rings
                    .push(Ring::new(arena, piece, ring.roles, ring.sources.clone()));
            }
        }
    }
    Some((less, more))
}
