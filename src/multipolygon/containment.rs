//! Pairwise "ring i contains ring j" over the closed rings of a partition.

use super::diagnostics::{Diagnostic, Diagnostics};
use super::ring::Ring;
use crate::coordinate_system::CoordArena;
use crate::error::{MultiPolygonError, Result};
use crate::geometry::{locate_midpoint, locate_point, PointLocation};
use ndarray::Array2;

/// True when closed ring `a` contains ring `b`, touching allowed.
///
/// Every vertex of `b` must be inside or on `a`. Edges of `b` running between
/// two boundary vertices of `a` must also have their midpoint inside or on `a`,
/// which catches chords cutting through a concave part of `a`.
pub fn contains(arena: &CoordArena, a: &Ring, b: &Ring) -> bool {
    if !a.is_closed() || !a.bbox.contains_bbox(&b.bbox) {
        return false;
    }
    let outer = a.coords(arena);
    let inner = b.coords(arena);

    let locations: Vec<PointLocation> = inner.iter().map(|&p| locate_point(p, &outer)).collect();
    if locations.contains(&PointLocation::Outside) {
        return false;
    }

    inner.windows(2).zip(locations.windows(2)).all(|(edge, loc)| {
        loc[0] != PointLocation::OnBoundary
            || loc[1] != PointLocation::OnBoundary
            || locate_midpoint(edge[0], edge[1], &outer) != PointLocation::Outside
    })
}

#[derive(Debug, Clone)]
pub struct ContainmentMatrix {
    contains: Array2<bool>,
    duplicate: Vec<bool>,
}

impl ContainmentMatrix {
    /// Builds the matrix over `rings`, which must all be closed.
    ///
    /// Rows are filled from the smallest ring up, so when ring i is found to
    /// contain ring j, j's row is usually complete and is copied into i's.
    /// Rings proven to contain each other are identical. They are reported, the
    /// lowest index of each group is kept and the others are marked duplicate,
    /// with their rows and columns cleared.
    pub fn build(arena: &CoordArena, rings: &[Ring], diagnostics: &mut Diagnostics) -> Result<Self> {
        if let Some(open) = rings.iter().find(|r| !r.is_closed()) {
            return Err(MultiPolygonError::OpenRing {
                way_ids: open.way_ids(),
            });
        }

        let n = rings.len();
        let mut contains = Array2::from_elem((n, n), false);
        let mut resolved = Array2::from_elem((n, n), false);

        let mut order: Vec<usize> = (0..n).collect();
        order.sort_by_key(|&i| (rings[i].bbox.area(), i));

        for &i in &order {
            for j in 0..n {
                if i == j || resolved[[i, j]] {
                    continue;
                }
                resolved[[i, j]] = true;

                if !rings[i].bbox.intersects(&rings[j].bbox) {
                    resolved[[j, i]] = true;
                    continue;
                }
                if !self::contains(arena, &rings[i], &rings[j]) {
                    continue;
                }

                contains[[i, j]] = true;
                for k in 0..n {
                    if k != i && contains[[j, k]] {
                        contains[[i, k]] = true;
                        resolved[[i, k]] = true;
                    }
                }
            }
        }

        let mut duplicate = vec![false; n];
        for i in 0..n {
            if duplicate[i] {
                continue;
            }
            for j in (i + 1)..n {
                if !duplicate[j] && contains[[i, j]] && contains[[j, i]] {
                    duplicate[j] = true;
                    diagnostics.record(Diagnostic::IdenticalRings {
                        first: rings[i].way_ids(),
                        second: rings[j].way_ids(),
                    });
                }
            }
        }
        for d in (0..n).filter(|&d| duplicate[d]) {
            contains.row_mut(d).fill(false);
            contains.column_mut(d).fill(false);
        }

        Ok(Self { contains, duplicate })
    }

    pub fn len(&self) -> usize {
        self.contains.nrows()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Ring `i` repeats a lower-indexed ring and takes no part in nesting.
    pub fn is_duplicate(&self, i: usize) -> bool {
        self.duplicate[i]
    }

    pub fn contains(&self, outer: usize, inner: usize) -> bool {
        self.contains[[outer, inner]]
    }

    /// Candidates not contained by any other candidate.
    pub fn outermost(&self, candidates: &[usize]) -> Vec<usize> {
        candidates
            .iter()
            .copied()
            .filter(|&c| !candidates.iter().any(|&d| d != c && self.contains(d, c)))
            .collect()
    }

    /// Rings containing `inner` that contain no other ring containing it.
    pub fn innermost_containers(&self, inner: usize) -> Vec<usize> {
        let containers: Vec<usize> = (0..self.len()).filter(|&o| self.contains(o, inner)).collect();
        containers
            .iter()
            .copied()
            .filter(|&o| !containers.iter().any(|&p| p != o && self.contains(o, p)))
            .collect()
    }
}
