use crate::coordinate_system::{BBox, Coord, CoordArena, CoordId};
use crate::geometry::signed_area2;
use crate::osm_parser::ProcessedMemberRole;
use std::ops::{BitOr, BitOrAssign};

/// Union of the member roles of the ways forming a ring.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Hash)]
pub struct RoleMask(u8);

impl RoleMask {
    pub const NONE: RoleMask = RoleMask(0);
    pub const OUTER: RoleMask = RoleMask(1);
    pub const INNER: RoleMask = RoleMask(2);
    pub const UNSET: RoleMask = RoleMask(4);

    pub fn contains(self, other: RoleMask) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_pure_outer(self) -> bool {
        self == Self::OUTER
    }

    pub fn is_pure_inner(self) -> bool {
        self == Self::INNER
    }

    pub fn is_mixed(self) -> bool {
        self.contains(Self::OUTER) && self.contains(Self::INNER)
    }

    /// Outer or unset: may act as a top-level ring.
    pub fn is_outer_like(self) -> bool {
        self.0 & (Self::OUTER.0 | Self::UNSET.0) != 0
    }

    pub fn label(self) -> &'static str {
        if self.is_mixed() {
            "mixed"
        } else if self.contains(Self::OUTER) {
            "outer"
        } else if self.contains(Self::INNER) {
            "inner"
        } else {
            "unset"
        }
    }
}

impl BitOr for RoleMask {
    type Output = RoleMask;

    fn bitor(self, rhs: RoleMask) -> RoleMask {
        RoleMask(self.0 | rhs.0)
    }
}

impl BitOrAssign for RoleMask {
    fn bitor_assign(&mut self, rhs: RoleMask) {
        self.0 |= rhs.0;
    }
}

impl From<ProcessedMemberRole> for RoleMask {
    fn from(role: ProcessedMemberRole) -> Self {
        match role {
            ProcessedMemberRole::Outer => RoleMask::OUTER,
            ProcessedMemberRole::Inner => RoleMask::INNER,
            ProcessedMemberRole::Unset => RoleMask::UNSET,
        }
    }
}

/// A member way a ring was built from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SourceWay {
    /// Index into the relation's member list.
    pub member: usize,
    pub way_id: u64,
}

/// A chain of vertices built from one or more member ways.
///
/// Closed once the first and last vertex are the same [`CoordId`]. The bounding
/// box and signed area are only meaningful for closed rings and are refreshed
/// whenever the point list is rebuilt.
#[derive(Debug, Clone)]
pub struct Ring {
    pub points: Vec<CoordId>,
    pub roles: RoleMask,
    pub sources: Vec<SourceWay>,
    pub closed_artificially: bool,
    pub bbox: BBox,
    pub area2: i64,
}

impl Ring {
    pub fn new(
        arena: &CoordArena,
        points: Vec<CoordId>,
        roles: RoleMask,
        sources: Vec<SourceWay>,
    ) -> Self {
        let mut ring = Ring {
            points,
            roles,
            sources,
            closed_artificially: false,
            bbox: BBox::default(),
            area2: 0,
        };
        ring.refresh(arena);
        ring
    }

    /// Recomputes the bounding box and signed area.
    pub fn refresh(&mut self, arena: &CoordArena) {
        let coords = self.coords(arena);
        self.bbox = BBox::from_coords(coords.iter().copied()).unwrap_or_default();
        self.area2 = signed_area2(&coords);
    }

    pub fn coords(&self, arena: &CoordArena) -> Vec<Coord> {
        arena.resolve(&self.points)
    }

    pub fn len(&self) -> usize {
        self.points.len()
    }

    pub fn is_empty(&self) -> bool {
        self.points.is_empty()
    }

    pub fn first(&self) -> Option<CoordId> {
        self.points.first().copied()
    }

    pub fn last(&self) -> Option<CoordId> {
        self.points.last().copied()
    }

    pub fn is_closed(&self) -> bool {
        self.points.len() > 1 && self.first() == self.last()
    }

    /// Closes a ring whose ends are distinct vertices at the same location.
    pub fn close_if_coincident(&mut self, arena: &CoordArena) -> bool {
        if self.is_closed() {
            return false;
        }
        match (self.first(), self.last()) {
            (Some(first), Some(last)) if self.points.len() > 2 && arena.same_location(first, last) => {
                if let Some(end) = self.points.last_mut() {
                    *end = first;
                }
                true
            }
            _ => false,
        }
    }

    /// Closes the ring with a straight segment from its last to its first vertex.
    pub fn close_artificially(&mut self, arena: &CoordArena) {
        if let Some(first) = self.first() {
            self.points.push(first);
        }
        self.closed_artificially = true;
        self.refresh(arena);
    }

    pub fn reverse(&mut self) {
        self.points.reverse();
        self.area2 = -self.area2;
    }

    /// Takes over roles and provenance of a ring merged into this one.
    pub fn absorb(&mut self, other: &Ring) {
        self.roles |= other.roles;
        self.sources.extend_from_slice(&other.sources);
        self.closed_artificially |= other.closed_artificially;
    }

    pub fn way_ids(&self) -> Vec<u64> {
        self.sources.iter().map(|s| s.way_id).collect()
    }

    /// At least four points and a non-zero area.
    pub fn is_degenerate(&self) -> bool {
        self.points.len() < 4 || self.area2 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ring_of(arena: &mut CoordArena, coords: &[Coord]) -> Ring {
        let points = coords.iter().map(|&c| arena.push(c)).collect();
        Ring::new(arena, points, RoleMask::OUTER, Vec::new())
    }

    #[test]
    fn test_role_mask() {
        let mixed = RoleMask::OUTER | RoleMask::INNER;
        assert!(mixed.is_mixed());
        assert_eq!(mixed.label(), "mixed");
        assert!(RoleMask::UNSET.is_outer_like());
        assert!(!RoleMask::INNER.is_outer_like());
        assert!(RoleMask::INNER.is_pure_inner());

        let mut roles = RoleMask::NONE;
        roles |= RoleMask::UNSET;
        assert_eq!(roles.label(), "unset");
    }

    #[test]
    fn test_close_if_coincident() {
        let mut arena = CoordArena::new();
        let mut ring = ring_of(
            &mut arena,
            &[
                Coord::new(0, 0),
                Coord::new(0, 10),
                Coord::new(10, 10),
                Coord::new(0, 0),
            ],
        );
        assert!(!ring.is_closed());
        assert!(ring.close_if_coincident(&arena));
        assert!(ring.is_closed());
        assert!(!ring.closed_artificially);
    }

    #[test]
    fn test_close_artificially() {
        let mut arena = CoordArena::new();
        let mut ring = ring_of(
            &mut arena,
            &[Coord::new(0, 0), Coord::new(0, 10), Coord::new(10, 10)],
        );
        ring.close_artificially(&arena);
        assert!(ring.is_closed());
        assert!(ring.closed_artificially);
        assert_eq!(ring.len(), 4);
        assert_eq!(ring.area2, 100);
        assert!(!ring.is_degenerate());
    }
}
