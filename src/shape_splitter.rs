// Splits closed rings by an axis-aligned line and clips them to a tile.
//
// A ring is walked once and cut into fragments at every crossing of the line.
// Each side's fragments are then put back together: a fragment closed along
// the line either encloses territory of the ring (a shape) or a gap inside an
// enclosing fragment (a hole). Holes are spliced into the point list of their
// shape, so every output ring is a simple polygon.

use crate::coordinate_system::{BBox, Coord, CoordArena, CoordId};
use crate::geometry::signed_area2;
use log::{debug, warn};
use std::cmp::Ordering;

/// An infinite axis-aligned dividing line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SplitLine {
    /// Horizontal line at a latitude.
    Lat(i32),
    /// Vertical line at a longitude.
    Lon(i32),
}

/// One side of a [`SplitLine`]: `Less` is south/west, `More` north/east.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Less,
    More,
}

impl SplitLine {
    /// Which side of the line a point is on, `Equal` when on the line.
    pub fn side_of(self, coord: Coord) -> Ordering {
        match self {
            SplitLine::Lat(v) => coord.lat.cmp(&v),
            SplitLine::Lon(v) => coord.lon.cmp(&v),
        }
    }

    /// Position of a point along the line.
    pub fn position(self, coord: Coord) -> i32 {
        match self {
            SplitLine::Lat(_) => coord.lon,
            SplitLine::Lon(_) => coord.lat,
        }
    }

    /// Crossing point of the segment `a - b` with the line.
    ///
    /// The endpoints are put in a canonical order first so both traversal
    /// directions of a shared edge round to the same point.
    pub fn crossing(self, a: Coord, b: Coord) -> Coord {
        let (a, b) = if (a.lat, a.lon) <= (b.lat, b.lon) {
            (a, b)
        } else {
            (b, a)
        };
        match self {
            SplitLine::Lon(v) => {
                let t = (v as f64 - a.lon as f64) / (b.lon as f64 - a.lon as f64);
                let lat = a.lat as f64 + t * (b.lat as f64 - a.lat as f64);
                Coord::new(lat.round() as i32, v)
            }
            SplitLine::Lat(v) => {
                let t = (v as f64 - a.lat as f64) / (b.lat as f64 - a.lat as f64);
                let lon = a.lon as f64 + t * (b.lon as f64 - a.lon as f64);
                Coord::new(v, lon.round() as i32)
            }
        }
    }

    /// The side a whole box lies on (touching the line allowed), if any.
    fn bbox_side(self, bbox: &BBox) -> Option<Side> {
        let (min, max, v) = match self {
            SplitLine::Lat(v) => (bbox.min_lat, bbox.max_lat, v),
            SplitLine::Lon(v) => (bbox.min_lon, bbox.max_lon, v),
        };
        if max <= v {
            Some(Side::Less)
        } else if min >= v {
            Some(Side::More)
        } else {
            None
        }
    }
}

/// Closed rings produced on each side of a split.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct SplitParts {
    pub less: Vec<Vec<CoordId>>,
    pub more: Vec<Vec<CoordId>>,
}

impl SplitParts {
    pub fn take(self, side: Side) -> Vec<Vec<CoordId>> {
        match side {
            Side::Less => self.less,
            Side::More => self.more,
        }
    }

    fn side_mut(&mut self, side: Side) -> &mut Vec<Vec<CoordId>> {
        match side {
            Side::Less => &mut self.less,
            Side::More => &mut self.more,
        }
    }
}

/// A ring fragment between two crossings of the dividing line.
#[derive(Debug, Clone)]
struct MergeCloseHelper {
    points: Vec<CoordId>,
    start_pos: i32,
    end_pos: i32,
    low: i32,
    high: i32,
    /// Twice the signed area enclosed by the fragment and the line.
    area2: i64,
}

impl MergeCloseHelper {
    fn new(points: Vec<CoordId>, arena: &CoordArena, line: SplitLine) -> Self {
        let coords = arena.resolve(&points);
        let start_pos = line.position(coords[0]);
        let end_pos = line.position(coords[coords.len() - 1]);
        Self {
            area2: signed_area2(&coords),
            low: start_pos.min(end_pos),
            high: start_pos.max(end_pos),
            start_pos,
            end_pos,
            points,
        }
    }

    fn is_balloon(&self) -> bool {
        self.low == self.high
    }

    fn ascending(&self) -> bool {
        self.start_pos < self.end_pos
    }

    fn encloses(&self, inner: &MergeCloseHelper) -> bool {
        if inner.is_balloon() {
            self.low <= inner.low && inner.low <= self.high
        } else {
            self.low <= inner.low && inner.high <= self.high
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FragmentRole {
    Shape,
    Hole,
    Dropped,
}

/// Splits one closed ring by `line` into disjoint closed rings per side.
///
/// A ring that lies on one side (touching the line allowed) is returned
/// unchanged on that side. Degenerate rings (fewer than three distinct
/// vertices or zero area) produce nothing.
pub fn split_shape(arena: &mut CoordArena, ring: &[CoordId], line: SplitLine) -> SplitParts {
    let mut parts = SplitParts::default();
    let open = open_points(arena, ring);
    if open.len() < 3 {
        return parts;
    }

    let coords = arena.resolve(open);
    let Some(bbox) = BBox::from_coords(coords.iter().copied()) else {
        return parts;
    };
    if let Some(side) = line.bbox_side(&bbox) {
        if bbox.width() == 0 || bbox.height() == 0 {
            return parts;
        }
        parts.side_mut(side).push(closed_copy(ring, open));
        return parts;
    }

    let ring_area2 = signed_area2(&coords);
    if ring_area2 == 0 {
        debug!("Skipping split of zero-area ring with {} points", open.len());
        return parts;
    }

    let signs: Vec<Ordering> = coords.iter().map(|&c| line.side_of(c)).collect();
    let (less, more) = scan(arena, open, &coords, &signs, line);

    parts.less = reassemble(arena, less, ring_area2.signum());
    parts.more = reassemble(arena, more, ring_area2.signum());
    parts
}

/// Clips a closed ring to `bounds` with four single-line splits
/// (south, west, north, east). Points on the border count as inside.
pub fn clip_to_bounds(
    arena: &mut CoordArena,
    ring: &[CoordId],
    bounds: &BBox,
) -> Vec<Vec<CoordId>> {
    let Some(bbox) = BBox::from_coords(arena.resolve(ring)) else {
        return Vec::new();
    };
    if bounds.contains_bbox(&bbox) {
        return vec![ring.to_vec()];
    }
    if !bounds.intersects(&bbox) {
        return Vec::new();
    }

    let cuts = [
        (SplitLine::Lat(bounds.min_lat), Side::More),
        (SplitLine::Lon(bounds.min_lon), Side::More),
        (SplitLine::Lat(bounds.max_lat), Side::Less),
        (SplitLine::Lon(bounds.max_lon), Side::Less),
    ];

    let mut parts = vec![ring.to_vec()];
    for (line, keep) in cuts {
        let mut next = Vec::with_capacity(parts.len());
        for part in &parts {
            next.extend(split_shape(arena, part, line).take(keep));
        }
        parts = next;
        if parts.is_empty() {
            break;
        }
    }
    parts
}

/// The ring without its closing point.
fn open_points<'a>(arena: &CoordArena, ring: &'a [CoordId]) -> &'a [CoordId] {
    match (ring.first(), ring.last()) {
        (Some(&first), Some(&last)) if ring.len() > 1 && arena.same_location(first, last) => {
            &ring[..ring.len() - 1]
        }
        _ => ring,
    }
}

fn closed_copy(ring: &[CoordId], open: &[CoordId]) -> Vec<CoordId> {
    if ring.len() > open.len() && ring.first() == ring.last() {
        return ring.to_vec();
    }
    let mut closed = open.to_vec();
    closed.push(open[0]);
    closed
}

// ============================================================================
// Phase 1: scan
// ============================================================================

/// Walks the ring once and collects the fragments on each side.
fn scan(
    arena: &mut CoordArena,
    pts: &[CoordId],
    coords: &[Coord],
    signs: &[Ordering],
    line: SplitLine,
) -> (Vec<MergeCloseHelper>, Vec<MergeCloseHelper>) {
    let n = pts.len();
    let mut less = Vec::new();
    let mut more = Vec::new();

    let Some(start) = signs.iter().position(|s| *s != Ordering::Equal) else {
        return (less, more);
    };

    let mut side = signs[start];
    let mut current: Vec<CoordId> = vec![pts[start]];
    // the walk starts inside a fragment, its first part is kept aside
    let mut head: Option<Vec<CoordId>> = None;
    let mut on_line: Vec<usize> = Vec::new();

    for step in 1..=n {
        let i = (start + step) % n;
        let sign = signs[i];

        if sign == Ordering::Equal {
            on_line.push(i);
            continue;
        }

        if sign == side {
            // touched the line and came back
            current.extend(on_line.drain(..).map(|k| pts[k]));
            current.push(pts[i]);
            continue;
        }

        let (exit, entry) = match (on_line.first(), on_line.last()) {
            (Some(&first), Some(&last)) => (pts[first], pts[last]),
            _ => {
                let prev = (i + n - 1) % n;
                let crossing = arena.pooled(line.crossing(coords[prev], coords[i]));
                (crossing, crossing)
            }
        };
        on_line.clear();

        current.push(exit);
        let finished = std::mem::replace(&mut current, vec![entry, pts[i]]);
        if head.is_none() {
            head = Some(finished);
        } else {
            let helper = MergeCloseHelper::new(finished, arena, line);
            push_helper(&mut less, &mut more, side, helper);
        }
        side = sign;
    }

    // the walk ended back at `start`, splice the last fragment onto the first
    if let Some(head) = head {
        current.extend(head.into_iter().skip(1));
        let helper = MergeCloseHelper::new(current, arena, line);
        push_helper(&mut less, &mut more, side, helper);
    }

    (less, more)
}

fn push_helper(
    less: &mut Vec<MergeCloseHelper>,
    more: &mut Vec<MergeCloseHelper>,
    side: Ordering,
    helper: MergeCloseHelper,
) {
    match side {
        Ordering::Less => less.push(helper),
        Ordering::Greater => more.push(helper),
        Ordering::Equal => {}
    }
}

// ============================================================================
// Phase 2: reassemble
// ============================================================================

fn reassemble(
    arena: &CoordArena,
    mut helpers: Vec<MergeCloseHelper>,
    ring_sign: i64,
) -> Vec<Vec<CoordId>> {
    helpers.retain(|h| {
        let spike = h.is_balloon() && h.area2 == 0;
        if spike {
            debug!("Dropping spike fragment at position {}", h.low);
        }
        !spike
    });
    remove_duplicates(&mut helpers);

    if helpers.len() <= 1 {
        return helpers
            .pop()
            .and_then(|h| finish_ring(arena, h.points))
            .into_iter()
            .collect();
    }

    helpers.sort_by(compare_helpers);
    let (roles, parents) = match_brackets(&helpers, ring_sign);

    let mut children: Vec<Vec<usize>> = vec![Vec::new(); helpers.len()];
    for (idx, role) in roles.iter().enumerate() {
        if *role == FragmentRole::Hole {
            if let Some(parent) = parents[idx] {
                children[parent].push(idx);
            }
        }
    }

    let mut rings = Vec::new();
    for (idx, role) in roles.iter().enumerate() {
        if *role != FragmentRole::Shape {
            continue;
        }
        let holes: Vec<&MergeCloseHelper> = children[idx].iter().map(|&c| &helpers[c]).collect();
        let points = splice_holes(&helpers[idx], holes);
        if let Some(ring) = finish_ring(arena, points) {
            rings.push(ring);
        }
    }
    rings
}

/// Enclosing fragments sort immediately before the fragments they enclose.
fn compare_helpers(a: &MergeCloseHelper, b: &MergeCloseHelper) -> Ordering {
    a.low
        .cmp(&b.low)
        .then(b.high.cmp(&a.high))
        .then(b.area2.abs().cmp(&a.area2.abs()))
        .then(b.ascending().cmp(&a.ascending()))
}

/// Same-direction duplicates collapse to one, opposite-direction ones cancel.
fn remove_duplicates(helpers: &mut Vec<MergeCloseHelper>) {
    let mut removed = vec![false; helpers.len()];
    for i in 0..helpers.len() {
        if removed[i] {
            continue;
        }
        for j in (i + 1)..helpers.len() {
            if removed[j] {
                continue;
            }
            let (a, b) = (&helpers[i], &helpers[j]);
            if a.low != b.low || a.high != b.high || a.area2.abs() != b.area2.abs() {
                continue;
            }
            if a.points == b.points {
                debug!("Removing duplicate fragment at {}..{}", a.low, a.high);
                removed[j] = true;
            } else if a.points.iter().eq(b.points.iter().rev()) {
                debug!("Cancelling opposite fragments at {}..{}", a.low, a.high);
                removed[i] = true;
                removed[j] = true;
                break;
            }
        }
    }
    let mut idx = 0;
    helpers.retain(|_| {
        let keep = !removed[idx];
        idx += 1;
        keep
    });
}

/// Assigns every sorted fragment a role and its enclosing fragment.
///
/// Depth parity decides for fragments with two distinct crossings. Balloons
/// enclose nothing and are classified by the sign of their swept area
/// relative to the ring's winding.
fn match_brackets(
    helpers: &[MergeCloseHelper],
    ring_sign: i64,
) -> (Vec<FragmentRole>, Vec<Option<usize>>) {
    let n = helpers.len();
    let mut roles = vec![FragmentRole::Dropped; n];
    let mut parents: Vec<Option<usize>> = vec![None; n];
    let mut stack: Vec<usize> = Vec::new();

    for idx in 0..n {
        let fragment = &helpers[idx];
        while let Some(&top) = stack.last() {
            if helpers[top].encloses(fragment) {
                break;
            }
            stack.pop();
        }

        let area_sign = fragment.area2.signum() * ring_sign;

        if fragment.is_balloon() {
            let want_shape = area_sign > 0;
            // on the end of its encloser a balloon may belong outside of it
            if let Some(&top) = stack.last() {
                let inside_is_shape = stack.len() % 2 == 0;
                let on_end = fragment.low == helpers[top].low || fragment.low == helpers[top].high;
                if want_shape != inside_is_shape && on_end {
                    stack.pop();
                }
            }

            let depth_is_shape = stack.len() % 2 == 0;
            if want_shape == depth_is_shape {
                roles[idx] = if want_shape {
                    FragmentRole::Shape
                } else {
                    FragmentRole::Hole
                };
                parents[idx] = stack.last().copied();
            } else if want_shape {
                warn!(
                    "Ambiguous balloon at position {}, emitting it as a separate shape",
                    fragment.low
                );
                roles[idx] = FragmentRole::Shape;
            } else {
                match stack
                    .iter()
                    .rev()
                    .find(|&&s| roles[s] == FragmentRole::Shape)
                {
                    Some(&shape) => {
                        warn!(
                            "Ambiguous balloon at position {}, attaching it as a hole of the nearest shape",
                            fragment.low
                        );
                        roles[idx] = FragmentRole::Hole;
                        parents[idx] = Some(shape);
                    }
                    None => {
                        warn!(
                            "Ambiguous balloon at position {} has no enclosing shape, dropping it",
                            fragment.low
                        );
                    }
                }
            }
            continue;
        }

        let depth_is_shape = stack.len() % 2 == 0;
        if area_sign != 0 && (area_sign > 0) != depth_is_shape {
            debug!(
                "Fragment at {}..{} winds against its nesting depth",
                fragment.low, fragment.high
            );
        }
        roles[idx] = if depth_is_shape {
            FragmentRole::Shape
        } else {
            FragmentRole::Hole
        };
        parents[idx] = stack.last().copied();
        stack.push(idx);
    }

    (roles, parents)
}

/// Closes a shape along the line, detouring through each of its holes.
fn splice_holes(shape: &MergeCloseHelper, mut holes: Vec<&MergeCloseHelper>) -> Vec<CoordId> {
    let mut points = shape.points.clone();
    // the closing segment runs from the shape's end back to its start
    let descending = shape.end_pos >= shape.start_pos;
    if descending {
        holes.sort_by(|a, b| b.high.cmp(&a.high).then(b.low.cmp(&a.low)));
    } else {
        holes.sort_by(|a, b| a.low.cmp(&b.low).then(a.high.cmp(&b.high)));
    }

    for pair in holes.windows(2) {
        if pair[0].is_balloon() && pair[1].is_balloon() && pair[0].low == pair[1].low {
            warn!(
                "Multiple holes meet the dividing line at position {}, splice order is best effort",
                pair[0].low
            );
        }
    }

    for hole in holes {
        let entry_pos = if descending { hole.high } else { hole.low };
        if hole.start_pos == entry_pos {
            points.extend_from_slice(&hole.points);
        } else {
            debug!(
                "Hole fragment at {}..{} runs against the closing direction, reversing it",
                hole.low, hole.high
            );
            points.extend(hole.points.iter().rev());
        }
    }

    points.push(shape.points[0]);
    points
}

/// Closes the point list, removes repeated vertices and rejects degenerate rings.
fn finish_ring(arena: &CoordArena, mut points: Vec<CoordId>) -> Option<Vec<CoordId>> {
    let first = *points.first()?;
    if points.last() != Some(&first) {
        points.push(first);
    }
    points.dedup();
    if points.len() < 4 || signed_area2(&arena.resolve(&points)) == 0 {
        return None;
    }
    Some(points)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_utilities::{intern, square};

    fn area_of(arena: &CoordArena, ring: &[CoordId]) -> i64 {
        signed_area2(&arena.resolve(ring)).abs()
    }

    fn total_area(arena: &CoordArena, rings: &[Vec<CoordId>]) -> i64 {
        rings.iter().map(|r| area_of(arena, r)).sum()
    }

    #[test]
    fn test_ring_on_one_side_is_unchanged() {
        let mut arena = CoordArena::new();
        let ring = intern(&mut arena, &square(0, 10, 10));

        let parts = split_shape(&mut arena, &ring, SplitLine::Lon(5));
        assert!(parts.less.is_empty());
        assert_eq!(parts.more, vec![ring]);
    }

    #[test]
    fn test_touching_ring_is_unchanged() {
        let mut arena = CoordArena::new();
        let ring = intern(&mut arena, &square(0, 0, 10));

        let parts = split_shape(&mut arena, &ring, SplitLine::Lon(10));
        assert_eq!(parts.less, vec![ring]);
        assert!(parts.more.is_empty());
    }

    #[test]
    fn test_c_shape_crossed_twice_gives_one_fragment_per_side() {
        let mut arena = CoordArena::new();
        let c_shape = [
            Coord::new(0, 0),
            Coord::new(0, 10),
            Coord::new(3, 10),
            Coord::new(3, 4),
            Coord::new(7, 4),
            Coord::new(7, 10),
            Coord::new(10, 10),
            Coord::new(10, 0),
        ];
        let ring = intern(&mut arena, &c_shape);

        let parts = split_shape(&mut arena, &ring, SplitLine::Lon(2));
        assert_eq!(parts.less.len(), 1);
        assert_eq!(parts.more.len(), 1);
        assert_eq!(area_of(&arena, &parts.less[0]), 2 * 20);
        assert_eq!(area_of(&arena, &parts.more[0]), 2 * 56);

        for ring in parts.less.iter().chain(parts.more.iter()) {
            assert_eq!(ring.first(), ring.last());
        }
    }

    #[test]
    fn test_c_shape_crossed_four_times() {
        let mut arena = CoordArena::new();
        let c_shape = [
            Coord::new(0, 0),
            Coord::new(0, 10),
            Coord::new(3, 10),
            Coord::new(3, 4),
            Coord::new(7, 4),
            Coord::new(7, 10),
            Coord::new(10, 10),
            Coord::new(10, 0),
        ];
        let ring = intern(&mut arena, &c_shape);

        let parts = split_shape(&mut arena, &ring, SplitLine::Lon(6));
        // the west part keeps the notch, the east part falls apart into two arms
        assert_eq!(parts.less.len(), 1);
        assert_eq!(parts.more.len(), 2);
        assert_eq!(area_of(&arena, &parts.less[0]), 2 * (60 - 8));
        assert_eq!(total_area(&arena, &parts.more), 2 * (12 + 12));
    }

    #[test]
    fn test_area_is_conserved() {
        let mut arena = CoordArena::new();
        // comb with three teeth pointing east
        let comb = [
            Coord::new(0, 0),
            Coord::new(0, 20),
            Coord::new(2, 20),
            Coord::new(2, 5),
            Coord::new(4, 5),
            Coord::new(4, 20),
            Coord::new(6, 20),
            Coord::new(6, 5),
            Coord::new(8, 5),
            Coord::new(8, 20),
            Coord::new(10, 20),
            Coord::new(10, 0),
        ];
        let ring = intern(&mut arena, &comb);
        let original = area_of(&arena, &ring);

        for line in [SplitLine::Lon(12), SplitLine::Lat(3), SplitLine::Lat(7)] {
            let parts = split_shape(&mut arena, &ring, line);
            let split_area = total_area(&arena, &parts.less) + total_area(&arena, &parts.more);
            assert_eq!(split_area, original, "area changed splitting at {line:?}");
        }

        let parts = split_shape(&mut arena, &ring, SplitLine::Lon(12));
        assert_eq!(parts.less.len(), 1);
        assert_eq!(parts.more.len(), 3);
    }

    #[test]
    fn test_area_is_conserved_with_rounded_crossings() {
        let mut arena = CoordArena::new();
        let triangle = [Coord::new(0, 0), Coord::new(7, 13), Coord::new(-3, 29)];
        let ring = intern(&mut arena, &triangle);
        let original = area_of(&arena, &ring) as f64;

        let parts = split_shape(&mut arena, &ring, SplitLine::Lon(11));
        let split_area =
            (total_area(&arena, &parts.less) + total_area(&arena, &parts.more)) as f64;
        approx::assert_relative_eq!(split_area, original, max_relative = 0.05);
    }

    #[test]
    fn test_bridged_hole_becomes_balloon() {
        let mut arena = CoordArena::new();
        let corner = |arena: &mut CoordArena, lat, lon| arena.push(Coord::new(lat, lon));
        let sw = corner(&mut arena, 0, 0);
        let se = corner(&mut arena, 0, 100);
        let bridge_end = corner(&mut arena, 55, 100);
        let hole_start = corner(&mut arena, 55, 55);
        let h1 = corner(&mut arena, 45, 55);
        let h2 = corner(&mut arena, 45, 45);
        let h3 = corner(&mut arena, 55, 45);
        let ne = corner(&mut arena, 100, 100);
        let nw = corner(&mut arena, 100, 0);
        let ring = vec![
            sw, se, bridge_end, hole_start, h1, h2, h3, hole_start, bridge_end, ne, nw, sw,
        ];

        let parts = split_shape(&mut arena, &ring, SplitLine::Lon(80));

        assert_eq!(parts.less.len(), 1);
        assert_eq!(area_of(&arena, &parts.less[0]), 2 * (8000 - 100));
        // the hole is part of the west ring's point list
        assert!(parts.less[0].contains(&h2));

        assert_eq!(parts.more.len(), 2);
        assert_eq!(total_area(&arena, &parts.more), 2 * 2000);
    }

    #[test]
    fn test_spike_is_dropped() {
        let mut arena = CoordArena::new();
        let needle = [
            Coord::new(0, 0),
            Coord::new(0, 10),
            Coord::new(5, 10),
            Coord::new(5, 20),
            Coord::new(5, 10),
            Coord::new(10, 10),
            Coord::new(10, 0),
        ];
        let ring = intern(&mut arena, &needle);

        let parts = split_shape(&mut arena, &ring, SplitLine::Lon(15));
        assert!(parts.more.is_empty());
        assert_eq!(parts.less.len(), 1);
        assert_eq!(area_of(&arena, &parts.less[0]), 200);
    }

    #[test]
    fn test_coincident_crossings_share_a_vertex() {
        let mut arena = CoordArena::new();
        let shared_a = arena.node(1, Coord::new(0, 0));
        let shared_b = arena.node(2, Coord::new(10, 0));
        let west = [
            shared_a,
            shared_b,
            arena.push(Coord::new(10, -10)),
            arena.push(Coord::new(0, -10)),
            shared_a,
        ];
        let east = [
            shared_b,
            shared_a,
            arena.push(Coord::new(0, 10)),
            arena.push(Coord::new(10, 10)),
            shared_b,
        ];

        let west_parts = split_shape(&mut arena, &west, SplitLine::Lat(5));
        let east_parts = split_shape(&mut arena, &east, SplitLine::Lat(5));
        let crossing = arena.pooled(Coord::new(5, 0));

        assert!(west_parts.less[0].contains(&crossing));
        assert!(east_parts.less[0].contains(&crossing));
    }

    #[test]
    fn test_clip_inside_is_noop() {
        let mut arena = CoordArena::new();
        let ring = intern(&mut arena, &square(2, 2, 5));
        let bounds = BBox::new(0, 0, 10, 10).unwrap();

        assert_eq!(clip_to_bounds(&mut arena, &ring, &bounds), vec![ring]);
    }

    #[test]
    fn test_clip_outside_is_empty() {
        let mut arena = CoordArena::new();
        let ring = intern(&mut arena, &square(20, 20, 5));
        let bounds = BBox::new(0, 0, 10, 10).unwrap();

        assert!(clip_to_bounds(&mut arena, &ring, &bounds).is_empty());
    }

    #[test]
    fn test_clip_is_idempotent() {
        let mut arena = CoordArena::new();
        let diamond = [
            Coord::new(-3, 5),
            Coord::new(5, 13),
            Coord::new(13, 5),
            Coord::new(5, -3),
        ];
        let ring = intern(&mut arena, &diamond);
        let bounds = BBox::new(0, 0, 10, 10).unwrap();

        let clipped = clip_to_bounds(&mut arena, &ring, &bounds);
        assert_eq!(clipped.len(), 1);
        for &id in &clipped[0] {
            assert!(bounds.contains(arena.get(id)));
        }
        // an octagon: the square minus four corner triangles of area 2
        assert_eq!(area_of(&arena, &clipped[0]), 2 * (100 - 8));

        let again = clip_to_bounds(&mut arena, &clipped[0], &bounds);
        assert_eq!(again, clipped);
    }

    /// A fragment along `Lat(0)` through `(lat, lon)` vertices.
    fn fragment(arena: &mut CoordArena, coords: &[(i32, i32)]) -> MergeCloseHelper {
        let points = coords
            .iter()
            .map(|&(lat, lon)| arena.push(Coord::new(lat, lon)))
            .collect();
        MergeCloseHelper::new(points, arena, SplitLine::Lat(0))
    }

    fn reversed(arena: &CoordArena, helper: &MergeCloseHelper) -> MergeCloseHelper {
        let points = helper.points.iter().rev().copied().collect();
        MergeCloseHelper::new(points, arena, SplitLine::Lat(0))
    }

    #[test]
    fn test_same_direction_duplicates_collapse() {
        let mut arena = CoordArena::new();
        let a = fragment(&mut arena, &[(0, 0), (10, 0), (10, 10), (0, 10)]);
        let other = fragment(&mut arena, &[(0, 20), (5, 20), (5, 30), (0, 30)]);
        let mut helpers = vec![a.clone(), other.clone(), a.clone()];

        remove_duplicates(&mut helpers);
        assert_eq!(helpers.len(), 2);
        assert_eq!(helpers[0].points, a.points);
        assert_eq!(helpers[1].points, other.points);
    }

    #[test]
    fn test_opposite_duplicates_cancel() {
        let mut arena = CoordArena::new();
        let a = fragment(&mut arena, &[(0, 0), (10, 0), (10, 10), (0, 10)]);
        let back = reversed(&arena, &a);
        assert_eq!((back.low, back.high), (a.low, a.high));

        let mut helpers = vec![a.clone(), back.clone()];
        remove_duplicates(&mut helpers);
        assert!(helpers.is_empty());

        let other = fragment(&mut arena, &[(0, 20), (5, 20), (5, 30), (0, 30)]);
        let mut helpers = vec![a, other.clone(), back];
        remove_duplicates(&mut helpers);
        assert_eq!(helpers.len(), 1);
        assert_eq!(helpers[0].points, other.points);
    }

    #[test]
    fn test_balloon_against_depth_becomes_separate_shape() {
        let mut arena = CoordArena::new();
        let shape = fragment(&mut arena, &[(0, 0), (10, 0), (10, 10), (0, 10)]);
        let ring_sign = shape.area2.signum();
        let mut balloon = fragment(&mut arena, &[(0, 5), (2, 4), (2, 6), (0, 5)]);
        if balloon.area2.signum() != ring_sign {
            balloon = reversed(&arena, &balloon);
        }
        assert!(balloon.is_balloon());

        // a shape-wise balloon one level down, away from the encloser's ends
        let (roles, parents) = match_brackets(&[shape, balloon], ring_sign);
        assert_eq!(roles, vec![FragmentRole::Shape, FragmentRole::Shape]);
        assert_eq!(parents, vec![None, None]);
    }

    #[test]
    fn test_balloon_against_depth_attaches_to_nearest_shape() {
        let mut arena = CoordArena::new();
        let shape = fragment(&mut arena, &[(0, 0), (10, 0), (10, 10), (0, 10)]);
        let ring_sign = shape.area2.signum();
        let hole = fragment(&mut arena, &[(0, 8), (5, 8), (5, 2), (0, 2)]);
        let mut balloon = fragment(&mut arena, &[(0, 5), (2, 4), (2, 6), (0, 5)]);
        if balloon.area2.signum() == ring_sign {
            balloon = reversed(&arena, &balloon);
        }

        // a hole-wise balloon two levels down, inside the hole fragment
        let (roles, parents) = match_brackets(&[shape, hole, balloon], ring_sign);
        assert_eq!(
            roles,
            vec![FragmentRole::Shape, FragmentRole::Hole, FragmentRole::Hole]
        );
        assert_eq!(parents, vec![None, Some(0), Some(0)]);
    }

    #[test]
    fn test_balloon_without_enclosing_shape_is_dropped() {
        let mut arena = CoordArena::new();
        let balloon = fragment(&mut arena, &[(0, 5), (2, 4), (2, 6), (0, 5)]);
        let ring_sign = -balloon.area2.signum();

        let (roles, parents) = match_brackets(&[balloon], ring_sign);
        assert_eq!(roles, vec![FragmentRole::Dropped]);
        assert_eq!(parents, vec![None]);
    }
}
