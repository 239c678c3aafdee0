use super::transformation::{degrees_to_map_units, map_units_to_degrees};
use fnv::FnvHashMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// A fixed-point location in map units (2^24 units per full turn).
///
/// Equality on `Coord` means "same location". Two distinct vertices can share
/// a location; use [`CoordId`] when the question is "same vertex".
#[derive(Debug, Deserialize, Serialize, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Coord {
    pub lat: i32,
    pub lon: i32,
}

impl Coord {
    pub fn new(lat: i32, lon: i32) -> Self {
        Self { lat, lon }
    }

    pub fn from_degrees(lat: f64, lon: f64) -> Self {
        Self {
            lat: degrees_to_map_units(lat),
            lon: degrees_to_map_units(lon),
        }
    }

    pub fn lat_degrees(&self) -> f64 {
        map_units_to_degrees(self.lat)
    }

    pub fn lon_degrees(&self) -> f64 {
        map_units_to_degrees(self.lon)
    }

    /// Euclidean distance in map units.
    pub fn distance(&self, other: &Coord) -> f64 {
        let dlat = (self.lat as f64) - (other.lat as f64);
        let dlon = (self.lon as f64) - (other.lon as f64);
        (dlat * dlat + dlon * dlon).sqrt()
    }
}

impl fmt::Display for Coord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Coord({}, {})", self.lat, self.lon)
    }
}

/// Identity of a vertex inside a [`CoordArena`].
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CoordId(u32);

impl CoordId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

/// Owns every vertex touched while one relation is processed.
///
/// Source nodes are interned by OSM node id so that ways sharing a node share
/// a vertex. Points created by the algorithms (crossings, corners, bridge
/// points) go through [`CoordArena::pooled`], which hands out one vertex per
/// location.
#[derive(Debug, Default)]
pub struct CoordArena {
    coords: Vec<Coord>,
    by_node: FnvHashMap<u64, CoordId>,
    pooled: FnvHashMap<Coord, CoordId>,
}

impl CoordArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.coords.len()
    }

    pub fn is_empty(&self) -> bool {
        self.coords.is_empty()
    }

    /// Adds a fresh vertex, never shared with any other.
    pub fn push(&mut self, coord: Coord) -> CoordId {
        let id = CoordId(self.coords.len() as u32);
        self.coords.push(coord);
        id
    }

    /// Returns the vertex of an OSM node, creating it on first sight.
    /// Node id 0 marks a synthetic node and always yields a fresh vertex.
    pub fn node(&mut self, node_id: u64, coord: Coord) -> CoordId {
        if node_id == 0 {
            return self.push(coord);
        }
        if let Some(&id) = self.by_node.get(&node_id) {
            return id;
        }
        let id = self.push(coord);
        self.by_node.insert(node_id, id);
        id
    }

    /// Returns the shared vertex for a created point at `coord`.
    pub fn pooled(&mut self, coord: Coord) -> CoordId {
        if let Some(&id) = self.pooled.get(&coord) {
            return id;
        }
        let id = self.push(coord);
        self.pooled.insert(coord, id);
        id
    }

    pub fn get(&self, id: CoordId) -> Coord {
        self.coords[id.index()]
    }

    pub fn same_location(&self, a: CoordId, b: CoordId) -> bool {
        a == b || self.get(a) == self.get(b)
    }

    pub fn resolve(&self, ids: &[CoordId]) -> Vec<Coord> {
        ids.iter().map(|&id| self.get(id)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_nodes_share_vertex_by_node_id() {
        let mut arena = CoordArena::new();
        let a = arena.node(7, Coord::new(10, 20));
        let b = arena.node(7, Coord::new(10, 20));
        let c = arena.node(8, Coord::new(10, 20));

        assert_eq!(a, b);
        assert_ne!(a, c);
        assert!(arena.same_location(a, c));
    }

    #[test]
    fn test_synthetic_nodes_are_never_shared() {
        let mut arena = CoordArena::new();
        let a = arena.node(0, Coord::new(1, 1));
        let b = arena.node(0, Coord::new(1, 1));
        assert_ne!(a, b);
    }

    #[test]
    fn test_pooled_points_dedup_by_value() {
        let mut arena = CoordArena::new();
        let original = arena.push(Coord::new(5, 5));
        let p1 = arena.pooled(Coord::new(5, 5));
        let p2 = arena.pooled(Coord::new(5, 5));

        assert_eq!(p1, p2);
        // pooling never captures source vertices
        assert_ne!(p1, original);
        assert_eq!(arena.len(), 2);
    }

    #[test]
    fn test_degree_round_trip() {
        let c = Coord::from_degrees(54.627053, 9.927928);
        assert!((c.lat_degrees() - 54.627053).abs() < 1e-4);
        assert!((c.lon_degrees() - 9.927928).abs() < 1e-4);
    }
}
