use crate::coordinate_system::{Coord, CoordArena, CoordId};
use crate::osm_parser::{
    ProcessedMember, ProcessedMemberRole, ProcessedNode, ProcessedRelation, ProcessedWay, Tags,
};

/// Open counter-clockwise square with its south-west corner at `(lat, lon)`.
pub fn square(lat: i32, lon: i32, size: i32) -> Vec<Coord> {
    vec![
        Coord::new(lat, lon),
        Coord::new(lat, lon + size),
        Coord::new(lat + size, lon + size),
        Coord::new(lat + size, lon),
    ]
}

/// Adds fresh vertices for `coords` and returns them as a closed ring.
pub fn intern(arena: &mut CoordArena, coords: &[Coord]) -> Vec<CoordId> {
    let mut ids: Vec<CoordId> = coords.iter().map(|&c| arena.push(c)).collect();
    if let Some(&first) = ids.first() {
        ids.push(first);
    }
    ids
}

pub fn tags(pairs: &[(&str, &str)]) -> Tags {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect()
}

/// A way from `(node id, lat, lon)` triples.
pub fn way(id: u64, nodes: &[(u64, i32, i32)]) -> ProcessedWay {
    let closed_in_source = nodes.len() > 2 && nodes.first().map(|n| n.0) == nodes.last().map(|n| n.0);
    ProcessedWay {
        id,
        nodes: nodes
            .iter()
            .map(|&(node_id, lat, lon)| ProcessedNode {
                id: node_id,
                coord: Coord::new(lat, lon),
            })
            .collect(),
        tags: Tags::new(),
        closed_in_source,
    }
}

/// A closed square way, nodes numbered from `first_node`.
pub fn square_way(id: u64, first_node: u64, lat: i32, lon: i32, size: i32) -> ProcessedWay {
    let mut nodes: Vec<(u64, i32, i32)> = square(lat, lon, size)
        .into_iter()
        .enumerate()
        .map(|(i, c)| (first_node + i as u64, c.lat, c.lon))
        .collect();
    nodes.push(nodes[0]);
    way(id, &nodes)
}

pub fn with_tags(mut way: ProcessedWay, pairs: &[(&str, &str)]) -> ProcessedWay {
    way.tags = tags(pairs);
    way
}

pub fn relation(
    id: u64,
    pairs: &[(&str, &str)],
    members: Vec<(ProcessedMemberRole, ProcessedWay)>,
) -> ProcessedRelation {
    ProcessedRelation {
        id,
        tags: tags(pairs),
        members: members
            .into_iter()
            .map(|(role, way)| ProcessedMember { role, way })
            .collect(),
        label: None,
    }
}
