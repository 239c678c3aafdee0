use crate::coordinate_system::geographic::LLPoint;
use crate::coordinate_system::{BBox, Coord};
use crate::error::{MultiPolygonError, Result};
use fnv::FnvHashMap;
use itertools::Itertools;
use log::{debug, warn};
use serde::Deserialize;
use std::collections::{BTreeMap, HashMap};

/// Tags of an OSM element, ordered so output is reproducible.
pub type Tags = BTreeMap<String, String>;

// Raw data from Overpass JSON

#[derive(Debug, Deserialize)]
struct OsmMember {
    r#type: String,
    r#ref: u64,
    #[serde(default)]
    role: String,
}

#[derive(Debug, Deserialize)]
struct OsmElement {
    pub r#type: String,
    pub id: u64,
    pub lat: Option<f64>,
    pub lon: Option<f64>,
    pub nodes: Option<Vec<u64>>,
    pub tags: Option<HashMap<String, String>>,
    #[serde(default)]
    pub members: Vec<OsmMember>,
}

#[derive(Deserialize)]
struct OsmData {
    pub elements: Vec<OsmElement>,
}

struct SplitOsmData {
    pub nodes: Vec<OsmElement>,
    pub ways: Vec<OsmElement>,
    pub relations: Vec<OsmElement>,
}

impl SplitOsmData {
    fn total_count(&self) -> usize {
        self.nodes.len() + self.ways.len() + self.relations.len()
    }

    fn from_raw_osm_data(osm_data: OsmData) -> Self {
        let mut nodes = Vec::new();
        let mut ways = Vec::new();
        let mut relations = Vec::new();
        for element in osm_data.elements {
            match element.r#type.as_str() {
                "node" => nodes.push(element),
                "way" => ways.push(element),
                "relation" => relations.push(element),
                other => debug!("Ignoring element {} of type \"{other}\"", element.id),
            }
        }
        SplitOsmData {
            nodes,
            ways,
            relations,
        }
    }
}

// End raw data

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProcessedNode {
    pub id: u64,
    pub coord: Coord,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedWay {
    pub id: u64,
    pub nodes: Vec<ProcessedNode>,
    pub tags: Tags,
    /// The way's first and last node references are the same node, even if
    /// the copy at hand is cut short by the tile.
    pub closed_in_source: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessedMemberRole {
    Outer,
    Inner,
    /// Empty or unrecognised role, resolved from geometry alone.
    Unset,
}

impl ProcessedMemberRole {
    pub fn from_role(role: &str) -> Self {
        match role {
            "outer" => ProcessedMemberRole::Outer,
            "inner" => ProcessedMemberRole::Inner,
            _ => ProcessedMemberRole::Unset,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedMember {
    pub role: ProcessedMemberRole,
    pub way: ProcessedWay,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProcessedRelation {
    pub id: u64,
    pub tags: Tags,
    pub members: Vec<ProcessedMember>,
    /// `label` member node, overrides the computed centre of gravity.
    pub label: Option<ProcessedNode>,
}

impl ProcessedRelation {
    /// Ids of the member ways with the outer role, in member order.
    pub fn outer_way_ids(&self) -> Vec<u64> {
        self.members
            .iter()
            .filter(|m| m.role == ProcessedMemberRole::Outer)
            .map(|m| m.way.id)
            .unique()
            .collect()
    }
}

#[derive(Debug, Clone)]
pub struct ParsedData {
    pub relations: Vec<ProcessedRelation>,
    /// Extent of all nodes, `None` when the data holds no nodes.
    pub bounds: Option<BBox>,
}

const AREA_RELATION_TYPES: [&str; 2] = ["multipolygon", "boundary"];

/// Parses Overpass JSON into the multipolygon relations it contains.
pub fn parse_osm_data(json: &str) -> Result<ParsedData> {
    let osm_data: OsmData = serde_json::from_str(json)?;
    let data = SplitOsmData::from_raw_osm_data(osm_data);
    debug!("Total elements: {}", data.total_count());

    let mut nodes_map: FnvHashMap<u64, ProcessedNode> = FnvHashMap::default();
    let mut ways_map: FnvHashMap<u64, ProcessedWay> = FnvHashMap::default();
    let mut bounds: Option<BBox> = None;

    // First pass: nodes to map units
    for element in &data.nodes {
        let (Some(lat), Some(lon)) = (element.lat, element.lon) else {
            continue;
        };
        let llpoint = LLPoint::new(lat, lon).map_err(|e| {
            MultiPolygonError::InvalidInput(format!("node {}: {e}", element.id))
        })?;
        let coord = llpoint.to_coord();
        match bounds.as_mut() {
            Some(b) => b.extend(coord),
            None => bounds = Some(BBox::from_point(coord)),
        }
        nodes_map.insert(
            element.id,
            ProcessedNode {
                id: element.id,
                coord,
            },
        );
    }

    // Second pass: ways
    for element in &data.ways {
        let node_ids = element.nodes.as_deref().unwrap_or_default();
        let closed_in_source = node_ids.len() > 2 && node_ids.first() == node_ids.last();
        let nodes: Vec<ProcessedNode> = node_ids
            .iter()
            .filter_map(|id| nodes_map.get(id).copied())
            .collect();
        ways_map.insert(
            element.id,
            ProcessedWay {
                id: element.id,
                nodes,
                tags: collect_tags(&element.tags),
                closed_in_source,
            },
        );
    }

    // Third pass: relations
    let mut relations = Vec::new();
    for element in &data.relations {
        let tags = collect_tags(&element.tags);
        let is_area = tags
            .get("type")
            .is_some_and(|t| AREA_RELATION_TYPES.contains(&t.as_str()));
        if !is_area {
            continue;
        }

        let mut members = Vec::new();
        let mut label = None;
        for member in &element.members {
            match member.r#type.as_str() {
                "way" => {}
                "node" if member.role == "label" => {
                    label = nodes_map.get(&member.r#ref).copied();
                    continue;
                }
                _ => continue,
            }

            let Some(way) = ways_map.get(&member.r#ref) else {
                warn!(
                    "Relation {}: member way {} is missing from the input, skipping it",
                    element.id, member.r#ref
                );
                continue;
            };

            let role = ProcessedMemberRole::from_role(&member.role);
            if role == ProcessedMemberRole::Unset && !member.role.is_empty() {
                warn!(
                    "Relation {}: way {} has unknown role \"{}\", treating it as unset",
                    element.id, member.r#ref, member.role
                );
            }
            members.push(ProcessedMember {
                role,
                way: way.clone(),
            });
        }

        relations.push(ProcessedRelation {
            id: element.id,
            tags,
            members,
            label,
        });
    }

    Ok(ParsedData { relations, bounds })
}

fn collect_tags(tags: &Option<HashMap<String, String>>) -> Tags {
    tags.as_ref()
        .map(|t| t.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "elements": [
            {"type": "node", "id": 1, "lat": 54.0, "lon": 9.0},
            {"type": "node", "id": 2, "lat": 54.0, "lon": 9.1},
            {"type": "node", "id": 3, "lat": 54.1, "lon": 9.1},
            {"type": "node", "id": 4, "lat": 54.1, "lon": 9.0},
            {"type": "node", "id": 5, "lat": 54.05, "lon": 9.05, "tags": {"name": "Lake"}},
            {"type": "way", "id": 10, "nodes": [1, 2, 3], "tags": {"natural": "water"}},
            {"type": "way", "id": 11, "nodes": [3, 4, 1]},
            {"type": "way", "id": 12, "nodes": [1, 2, 3, 1]},
            {"type": "relation", "id": 100,
             "tags": {"type": "multipolygon", "natural": "water"},
             "members": [
                {"type": "way", "ref": 10, "role": "outer"},
                {"type": "way", "ref": 11, "role": "outer"},
                {"type": "way", "ref": 99, "role": "inner"},
                {"type": "way", "ref": 12, "role": "island"},
                {"type": "node", "ref": 5, "role": "label"}
             ]},
            {"type": "relation", "id": 101,
             "tags": {"type": "route"},
             "members": [{"type": "way", "ref": 10, "role": ""}]}
        ]
    }"#;

    #[test]
    fn test_parse_relations() {
        let data = parse_osm_data(SAMPLE).unwrap();
        assert_eq!(data.relations.len(), 1);

        let relation = &data.relations[0];
        assert_eq!(relation.id, 100);
        assert_eq!(relation.tags.get("natural").map(String::as_str), Some("water"));

        // the missing way 99 is skipped
        assert_eq!(relation.members.len(), 3);
        assert_eq!(relation.members[0].role, ProcessedMemberRole::Outer);
        assert_eq!(relation.members[2].role, ProcessedMemberRole::Unset);
        assert_eq!(relation.outer_way_ids(), vec![10, 11]);

        assert_eq!(relation.label.map(|n| n.id), Some(5));
    }

    #[test]
    fn test_closed_in_source() {
        let data = parse_osm_data(SAMPLE).unwrap();
        let members = &data.relations[0].members;
        assert!(!members[0].way.closed_in_source);
        assert!(members[2].way.closed_in_source);
        assert_eq!(members[2].way.nodes.len(), 4);
    }

    #[test]
    fn test_bounds_cover_all_nodes() {
        let data = parse_osm_data(SAMPLE).unwrap();
        let bounds = data.bounds.unwrap();
        assert!(bounds.contains(Coord::from_degrees(54.05, 9.05)));
        assert_eq!(bounds.min_lat, Coord::from_degrees(54.0, 9.0).lat);
    }

    #[test]
    fn test_invalid_json() {
        assert!(matches!(
            parse_osm_data("{\"elements\": 3}"),
            Err(MultiPolygonError::Json(_))
        ));
    }

    #[test]
    fn test_invalid_node() {
        let json = r#"{"elements": [{"type": "node", "id": 1, "lat": 95.0, "lon": 0.0}]}"#;
        assert!(matches!(
            parse_osm_data(json),
            Err(MultiPolygonError::InvalidInput(_))
        ));
    }
}
