use crate::coordinate_system::Coord;
use crate::error::Result;
use crate::osm_parser::Tags;
use serde::Serialize;
use std::collections::BTreeMap;
use std::io::Write;

/// A generated way: closed point list plus merged tags.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPolygon {
    pub id: u64,
    pub points: Vec<Coord>,
    pub tags: Tags,
}

/// Receives what multipolygon processing writes for a tile.
///
/// One relation is processed at a time; implementations need no locking.
pub trait WaySink {
    fn add_polygon(&mut self, polygon: OutputPolygon);

    /// Adds a marker tag to an original member way.
    fn tag_original_way(&mut self, way_id: u64, key: &str, value: &str);
}

/// Hands out ids for generated ways.
#[derive(Debug, Clone)]
pub struct IdGenerator {
    next: u64,
}

impl IdGenerator {
    pub fn new(first: u64) -> Self {
        Self { next: first }
    }

    pub fn next_id(&mut self) -> u64 {
        let id = self.next;
        self.next += 1;
        id
    }
}

/// In-memory way map of one tile.
#[derive(Debug, Default)]
pub struct TileWayMap {
    pub polygons: Vec<OutputPolygon>,
    pub way_tags: BTreeMap<u64, Tags>,
}

impl WaySink for TileWayMap {
    fn add_polygon(&mut self, polygon: OutputPolygon) {
        self.polygons.push(polygon);
    }

    fn tag_original_way(&mut self, way_id: u64, key: &str, value: &str) {
        self.way_tags
            .entry(way_id)
            .or_default()
            .insert(key.to_string(), value.to_string());
    }
}

#[derive(Serialize)]
struct PolygonJson<'a> {
    id: u64,
    tags: &'a Tags,
    /// `[lat, lon]` in degrees.
    points: Vec<[f64; 2]>,
}

#[derive(Serialize)]
struct TileWayMapJson<'a> {
    polygons: Vec<PolygonJson<'a>>,
    way_tags: &'a BTreeMap<u64, Tags>,
}

impl TileWayMap {
    pub fn write_json<W: Write>(&self, writer: W) -> Result<()> {
        let json = TileWayMapJson {
            polygons: self
                .polygons
                .iter()
                .map(|p| PolygonJson {
                    id: p.id,
                    tags: &p.tags,
                    points: p
                        .points
                        .iter()
                        .map(|c| [c.lat_degrees(), c.lon_degrees()])
                        .collect(),
                })
                .collect(),
            way_tags: &self.way_tags,
        };
        serde_json::to_writer_pretty(writer, &json)?;
        Ok(())
    }
}
