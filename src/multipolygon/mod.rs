//! Turns multipolygon relations into simple polygons clipped to a tile.
//!
//! A relation goes through these stages, all sharing one [`CoordArena`]:
//!
//! 1. member ways are joined into rings ([`way_joiner`]),
//! 2. chains left open by the tile cut are closed outside it ([`boundary_connector`]),
//! 3. large ring sets are partitioned ([`partition`]),
//! 4. rings are nested into outers and holes, and holes are cut in ([`resolver`]),
//! 5. every polygon is clipped to the tile and written to the sink.

pub mod boundary_connector;
pub mod containment;
pub mod diagnostics;
pub mod hole_cutter;
pub mod partition;
pub mod resolver;
pub mod ring;
pub mod way_joiner;

use crate::config::MultiPolygonConfig;
use crate::coordinate_system::{BBox, Coord, CoordArena};
use crate::debug_logging;
use crate::error::{MultiPolygonError, Result};
use crate::osm_parser::{ProcessedRelation, Tags};
use crate::output::{IdGenerator, OutputPolygon, WaySink};
use crate::shape_splitter::clip_to_bounds;
use boundary_connector::connect_rings;
use diagnostics::{Diagnostic, Diagnostics};
use geo::{Centroid, LineString, Polygon};
use indicatif::ProgressBar;
use log::{debug, error};
use partition::partition_rings;
use resolver::{resolve_partition, ResolvedPolygon, TagSource};
use ring::{Ring, SourceWay};
use way_joiner::{collect_members, join_ways};

#[derive(Debug, Clone, Default)]
pub struct RelationOutcome {
    pub relation_id: u64,
    /// Ids of the generated ways, in emission order.
    pub polygon_ids: Vec<u64>,
    pub diagnostics: Vec<Diagnostic>,
    /// Label node, or the centroid of the largest resolved polygon.
    pub cog: Option<Coord>,
    /// Rings discarded as unclosable or degenerate.
    pub dropped_rings: usize,
}

/// Processes one relation and writes its polygons to `sink`.
///
/// Recoverable problems are recorded as diagnostics. An `Err` means the
/// relation could not be resolved; nothing has been written to the sink then.
pub fn process_relation<S: WaySink>(
    relation: &ProcessedRelation,
    tile: &BBox,
    config: &MultiPolygonConfig,
    ids: &mut IdGenerator,
    sink: &mut S,
) -> Result<RelationOutcome> {
    let mut arena = CoordArena::new();
    let mut diagnostics = Diagnostics::new(relation.id);
    let mut outcome = RelationOutcome {
        relation_id: relation.id,
        ..RelationOutcome::default()
    };

    let members = collect_members(relation, &mut arena, &mut diagnostics);
    if members.is_empty() {
        diagnostics.record(Diagnostic::EmptyRelation);
        outcome.diagnostics = diagnostics.into_entries();
        return Ok(outcome);
    }

    let joined = join_ways(members, &arena, &mut diagnostics);
    snapshot(
        "joined",
        relation.id,
        &arena,
        joined.closed.iter().chain(joined.open.iter()),
        vec![format!("{} open chain(s)", joined.open.len())],
    );

    let connected = connect_rings(joined.open, tile, &mut arena, config, &mut diagnostics);
    outcome.dropped_rings += connected.dropped.len();
    let mut rings: Vec<Ring> = joined.closed;
    rings.extend(connected.closed);

    rings.retain(|ring| {
        if ring.is_degenerate() {
            diagnostics.record(Diagnostic::DegenerateRing {
                way_ids: ring.way_ids(),
            });
            outcome.dropped_rings += 1;
            return false;
        }
        true
    });
    snapshot("connected", relation.id, &arena, rings.iter(), Vec::new());

    let partitions = partition_rings(rings, &mut arena, config, &mut diagnostics);
    snapshot(
        "partitioned",
        relation.id,
        &arena,
        partitions.iter().flat_map(|p| p.rings.iter()),
        vec![format!("{} partition(s)", partitions.len())],
    );

    let mut resolved: Vec<ResolvedPolygon> = Vec::new();
    let mut outer_area2: i64 = 0;
    for partition in &partitions {
        let resolution = resolve_partition(&mut arena, partition, &mut diagnostics)?;
        outer_area2 += resolution.outer_area2;
        resolved.extend(resolution.polygons);
    }
    if debug_logging::is_tracking_relation(relation.id) {
        let rings = resolved.iter().map(|p| arena.resolve(&p.points)).collect();
        debug_logging::log_relation_stage("resolved", relation.id, rings, Vec::new());
    }

    outcome.cog = match relation.label {
        Some(label) => Some(label.coord),
        None => largest_centroid(&arena, &resolved),
    };

    let relation_tags = relation_tags(relation);
    let mut pending: Vec<OutputPolygon> = Vec::new();
    for polygon in &resolved {
        let mut tags = match &polygon.tags {
            TagSource::Relation => relation_tags.clone(),
            TagSource::Ways(sources) => {
                let merged = merge_way_tags(relation, sources)?;
                if merged.is_empty() {
                    debug!(
                        "Relation {}: ways {:?} share no tags, using the relation's",
                        relation.id,
                        sources.iter().map(|s| s.way_id).collect::<Vec<_>>()
                    );
                    relation_tags.clone()
                } else {
                    merged
                }
            }
        };
        tags.insert(config.created_tag.clone(), "true".to_string());
        tags.insert(config.role_tag.clone(), "outer".to_string());

        for part in clip_to_bounds(&mut arena, &polygon.points, tile) {
            pending.push(OutputPolygon {
                id: 0,
                points: arena.resolve(&part),
                tags: tags.clone(),
            });
        }
    }

    if debug_logging::is_tracking_relation(relation.id) {
        let rings = pending.iter().map(|p| p.points.clone()).collect();
        debug_logging::log_relation_stage("clipped", relation.id, rings, Vec::new());
    }

    let area = config
        .area_tag
        .as_ref()
        .map(|key| (key, format!("{:.3}", outer_area2 as f64 / 2.0)));
    for mut polygon in pending {
        if let Some((key, value)) = &area {
            polygon.tags.insert((*key).clone(), value.clone());
        }
        polygon.id = ids.next_id();
        outcome.polygon_ids.push(polygon.id);
        sink.add_polygon(polygon);
    }
    mark_outer_ways(relation, config, sink);

    outcome.diagnostics = diagnostics.into_entries();
    Ok(outcome)
}

/// Processes a batch of relations, one at a time.
///
/// A relation that fails is logged and skipped; its outer ways still get the
/// style-filter marker so they are drawn as lines.
pub fn process_relations<S: WaySink>(
    relations: &[ProcessedRelation],
    tile: &BBox,
    config: &MultiPolygonConfig,
    ids: &mut IdGenerator,
    sink: &mut S,
    progress: &ProgressBar,
) -> Vec<RelationOutcome> {
    process_batch(relations, config, sink, progress, |relation, sink| {
        process_relation(relation, tile, config, ids, sink)
    })
}

fn process_batch<S, F>(
    relations: &[ProcessedRelation],
    config: &MultiPolygonConfig,
    sink: &mut S,
    progress: &ProgressBar,
    mut process: F,
) -> Vec<RelationOutcome>
where
    S: WaySink,
    F: FnMut(&ProcessedRelation, &mut S) -> Result<RelationOutcome>,
{
    let mut outcomes = Vec::with_capacity(relations.len());

    for relation in relations {
        progress.inc(1);
        match process(relation, sink) {
            Ok(outcome) => outcomes.push(outcome),
            Err(e) => {
                error!("Relation {}: {}, skipping it", relation.id, e);
                mark_outer_ways(relation, config, sink);
            }
        }
    }

    outcomes
}

fn mark_outer_ways<S: WaySink>(relation: &ProcessedRelation, config: &MultiPolygonConfig, sink: &mut S) {
    for way_id in relation.outer_way_ids() {
        sink.tag_original_way(way_id, &config.style_filter_tag, &config.style_filter_value);
    }
}

fn relation_tags(relation: &ProcessedRelation) -> Tags {
    let mut tags = relation.tags.clone();
    tags.remove("type");
    tags
}

/// Tags on which all `sources` agree.
fn merge_way_tags(relation: &ProcessedRelation, sources: &[SourceWay]) -> Result<Tags> {
    let mut merged: Option<Tags> = None;
    for source in sources {
        let member =
            relation
                .members
                .get(source.member)
                .ok_or(MultiPolygonError::IndexOutOfRange {
                    what: "relation members",
                    index: source.member,
                    len: relation.members.len(),
                })?;
        let tags = &member.way.tags;
        merged = Some(match merged {
            None => tags.clone(),
            Some(mut current) => {
                current.retain(|key, value| tags.get(key) == Some(value));
                current
            }
        });
    }
    Ok(merged.unwrap_or_default())
}

fn largest_centroid(arena: &CoordArena, polygons: &[ResolvedPolygon]) -> Option<Coord> {
    let largest = polygons.iter().max_by_key(|p| p.area2)?;
    let exterior: LineString<f64> = arena
        .resolve(&largest.points)
        .into_iter()
        .map(|c| (c.lon as f64, c.lat as f64))
        .collect::<Vec<_>>()
        .into();
    let centroid = Polygon::new(exterior, Vec::new()).centroid()?;
    Some(Coord::new(
        centroid.y().round() as i32,
        centroid.x().round() as i32,
    ))
}

fn snapshot<'a>(
    stage: &str,
    relation_id: u64,
    arena: &CoordArena,
    rings: impl Iterator<Item = &'a Ring>,
    notes: Vec<String>,
) {
    if !debug_logging::is_tracking_relation(relation_id) {
        return;
    }
    let rings: Vec<Vec<Coord>> = rings
        .map(|ring| arena.resolve(&ring.points))
        .collect();
    debug_logging::log_relation_stage(stage, relation_id, rings, notes);
}
