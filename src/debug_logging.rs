use crate::coordinate_system::Coord;
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

static DEBUG_LOG: Lazy<Mutex<DebugLogger>> = Lazy::new(|| Mutex::new(DebugLogger::from_env()));

/// Environment variable listing the relation ids to trace, comma separated.
pub const DEBUG_RELATIONS_ENV: &str = "MP_DEBUG_RELATIONS";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RingSnapshot {
    pub point_count: usize,
    pub closed: bool,
    /// `[lat, lon]` in degrees.
    pub points: Vec<[f64; 2]>,
}

impl From<Vec<Coord>> for RingSnapshot {
    fn from(coords: Vec<Coord>) -> Self {
        RingSnapshot {
            point_count: coords.len(),
            closed: coords.len() > 1 && coords.first() == coords.last(),
            points: coords
                .iter()
                .map(|c| [c.lat_degrees(), c.lon_degrees()])
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelationStage {
    /// Position of the stage in the whole run.
    pub sequence: usize,
    pub stage: String,
    pub relation_id: u64,
    pub rings: Vec<RingSnapshot>,
    pub notes: Vec<String>,
}

pub struct DebugLogger {
    enabled_relations: Vec<u64>,
    stages: Vec<RelationStage>,
}

impl DebugLogger {
    pub fn new(enabled_relations: Vec<u64>) -> Self {
        DebugLogger {
            enabled_relations,
            stages: Vec::new(),
        }
    }

    // Format: MP_DEBUG_RELATIONS=2174812,62422
    fn from_env() -> Self {
        let enabled_relations = std::env::var(DEBUG_RELATIONS_ENV)
            .map(|s| parse_relation_ids(&s))
            .unwrap_or_default();

        if !enabled_relations.is_empty() {
            log::info!("Relation tracking enabled for IDs: {:?}", enabled_relations);
        }
        DebugLogger::new(enabled_relations)
    }

    pub fn is_tracking(&self, relation_id: u64) -> bool {
        self.enabled_relations.contains(&relation_id)
    }

    pub fn log_relation(&mut self, stage: &str, relation_id: u64, rings: Vec<Vec<Coord>>, notes: Vec<String>) {
        if !self.is_tracking(relation_id) {
            return;
        }

        self.stages.push(RelationStage {
            sequence: self.stages.len(),
            stage: stage.to_string(),
            relation_id,
            rings: rings.into_iter().map(RingSnapshot::from).collect(),
            notes,
        });
    }

    pub fn stages(&self) -> &[RelationStage] {
        &self.stages
    }

    /// Writes the recorded stages to `debug_relations_<n>.json` in `dir`,
    /// `n` being the first free number. Returns `None` when nothing was recorded.
    pub fn write_to_dir(&self, dir: &Path) -> std::io::Result<Option<PathBuf>> {
        if self.stages.is_empty() {
            return Ok(None);
        }

        let path = (0u32..)
            .map(|n| dir.join(format!("debug_relations_{n}.json")))
            .find(|p| !p.exists())
            .unwrap_or_else(|| dir.join("debug_relations.json"));

        let mut file = File::create(&path)?;
        let json = serde_json::to_string_pretty(&self.stages)?;
        file.write_all(json.as_bytes())?;

        log::info!(
            "Wrote {} relation stages to {}",
            self.stages.len(),
            path.display()
        );
        Ok(Some(path))
    }
}

fn parse_relation_ids(s: &str) -> Vec<u64> {
    s.split(',')
        .filter_map(|id| id.trim().parse::<u64>().ok())
        .collect()
}

// Public API functions
pub fn log_relation_stage(stage: &str, relation_id: u64, rings: Vec<Vec<Coord>>, notes: Vec<String>) {
    if let Ok(mut logger) = DEBUG_LOG.lock() {
        logger.log_relation(stage, relation_id, rings, notes);
    }
}

pub fn is_tracking_relation(relation_id: u64) -> bool {
    DEBUG_LOG
        .lock()
        .map(|logger| logger.is_tracking(relation_id))
        .unwrap_or(false)
}

/// Writes the recorded stages into the working directory.
pub fn write_debug_log() {
    if let Ok(logger) = DEBUG_LOG.lock() {
        if let Err(e) = logger.write_to_dir(Path::new(".")) {
            log::error!("Failed to write debug log: {}", e);
        }
    }
}
