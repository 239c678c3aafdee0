//! Tunables of multipolygon processing, loaded from JSON and the command line.
use crate::error::{MultiPolygonError, Result};
use log::info;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// First id handed out to generated polygons, well above current OSM way ids.
pub const DEFAULT_FIRST_GENERATED_ID: u64 = 1 << 42;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MultiPolygonConfig {
    /// A partition whose largest ring has more points than this is split.
    pub partition_point_threshold: usize,
    pub max_partition_depth: u32,
    /// Only connect open chains at ends that are not strictly inside the tile.
    pub connect_outside_only: bool,
    /// Key of the optional cumulative-area tag.
    pub area_tag: Option<String>,
    pub created_tag: String,
    pub role_tag: String,
    pub style_filter_tag: String,
    pub style_filter_value: String,
    pub first_generated_id: u64,
}

impl Default for MultiPolygonConfig {
    fn default() -> Self {
        Self {
            partition_point_threshold: 5000,
            max_partition_depth: 8,
            connect_outside_only: true,
            area_tag: None,
            created_tag: "mp:created".to_string(),
            role_tag: "mp:role".to_string(),
            style_filter_tag: "mp:stylefilter".to_string(),
            style_filter_value: "polyline".to_string(),
            first_generated_id: DEFAULT_FIRST_GENERATED_ID,
        }
    }
}

impl MultiPolygonConfig {
    pub fn from_json(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let json = fs::read_to_string(path)?;
        Self::from_json(&json)
    }

    pub fn validate(&self) -> Result<()> {
        if self.partition_point_threshold < 4 {
            return Err(MultiPolygonError::InvalidInput(format!(
                "partition_point_threshold must be at least 4, got {}",
                self.partition_point_threshold
            )));
        }
        if self.max_partition_depth == 0 {
            return Err(MultiPolygonError::InvalidInput(
                "max_partition_depth must be at least 1".to_string(),
            ));
        }
        if self.created_tag.is_empty() || self.role_tag.is_empty() || self.style_filter_tag.is_empty() {
            return Err(MultiPolygonError::InvalidInput(
                "marker tag keys must not be empty".to_string(),
            ));
        }
        Ok(())
    }

    pub fn log_config(&self) {
        info!(
            "[config] partition threshold: {} points, max depth: {}, connect outside only: {}, area tag: {}",
            self.partition_point_threshold,
            self.max_partition_depth,
            self.connect_outside_only,
            self.area_tag.as_deref().unwrap_or("-")
        );
    }
}
