use crate::config::MultiPolygonConfig;
use crate::coordinate_system::geographic::LLBBox;
use crate::error::Result;
use clap::Parser;
use std::path::PathBuf;

/// Command-line arguments parser
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Args {
    /// Overpass JSON file with the relations and their member ways and nodes (required)
    #[arg(long)]
    pub input: PathBuf,

    /// File to write the generated polygons to (optional, stdout if absent)
    #[arg(long)]
    pub output: Option<PathBuf>,

    /// Tile to clip to (min_lat,min_lng,max_lat,max_lng) (optional, defaults to the data extent)
    #[arg(long, allow_hyphen_values = true, value_parser = LLBBox::from_str)]
    pub bbox: Option<LLBBox>,

    /// JSON file with processing settings (optional)
    #[arg(long, env = "MP_CONFIG")]
    pub config: Option<PathBuf>,

    /// Tag key for the cumulative area of each relation (optional)
    #[arg(long)]
    pub area_tag: Option<String>,

    /// Split ring sets whose largest ring has more points than this (optional)
    #[arg(long)]
    pub partition_threshold: Option<usize>,

    /// Enable debug mode (optional)
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Settings from `--config` (or the defaults) with the flags applied on top.
    pub fn load_config(&self) -> Result<MultiPolygonConfig> {
        let mut config = match &self.config {
            Some(path) => MultiPolygonConfig::load(path)?,
            None => MultiPolygonConfig::default(),
        };
        if let Some(key) = &self.area_tag {
            config.area_tag = Some(key.clone());
        }
        if let Some(threshold) = self.partition_threshold {
            config.partition_point_threshold = threshold;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Validates CLI arguments after parsing.
pub fn validate_args(args: &Args) -> std::result::Result<(), String> {
    if !args.input.is_file() {
        return Err(format!("Input file does not exist: {}", args.input.display()));
    }
    if let Some(path) = &args.config {
        if !path.is_file() {
            return Err(format!("Config file does not exist: {}", path.display()));
        }
    }
    if let Some(parent) = args.output.as_ref().and_then(|p| p.parent()) {
        if !parent.as_os_str().is_empty() && !parent.is_dir() {
            return Err(format!("Output directory does not exist: {}", parent.display()));
        }
    }
    if args.area_tag.as_deref() == Some("") {
        return Err("The --area-tag key must not be empty.".to_string());
    }
    Ok(())
}
