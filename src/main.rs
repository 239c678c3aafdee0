use clap::Parser;
use colored::*;
use indicatif::{ProgressBar, ProgressStyle};
use osm_multipolygon::args::{validate_args, Args};
use osm_multipolygon::coordinate_system::BBox;
use osm_multipolygon::debug_logging;
use osm_multipolygon::error::Result;
use osm_multipolygon::multipolygon::process_relations;
use osm_multipolygon::osm_parser::parse_osm_data;
use osm_multipolygon::output::{IdGenerator, TileWayMap};
use std::fs::{self, File};
use std::io::{self, BufWriter};
use std::process::ExitCode;

fn main() -> ExitCode {
    let args: Args = Args::parse();

    let log_level = if args.debug { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(log_level)).init();

    if let Err(e) = validate_args(&args) {
        eprintln!("{}: {}", "Error".red().bold(), e);
        return ExitCode::FAILURE;
    }

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("{}: {}", "Error".red().bold(), e);
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<()> {
    let config = args.load_config()?;
    config.log_config();

    eprintln!("{} Parsing data...", "[1/4]".bold());
    let json = fs::read_to_string(&args.input)?;
    let parsed = parse_osm_data(&json)?;

    let Some(tile) = args.bbox.map(|b| b.to_map_bbox()).or(parsed.bounds) else {
        log::warn!("Input holds no nodes and no --bbox was given, nothing to do");
        return Ok(());
    };
    log::info!("Tile: {}", tile);

    eprintln!(
        "{} Processing {} relation(s)...",
        "[2/4]".bold(),
        parsed.relations.len()
    );
    let mut sink = TileWayMap::default();
    let mut ids = IdGenerator::new(config.first_generated_id);
    let process_pb = progress_bar(parsed.relations.len(), &tile);
    let outcomes = process_relations(
        &parsed.relations,
        &tile,
        &config,
        &mut ids,
        &mut sink,
        &process_pb,
    );
    process_pb.finish();

    let diagnostics: usize = outcomes.iter().map(|o| o.diagnostics.len()).sum();
    let skipped = parsed.relations.len() - outcomes.len();
    log::info!(
        "{} polygon(s) from {} relation(s), {} diagnostic(s), {} relation(s) skipped",
        sink.polygons.len(),
        outcomes.len(),
        diagnostics,
        skipped
    );

    eprintln!("{} Writing output...", "[3/4]".bold());
    match &args.output {
        Some(path) => sink.write_json(BufWriter::new(File::create(path)?))?,
        None => sink.write_json(io::stdout().lock())?,
    }

    eprintln!("{} Writing debug log...", "[4/4]".bold());
    debug_logging::write_debug_log();

    eprintln!("{}", "Done!".green().bold());
    Ok(())
}

fn progress_bar(len: usize, tile: &BBox) -> ProgressBar {
    let pb = ProgressBar::new(len as u64);
    if let Ok(style) = ProgressStyle::default_bar()
        .template("{spinner:.green} [{elapsed_precise}] [{bar:45.white/black}] {pos}/{len} relations ({eta}) {msg}")
    {
        pb.set_style(style.progress_chars("█▓░"));
    }
    pb.set_message(format!("tile {}", tile));
    pb
}
