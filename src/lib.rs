//! Resolves OSM multipolygon relations into simple polygons clipped to a tile.
//!
//! Member ways are joined into rings, rings cut open by the tile are closed
//! outside of it, rings are nested into outers and holes, holes are cut into
//! their outer ring and every resulting polygon is clipped to the tile. See
//! [`multipolygon::process_relation`] for the entry point.

pub mod args;
pub mod config;
pub mod coordinate_system;
pub mod debug_logging;
pub mod error;
pub mod geometry;
pub mod multipolygon;
pub mod osm_parser;
pub mod output;
pub mod shape_splitter;
#[cfg(test)]
mod test_utilities;
