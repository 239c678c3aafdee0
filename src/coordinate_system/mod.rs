pub mod bbox;
pub mod coord;
pub mod geographic;
pub mod transformation;

pub use bbox::BBox;
pub use coord::{Coord, CoordArena, CoordId};
