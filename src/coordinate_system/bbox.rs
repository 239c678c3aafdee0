use super::coord::Coord;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Inclusive rectangle in map units.
///
/// Points on the border count as inside for [`BBox::contains`]; use
/// [`BBox::contains_strict`] when the border must be excluded.
#[derive(Debug, Deserialize, Serialize, Copy, Clone, Default, PartialEq, Eq)]
pub struct BBox {
    pub min_lat: i32,
    pub min_lon: i32,
    pub max_lat: i32,
    pub max_lon: i32,
}

impl BBox {
    pub fn new(min_lat: i32, min_lon: i32, max_lat: i32, max_lon: i32) -> Result<Self, String> {
        if min_lat > max_lat || min_lon > max_lon {
            return Err(format!(
                "Invalid BBox: min ({min_lat}, {min_lon}) is not below max ({max_lat}, {max_lon})"
            ));
        }

        Ok(Self {
            min_lat,
            min_lon,
            max_lat,
            max_lon,
        })
    }

    pub fn from_point(coord: Coord) -> Self {
        Self {
            min_lat: coord.lat,
            min_lon: coord.lon,
            max_lat: coord.lat,
            max_lon: coord.lon,
        }
    }

    /// Bounding box of a point sequence, `None` when the sequence is empty.
    pub fn from_coords<I: IntoIterator<Item = Coord>>(coords: I) -> Option<Self> {
        let mut iter = coords.into_iter();
        let mut bbox = Self::from_point(iter.next()?);
        for coord in iter {
            bbox.extend(coord);
        }
        Some(bbox)
    }

    pub fn extend(&mut self, coord: Coord) {
        self.min_lat = self.min_lat.min(coord.lat);
        self.min_lon = self.min_lon.min(coord.lon);
        self.max_lat = self.max_lat.max(coord.lat);
        self.max_lon = self.max_lon.max(coord.lon);
    }

    pub fn union(&self, other: &BBox) -> BBox {
        BBox {
            min_lat: self.min_lat.min(other.min_lat),
            min_lon: self.min_lon.min(other.min_lon),
            max_lat: self.max_lat.max(other.max_lat),
            max_lon: self.max_lon.max(other.max_lon),
        }
    }

    pub fn contains(&self, coord: Coord) -> bool {
        coord.lat >= self.min_lat
            && coord.lat <= self.max_lat
            && coord.lon >= self.min_lon
            && coord.lon <= self.max_lon
    }

    pub fn contains_strict(&self, coord: Coord) -> bool {
        coord.lat > self.min_lat
            && coord.lat < self.max_lat
            && coord.lon > self.min_lon
            && coord.lon < self.max_lon
    }

    pub fn contains_bbox(&self, other: &BBox) -> bool {
        other.min_lat >= self.min_lat
            && other.max_lat <= self.max_lat
            && other.min_lon >= self.min_lon
            && other.max_lon <= self.max_lon
    }

    pub fn intersects(&self, other: &BBox) -> bool {
        self.min_lat <= other.max_lat
            && other.min_lat <= self.max_lat
            && self.min_lon <= other.max_lon
            && other.min_lon <= self.max_lon
    }

    pub fn width(&self) -> i64 {
        self.max_lon as i64 - self.min_lon as i64
    }

    pub fn height(&self) -> i64 {
        self.max_lat as i64 - self.min_lat as i64
    }

    pub fn area(&self) -> i64 {
        self.width() * self.height()
    }

    pub fn center(&self) -> Coord {
        Coord::new(
            ((self.min_lat as i64 + self.max_lat as i64) / 2) as i32,
            ((self.min_lon as i64 + self.max_lon as i64) / 2) as i32,
        )
    }

    /// The four corners, counter-clockwise from south-west.
    pub fn corners(&self) -> [Coord; 4] {
        [
            Coord::new(self.min_lat, self.min_lon),
            Coord::new(self.min_lat, self.max_lon),
            Coord::new(self.max_lat, self.max_lon),
            Coord::new(self.max_lat, self.min_lon),
        ]
    }
}

impl fmt::Display for BBox {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "BBox(({}, {}) - ({}, {}))",
            self.min_lat, self.min_lon, self.max_lat, self.max_lon
        )
    }
}
