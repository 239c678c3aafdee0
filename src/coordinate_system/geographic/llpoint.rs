use crate::coordinate_system::Coord;

/// Bounds-checked latitude and longitude in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LLPoint {
    lat: f64,
    lng: f64,
}

impl LLPoint {
    pub fn new(lat: f64, lng: f64) -> Result<Self, String> {
        if !(-90.0..=90.0).contains(&lat) {
            return Err(format!("Latitude {lat} not in range -90.0..=90.0"));
        }

        if !(-180.0..=180.0).contains(&lng) {
            return Err(format!("Longitude {lng} not in range -180.0..=180.0"));
        }

        Ok(Self { lat, lng })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn to_coord(&self) -> Coord {
        Coord::from_degrees(self.lat, self.lng)
    }
}
