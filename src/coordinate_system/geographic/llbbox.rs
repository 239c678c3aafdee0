use super::LLPoint;
use crate::coordinate_system::transformation::{
    degrees_to_map_units_ceil, degrees_to_map_units_floor,
};
use crate::coordinate_system::BBox;

/// A checked bounding box in degrees.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct LLBBox {
    /// The "bottom-left" vertex of the rectangle
    min: LLPoint,

    /// The "top-right" vertex of the rectangle
    max: LLPoint,
}

impl LLBBox {
    pub fn new(min_lat: f64, min_lng: f64, max_lat: f64, max_lng: f64) -> Result<Self, String> {
        let vals_in_order = min_lng < max_lng && min_lat < max_lat;

        if !vals_in_order {
            return Err("Invalid BBox".to_string());
        }

        let min = LLPoint::new(min_lat, min_lng)?;
        let max = LLPoint::new(max_lat, max_lng)?;

        Ok(Self { min, max })
    }

    /// Parses `min_lat,min_lng,max_lat,max_lng` (commas or spaces).
    pub fn from_str(s: &str) -> Result<Self, String> {
        let values: Vec<f64> = s
            .split([',', ' '])
            .filter(|part| !part.is_empty())
            .map(|part| {
                part.trim()
                    .parse::<f64>()
                    .map_err(|e| format!("Invalid bbox value \"{part}\": {e}"))
            })
            .collect::<Result<_, _>>()?;

        let [min_lat, min_lng, max_lat, max_lng]: [f64; 4] = values
            .try_into()
            .map_err(|v: Vec<f64>| format!("Expected 4 bbox values, got {}", v.len()))?;

        Self::new(min_lat, min_lng, max_lat, max_lng)
    }

    pub fn min(&self) -> LLPoint {
        self.min
    }

    pub fn max(&self) -> LLPoint {
        self.max
    }

    /// The tile rectangle in map units, rounded outwards.
    pub fn to_map_bbox(&self) -> BBox {
        BBox {
            min_lat: degrees_to_map_units_floor(self.min.lat()),
            min_lon: degrees_to_map_units_floor(self.min.lng()),
            max_lat: degrees_to_map_units_ceil(self.max.lat()),
            max_lon: degrees_to_map_units_ceil(self.max.lng()),
        }
    }
}
