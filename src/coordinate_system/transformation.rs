//! Conversion between degrees and fixed-point map units.

/// Map units per full turn (360 degrees).
pub const UNITS_PER_TURN: f64 = (1u32 << 24) as f64;

pub fn degrees_to_map_units(degrees: f64) -> i32 {
    (degrees * UNITS_PER_TURN / 360.0).round() as i32
}

/// Largest map unit at or below `degrees`.
pub fn degrees_to_map_units_floor(degrees: f64) -> i32 {
    (degrees * UNITS_PER_TURN / 360.0).floor() as i32
}

/// Smallest map unit at or above `degrees`.
pub fn degrees_to_map_units_ceil(degrees: f64) -> i32 {
    (degrees * UNITS_PER_TURN / 360.0).ceil() as i32
}

pub fn map_units_to_degrees(units: i32) -> f64 {
    units as f64 * 360.0 / UNITS_PER_TURN
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_extremes() {
        assert_eq!(degrees_to_map_units(180.0), 1 << 23);
        assert_eq!(degrees_to_map_units(-90.0), -(1 << 22));
        assert_eq!(map_units_to_degrees(1 << 23), 180.0);
    }

    #[test]
    fn test_directed_rounding() {
        let unit = 360.0 / UNITS_PER_TURN;
        assert_eq!(degrees_to_map_units_floor(10.6 * unit), 10);
        assert_eq!(degrees_to_map_units_ceil(10.2 * unit), 11);
        assert_eq!(degrees_to_map_units_floor(-10.2 * unit), -11);
        assert_eq!(degrees_to_map_units_ceil(12.0 * unit), 12);
    }
}
