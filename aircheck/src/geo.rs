//! Great-circle geometry over decimal-degree coordinates.

/// Mean Earth radius in kilometers.
const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance in kilometers between two points given in decimal
/// degrees, by the haversine formula.
///
/// Pure and symmetric; coincident points yield exactly 0. A NaN coordinate
/// yields a NaN distance rather than a panic, so callers can treat an
/// unparseable position as "no usable distance".
#[must_use]
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Parse a decimal-degree coordinate held as text, as the observer
/// directory stores it. Non-numeric text maps to NaN.
#[must_use]
pub fn parse_coordinate(text: &str) -> f64 {
    text.trim().parse().unwrap_or(f64::NAN)
}

#[cfg(test)]
mod tests {
    use super::{haversine_km, parse_coordinate};

    #[test]
    fn coincident_points_are_zero() {
        assert_eq!(haversine_km(12.97, 77.59, 12.97, 77.59), 0.0);
    }

    #[test]
    fn symmetric() {
        let there = haversine_km(12.97, 77.59, 59.33, 18.07);
        let back = haversine_km(59.33, 18.07, 12.97, 77.59);
        assert!((there - back).abs() < 1e-6);
    }

    #[test]
    fn one_degree_of_longitude_at_the_equator() {
        let d = haversine_km(0.0, 0.0, 0.0, 1.0);
        assert!((d - 111.19).abs() < 0.01, "got {d}");
    }

    #[test]
    fn garbage_text_becomes_nan() {
        assert!(parse_coordinate("somewhere").is_nan());
        assert!(haversine_km(f64::NAN, 77.59, 12.98, 77.60).is_nan());
    }

    #[test]
    fn parses_padded_text() {
        assert_eq!(parse_coordinate(" 12.97 "), 12.97);
    }
}
