//! Great-circle distance math and distance formatting.

use crate::models::Coordinates;

const EARTH_RADIUS_M: f64 = 6_371_000.0;

/// Haversine distance between two points, in meters.
#[must_use]
pub fn distance_meters(a: Coordinates, b: Coordinates) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_M * h.sqrt().asin()
}

#[must_use]
pub fn is_within_radius(center: Coordinates, point: Coordinates, radius_m: f64) -> bool {
    distance_meters(center, point) <= radius_m
}

/// Human-readable distance: meters below 1 km, one decimal below 10 km,
/// whole kilometers beyond.
#[must_use]
pub fn format_distance(meters: f64) -> String {
    if meters < 1000.0 {
        format!("{}m", meters.round() as i64)
    } else if meters < 10_000.0 {
        format!("{:.1}km", meters / 1000.0)
    } else {
        format!("{}km", (meters / 1000.0).round() as i64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const BERLIN: Coordinates = Coordinates::new(52.52, 13.405);
    const HAMBURG: Coordinates = Coordinates::new(53.5511, 9.9937);

    #[test]
    fn distance_to_self_is_zero() {
        assert!(distance_meters(BERLIN, BERLIN).abs() < f64::EPSILON);
    }

    #[test]
    fn distance_is_symmetric() {
        let there = distance_meters(BERLIN, HAMBURG);
        let back = distance_meters(HAMBURG, BERLIN);
        assert!((there - back).abs() < 1e-6);
    }

    #[test]
    fn berlin_hamburg_is_roughly_255km() {
        let d = distance_meters(BERLIN, HAMBURG);
        assert!((250_000.0..260_000.0).contains(&d), "got {d}");
    }

    #[test]
    fn radius_check_matches_distance() {
        let near = Coordinates::new(52.521, 13.406);
        assert!(is_within_radius(BERLIN, near, 500.0));
        assert!(!is_within_radius(BERLIN, HAMBURG, 100_000.0));
    }

    #[test]
    fn formats_distances_per_magnitude() {
        assert_eq!(format_distance(500.0), "500m");
        assert_eq!(format_distance(999.4), "999m");
        assert_eq!(format_distance(1500.0), "1.5km");
        assert_eq!(format_distance(9999.0), "10.0km");
        assert_eq!(format_distance(25_000.0), "25km");
    }
}
