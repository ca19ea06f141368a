//! Great-circle distance between coordinates.

use crate::models::Coordinates;

pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers on a spherical Earth.
///
/// Ranges are not checked here. Non-finite input yields NaN, which callers
/// treat as an unknown distance.
pub fn distance_km(a: Coordinates, b: Coordinates) -> f64 {
    let d_lat = (b.lat - a.lat).to_radians();
    let d_lng = (b.lng - a.lng).to_radians();
    let lat1 = a.lat.to_radians();
    let lat2 = b.lat.to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lng / 2.0).sin().powi(2);
    // Rounding can push h a hair past 1.0 for antipodal points
    let c = 2.0 * h.sqrt().min(1.0).asin();
    EARTH_RADIUS_KM * c
}

/// Distance to a listing, or `None` when either side is out of range.
pub fn known_distance_km(from: Coordinates, to: Coordinates) -> Option<f64> {
    if !from.is_valid() || !to.is_valid() {
        return None;
    }
    let d = distance_km(from, to);
    d.is_finite().then_some(d)
}

#[cfg(test)]
mod tests {
    use super::*;

    const KARACHI: Coordinates = Coordinates::new(24.8607, 67.0011);
    const ISTANBUL: Coordinates = Coordinates::new(41.0082, 28.9784);

    #[test]
    fn test_distance_to_self_is_zero() {
        assert_eq!(distance_km(KARACHI, KARACHI), 0.0);
        assert_eq!(distance_km(ISTANBUL, ISTANBUL), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        assert_eq!(distance_km(KARACHI, ISTANBUL), distance_km(ISTANBUL, KARACHI));
    }

    #[test]
    fn test_karachi_istanbul_sanity_bound() {
        // ~3935 km great-circle
        let d = distance_km(KARACHI, ISTANBUL);
        assert!(d > 3900.0 && d < 3970.0, "got {d}");
    }

    #[test]
    fn test_antipodes_is_half_circumference() {
        let d = distance_km(Coordinates::new(0.0, 0.0), Coordinates::new(0.0, 180.0));
        assert!((d - std::f64::consts::PI * EARTH_RADIUS_KM).abs() < 1e-6);
    }

    #[test]
    fn test_non_finite_input_is_nan() {
        let d = distance_km(Coordinates::new(f64::NAN, 0.0), KARACHI);
        assert!(d.is_nan());
        assert_eq!(known_distance_km(Coordinates::new(f64::NAN, 0.0), KARACHI), None);
    }

    #[test]
    fn test_out_of_range_distance_is_unknown() {
        assert_eq!(known_distance_km(KARACHI, Coordinates::new(120.0, 0.0)), None);
        assert!(known_distance_km(KARACHI, ISTANBUL).is_some());
    }
}
