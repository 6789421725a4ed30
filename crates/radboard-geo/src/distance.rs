//! Great-circle distance between coordinate pairs.

const EARTH_RADIUS_KM: f64 = 6371.0;

/// Haversine distance in kilometers.
pub fn haversine_km(lat1: f64, lon1: f64, lat2: f64, lon2: f64) -> f64 {
    let d_lat = (lat2 - lat1).to_radians();
    let d_lon = (lon2 - lon1).to_radians();

    let a = (d_lat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().asin();

    EARTH_RADIUS_KM * c
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_same_point_is_zero() {
        assert!(haversine_km(30.2672, -97.7431, 30.2672, -97.7431) < 1e-9);
    }

    #[test]
    fn test_new_york_to_los_angeles() {
        let d = haversine_km(40.7128, -74.0060, 34.0522, -118.2437);
        assert!((d - 3936.0).abs() < 30.0, "got {}", d);
    }

    #[test]
    fn test_austin_to_dallas() {
        let d = haversine_km(30.2672, -97.7431, 32.7767, -96.7970);
        assert!((d - 293.0).abs() < 5.0, "got {}", d);
    }

    #[test]
    fn test_symmetric() {
        let ab = haversine_km(47.6062, -122.3321, 25.7617, -80.1918);
        let ba = haversine_km(25.7617, -80.1918, 47.6062, -122.3321);
        assert!((ab - ba).abs() < 1e-9);
    }
}
