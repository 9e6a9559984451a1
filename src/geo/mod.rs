use crate::models::driver::GeoPoint;

const EARTH_RADIUS_KM: f64 = 6_371.0;

/// Great-circle distance between two points, used for driver-to-pickup
/// proximity in auto-nearest selection.
pub fn haversine_km(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let delta_lat = (b.lat - a.lat).to_radians();
    let delta_lng = (b.lng - a.lng).to_radians();

    let h = (delta_lat / 2.0).sin().powi(2)
        + a.lat.to_radians().cos() * b.lat.to_radians().cos() * (delta_lng / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

#[cfg(test)]
mod tests {
    use super::haversine_km;
    use crate::models::driver::GeoPoint;

    #[test]
    fn same_point_is_zero() {
        let p = GeoPoint {
            lat: 14.5995,
            lng: 120.9842,
        };
        assert!(haversine_km(&p, &p) < 1e-9);
    }

    #[test]
    fn new_york_to_boston_is_around_306_km() {
        let new_york = GeoPoint {
            lat: 40.7128,
            lng: -74.0060,
        };
        let boston = GeoPoint {
            lat: 42.3601,
            lng: -71.0589,
        };
        let distance = haversine_km(&new_york, &boston);
        assert!((distance - 306.0).abs() < 5.0);
    }

    #[test]
    fn symmetric() {
        let a = GeoPoint {
            lat: 14.5995,
            lng: 120.9842,
        };
        let b = GeoPoint {
            lat: 14.6760,
            lng: 121.0437,
        };
        assert!((haversine_km(&a, &b) - haversine_km(&b, &a)).abs() < 1e-9);
    }
}
