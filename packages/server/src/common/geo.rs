use serde::{Deserialize, Serialize};

const EARTH_RADIUS_KM: f64 = 6371.0;

/// A point on the Earth's surface (WGS84 degrees).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Great-circle distance to `other` in kilometers.
    pub fn distance_km(&self, other: &GeoPoint) -> f64 {
        calculate_distance_km(
            self.latitude,
            self.longitude,
            other.latitude,
            other.longitude,
        )
    }
}

/// Calculate distance between two coordinates in kilometers
///
/// Uses Haversine formula for accuracy on Earth's surface. The SQL function
/// `haversine_distance` in the migrations computes the same value.
pub fn calculate_distance_km(lat1: f64, lng1: f64, lat2: f64, lng2: f64) -> f64 {
    let dlat = (lat2 - lat1).to_radians();
    let dlng = (lng2 - lng1).to_radians();

    let a = (dlat / 2.0).sin().powi(2)
        + lat1.to_radians().cos() * lat2.to_radians().cos() * (dlng / 2.0).sin().powi(2);

    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Round a distance for display (2 decimal places).
pub fn round_km(km: f64) -> f64 {
    (km * 100.0).round() / 100.0
}

/// Point `km` kilometers due north of `origin`.
///
/// Along a meridian the haversine distance is exactly the arc length, which makes this
/// handy for placing fixtures at known distances.
pub fn offset_north_km(origin: GeoPoint, km: f64) -> GeoPoint {
    let delta_deg = (km / EARTH_RADIUS_KM).to_degrees();
    GeoPoint::new(origin.latitude + delta_deg, origin.longitude)
}
