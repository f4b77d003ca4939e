use crate::utils::events::models::GeoPoint;
use serde::Serialize;

pub const EARTH_RADIUS_KM: f64 = 6371.0;
/// Kilometres per degree of latitude, rounded the way the box filter expects.
const KM_PER_DEGREE: f64 = 111.0;

/// Rectangular pre-filter around a point.
///
/// Over-inclusive: corners of the box lie outside the radius and
/// the longitude span widens towards the poles. Callers that need the exact
/// circle refine afterwards.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct BoundingBox {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lon: f64,
    pub max_lon: f64,
}

impl BoundingBox {
    pub fn around(center: GeoPoint, radius_km: f64) -> Self {
        let lat_delta = radius_km / KM_PER_DEGREE;
        let lon_delta = radius_km / (KM_PER_DEGREE * center.latitude.to_radians().cos());
        Self {
            min_lat: center.latitude - lat_delta,
            max_lat: center.latitude + lat_delta,
            min_lon: center.longitude - lon_delta,
            max_lon: center.longitude + lon_delta,
        }
    }

    pub fn contains(&self, point: GeoPoint) -> bool {
        (self.min_lat..=self.max_lat).contains(&point.latitude)
            && (self.min_lon..=self.max_lon).contains(&point.longitude)
    }
}

pub fn haversine_km(from: GeoPoint, to: GeoPoint) -> f64 {
    let d_lat = (to.latitude - from.latitude).to_radians();
    let d_lon = (to.longitude - from.longitude).to_radians();
    let a = (d_lat / 2.0).sin().powi(2)
        + from.latitude.to_radians().cos()
            * to.latitude.to_radians().cos()
            * (d_lon / 2.0).sin().powi(2);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());
    EARTH_RADIUS_KM * c
}

pub fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}
