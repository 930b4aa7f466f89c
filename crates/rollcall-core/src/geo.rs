//! Geographic points and great-circle distance.
//!
//! Distances are computed with the haversine formula on a sphere of radius
//! [`EARTH_RADIUS_KM`]. This is accurate to roughly 0.5% over the surface of
//! the Earth, which is far below the tolerance of a geofence check.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;
use utoipa::ToSchema;

/// Mean Earth radius used for all distance calculations, in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

const METERS_PER_KILOMETER: f64 = 1000.0;

/// Errors from constructing a [`GeoPoint`].
#[derive(Debug, Clone, Copy, PartialEq, Error)]
pub enum GeoError {
    /// Latitude is NaN, infinite or outside [-90, 90].
    #[error("Invalid latitude {0}. Expected a finite value between -90 and 90 degrees.")]
    InvalidLatitude(f64),

    /// Longitude is NaN, infinite or outside [-180, 180].
    #[error("Invalid longitude {0}. Expected a finite value between -180 and 180 degrees.")]
    InvalidLongitude(f64),
}

/// A latitude/longitude pair in decimal degrees.
///
/// Always holds a valid coordinate: construction and deserialization both go
/// through [`GeoPoint::new`].
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(try_from = "RawGeoPoint")]
#[schema(example = json!({"latitude": 37.7749, "longitude": -122.4194}))]
pub struct GeoPoint {
    /// Latitude in degrees, -90 to 90.
    latitude: f64,

    /// Longitude in degrees, -180 to 180.
    longitude: f64,
}

#[derive(Deserialize)]
struct RawGeoPoint {
    latitude: f64,
    longitude: f64,
}

impl TryFrom<RawGeoPoint> for GeoPoint {
    type Error = GeoError;

    fn try_from(raw: RawGeoPoint) -> Result<Self, Self::Error> {
        Self::new(raw.latitude, raw.longitude)
    }
}

impl GeoPoint {
    /// Create a point, validating both coordinates.
    ///
    /// # Errors
    ///
    /// Returns [`GeoError`] if either coordinate is non-finite or out of range.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(GeoError::InvalidLatitude(latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(GeoError::InvalidLongitude(longitude));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }

    /// Latitude in degrees.
    #[inline]
    #[must_use]
    pub const fn latitude(&self) -> f64 {
        self.latitude
    }

    /// Longitude in degrees.
    #[inline]
    #[must_use]
    pub const fn longitude(&self) -> f64 {
        self.longitude
    }
}

impl fmt::Display for GeoPoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({:.6}, {:.6})", self.latitude, self.longitude)
    }
}

/// Great-circle distance between two points, in meters.
///
/// Symmetric in its arguments and zero for identical points. The haversine
/// term is clamped to `[0, 1]` so that antipodal points cannot produce NaN
/// through floating-point overshoot.
#[must_use]
pub fn distance_meters(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat_a = a.latitude.to_radians();
    let lat_b = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat_a.cos() * lat_b.cos() * (d_lon / 2.0).sin().powi(2);
    let h = h.clamp(0.0, 1.0);
    let central_angle = 2.0 * h.sqrt().atan2((1.0 - h).sqrt());

    EARTH_RADIUS_KM * central_angle * METERS_PER_KILOMETER
}

/// A circular boundary around a reference point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Geofence {
    /// Reference point.
    pub center: GeoPoint,
    /// Radius in meters. A point exactly on the boundary is inside.
    pub radius_meters: f64,
}

impl Geofence {
    /// Create a geofence.
    #[must_use]
    pub const fn new(center: GeoPoint, radius_meters: f64) -> Self {
        Self {
            center,
            radius_meters,
        }
    }

    /// Distance from the center to `point`, in meters.
    #[must_use]
    pub fn distance_to(&self, point: GeoPoint) -> f64 {
        distance_meters(self.center, point)
    }

    /// Whether `point` lies within the boundary.
    #[must_use]
    pub fn contains(&self, point: GeoPoint) -> bool {
        self.admits(self.distance_to(point))
    }

    /// Whether a distance already measured from the center is within the
    /// boundary.
    ///
    /// Written as `distance <= radius` so a NaN on either side is outside.
    #[must_use]
    pub fn admits(&self, distance_meters: f64) -> bool {
        distance_meters <= self.radius_meters
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn point(lat: f64, lon: f64) -> GeoPoint {
        GeoPoint::new(lat, lon).unwrap()
    }

    #[test]
    fn test_new_accepts_bounds() {
        assert!(GeoPoint::new(90.0, 180.0).is_ok());
        assert!(GeoPoint::new(-90.0, -180.0).is_ok());
    }

    #[test]
    fn test_new_rejects_out_of_range() {
        assert_eq!(
            GeoPoint::new(90.0001, 0.0),
            Err(GeoError::InvalidLatitude(90.0001))
        );
        assert_eq!(
            GeoPoint::new(0.0, -180.5),
            Err(GeoError::InvalidLongitude(-180.5))
        );
        assert!(matches!(
            GeoPoint::new(f64::NAN, 0.0),
            Err(GeoError::InvalidLatitude(_))
        ));
        assert!(matches!(
            GeoPoint::new(0.0, f64::INFINITY),
            Err(GeoError::InvalidLongitude(_))
        ));
    }

    #[test]
    fn test_distance_to_self_is_zero() {
        for p in [
            point(0.0, 0.0),
            point(37.7749, -122.4194),
            point(-89.9, 179.9),
            point(90.0, 0.0),
        ] {
            assert_eq!(distance_meters(p, p), 0.0);
        }
    }

    #[test]
    fn test_distance_is_symmetric() {
        let pairs = [
            (point(37.7749, -122.4194), point(40.7128, -74.0060)),
            (point(-33.8688, 151.2093), point(51.5074, -0.1278)),
            (point(0.0, 179.5), point(0.0, -179.5)),
        ];
        for (a, b) in pairs {
            let ab = distance_meters(a, b);
            let ba = distance_meters(b, a);
            assert!((ab - ba).abs() <= ab * 1e-6, "{ab} != {ba}");
        }
    }

    #[test]
    fn test_one_degree_of_longitude_at_equator() {
        let d = distance_meters(point(0.0, 0.0), point(0.0, 1.0));
        assert!((d - 111_195.0).abs() <= 50.0, "got {d}");
    }

    #[test]
    fn test_antipodal_points_are_finite() {
        let d = distance_meters(point(0.0, 0.0), point(0.0, 180.0));
        assert!(d.is_finite());
        assert!((d - 20_015_086.0).abs() <= 1000.0, "got {d}");
    }

    #[test]
    fn test_near_identical_points() {
        let d = distance_meters(point(37.7749, -122.4194), point(37.774_900_1, -122.4194));
        assert!(d.is_finite());
        assert!(d > 0.0 && d < 0.1, "got {d}");
    }

    #[test]
    fn test_geofence_boundary_is_inside() {
        let center = point(0.0, 0.0);
        let edge = point(0.0, 1.0);
        let radius = distance_meters(center, edge);

        assert!(Geofence::new(center, radius).contains(edge));
        assert!(!Geofence::new(center, radius - 0.001).contains(edge));
    }

    #[test]
    fn test_geofence_admits_measured_distance() {
        let fence = Geofence::new(point(0.0, 0.0), 100.0);
        assert!(fence.admits(0.0));
        assert!(fence.admits(100.0));
        assert!(!fence.admits(100.000_1));
        assert!(!fence.admits(f64::NAN));
        assert!(!fence.admits(f64::INFINITY));
    }

    #[test]
    fn test_geofence_nan_radius_contains_nothing() {
        let center = point(10.0, 10.0);
        assert!(!Geofence::new(center, f64::NAN).contains(center));
    }

    #[test]
    fn test_deserialize_validates() {
        let ok: GeoPoint = serde_json::from_str(r#"{"latitude": 1.5, "longitude": 2.5}"#).unwrap();
        assert_eq!(ok, point(1.5, 2.5));

        let err = serde_json::from_str::<GeoPoint>(r#"{"latitude": 91.0, "longitude": 0.0}"#);
        assert!(err.unwrap_err().to_string().contains("Invalid latitude"));
    }

    #[test]
    fn test_display() {
        assert_eq!(
            point(37.7749, -122.4194).to_string(),
            "(37.774900, -122.419400)"
        );
    }
}
