use std::{error::Error, fmt};

use geo::{Distance, Geodesic, Point};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

pub const MAX_LATITUDE: f64 = 90.0;
pub const MAX_LONGITUDE: f64 = 180.0;

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GeoError {
    InvalidCoordinate { latitude: f64, longitude: f64 },
}

impl fmt::Display for GeoError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GeoError::InvalidCoordinate {
                latitude,
                longitude,
            } => write!(
                f,
                "invalid coordinate (latitude: {}, longitude: {})",
                latitude, longitude
            ),
        }
    }
}

impl Error for GeoError {}

/// A position on the earth's surface in degrees (WGS84).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Creates a point, rejecting NaN, infinite and out of range values.
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, GeoError> {
        let point = Self {
            latitude,
            longitude,
        };
        point.validate()?;
        Ok(point)
    }

    pub fn validate(&self) -> Result<(), GeoError> {
        let latitude_ok =
            self.latitude.is_finite() && self.latitude.abs() <= MAX_LATITUDE;
        let longitude_ok =
            self.longitude.is_finite() && self.longitude.abs() <= MAX_LONGITUDE;
        if latitude_ok && longitude_ok {
            Ok(())
        } else {
            Err(GeoError::InvalidCoordinate {
                latitude: self.latitude,
                longitude: self.longitude,
            })
        }
    }
}

impl From<GeoPoint> for Point<f64> {
    fn from(value: GeoPoint) -> Self {
        // geo uses (x, y) = (longitude, latitude)
        Point::new(value.longitude, value.latitude)
    }
}

/// Surface distance in meters between two points on the WGS84 ellipsoid.
pub fn geodesic_meters(a: GeoPoint, b: GeoPoint) -> Result<f64, GeoError> {
    a.validate()?;
    b.validate()?;
    Ok(Geodesic.distance(Point::from(a), Point::from(b)))
}

#[cfg(test)]
mod tests {
    use approx::assert_relative_eq;
    use proptest::prelude::*;

    use super::*;

    const BERLIN: GeoPoint = GeoPoint {
        latitude: 52.5200,
        longitude: 13.4050,
    };
    const PARIS: GeoPoint = GeoPoint {
        latitude: 48.8566,
        longitude: 2.3522,
    };

    #[test]
    fn berlin_to_paris() {
        let distance = geodesic_meters(BERLIN, PARIS).unwrap();
        // the spherical approximation gives ~877.5 km
        assert_relative_eq!(distance, 879_699.3, epsilon = 1.0);
    }

    #[test]
    fn one_degree_of_longitude_at_equator() {
        let a = GeoPoint::new(0.0, 0.0).unwrap();
        let b = GeoPoint::new(0.0, 1.0).unwrap();
        // equatorial radius 6378137 m => 111319.49 m per degree
        assert_relative_eq!(
            geodesic_meters(a, b).unwrap(),
            111_319.49,
            epsilon = 0.1
        );
    }

    #[test]
    fn same_point_is_zero() {
        assert!(geodesic_meters(BERLIN, BERLIN).unwrap().abs() < 1e-9);
    }

    #[test]
    fn rejects_invalid_coordinates() {
        assert!(GeoPoint::new(f64::NAN, 0.0).is_err());
        assert!(GeoPoint::new(0.0, f64::INFINITY).is_err());
        assert!(GeoPoint::new(90.5, 0.0).is_err());
        assert!(GeoPoint::new(0.0, -180.1).is_err());

        let broken = GeoPoint {
            latitude: f64::NAN,
            longitude: 0.0,
        };
        assert!(matches!(
            geodesic_meters(broken, BERLIN),
            Err(GeoError::InvalidCoordinate { .. })
        ));
    }

    fn point() -> impl Strategy<Value = GeoPoint> {
        (-89.0..89.0f64, -179.0..179.0f64).prop_map(|(latitude, longitude)| {
            GeoPoint {
                latitude,
                longitude,
            }
        })
    }

    proptest! {
        #[test]
        fn symmetric(a in point(), b in point()) {
            let ab = geodesic_meters(a, b).unwrap();
            let ba = geodesic_meters(b, a).unwrap();
            prop_assert!((ab - ba).abs() < 1e-3);
        }

        #[test]
        fn zero_to_itself(a in point()) {
            prop_assert!(geodesic_meters(a, a).unwrap().abs() < 1e-9);
        }
    }
}
