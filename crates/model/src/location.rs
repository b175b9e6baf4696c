use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use utility::{
    geo::{GeoError, GeoPoint},
    id::HasId,
};

use crate::ExampleData;

/// A recorded point. Locations are never moved; an entity that moves is
/// re-pointed to another location instead.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(rename_all = "camelCase")]
pub struct Location {
    pub latitude: f64,
    pub longitude: f64,
}

impl Location {
    pub fn new(point: GeoPoint) -> Self {
        Self {
            latitude: point.latitude,
            longitude: point.longitude,
        }
    }

    /// The location as a validated point. Fails for corrupt stored coordinates.
    pub fn point(&self) -> Result<GeoPoint, GeoError> {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

impl HasId for Location {
    type IdType = i32;
}

impl From<GeoPoint> for Location {
    fn from(value: GeoPoint) -> Self {
        Self::new(value)
    }
}

impl ExampleData for Location {
    fn example_data() -> Self {
        Location {
            latitude: 54.3003,
            longitude: 10.2236,
        }
    }
}
