//! Route definitions loaded from a JSON document.
//!
//! ```json
//! {
//!   "locations": [{ "id": 1, "latitude": 54.30, "longitude": 10.22 }],
//!   "paths": [{ "pathId": 1, "waypoints": [{ "location": 1, "distance": 0 }] }],
//!   "vehicles": [{ "id": 1, "name": "31", "pathId": 1, "location": 1 }],
//!   "stops": [{ "id": 1, "name": "Bahnhof", "location": 1, "buses": [1] }]
//! }
//! ```
//!
//! Waypoint orders default to the position in the list, starting at 1.
//! Importing again replaces records with the same id and the waypoints of
//! every listed path.

use std::path::Path;

use model::{
    location::Location,
    path::{PathId, Waypoint},
    stop::{BusStop, STOP_NAME_MAX_LEN},
    vehicle::{Vehicle, VEHICLE_NAME_MAX_LEN},
    WithId,
};
use serde::Deserialize;
use utility::{geo::GeoPoint, id::Id};

use crate::{
    client::Client,
    database::{BusStopRepo, Database, DatabaseTransaction, Repo, WaypointRepo},
    RequestError, RequestResult,
};

#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedDocument {
    #[serde(default)]
    pub locations: Vec<SeedLocation>,
    #[serde(default)]
    pub paths: Vec<SeedPath>,
    #[serde(default)]
    pub vehicles: Vec<SeedVehicle>,
    #[serde(default)]
    pub stops: Vec<SeedStop>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedLocation {
    pub id: i32,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedPath {
    pub path_id: PathId,
    pub waypoints: Vec<SeedWaypoint>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedWaypoint {
    pub location: i32,
    pub order: Option<i32>,
    pub distance: i32,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedVehicle {
    pub id: i32,
    pub name: String,
    pub path_id: PathId,
    pub location: Option<i32>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedStop {
    pub id: i32,
    pub name: String,
    pub location: i32,
    #[serde(default)]
    pub buses: Vec<i32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SeedSummary {
    pub locations: usize,
    pub waypoints: usize,
    pub vehicles: usize,
    pub stops: usize,
}

impl SeedDocument {
    pub fn from_json(json: &str) -> RequestResult<Self> {
        serde_json::from_str(json)
            .map_err(|why| RequestError::InvalidData(format!("seed document: {}", why)))
    }

    pub async fn from_file<P: AsRef<Path>>(path: P) -> RequestResult<Self> {
        let json = tokio::fs::read_to_string(path).await.map_err(RequestError::other)?;
        Self::from_json(&json)
    }

    fn check(&self) -> RequestResult<()> {
        for location in &self.locations {
            GeoPoint::new(location.latitude, location.longitude).map_err(|why| {
                RequestError::InvalidData(format!("location {}: {}", location.id, why))
            })?;
        }
        for vehicle in &self.vehicles {
            if vehicle.name.chars().count() > VEHICLE_NAME_MAX_LEN {
                return Err(RequestError::InvalidData(format!(
                    "vehicle {}: name longer than {} characters",
                    vehicle.id, VEHICLE_NAME_MAX_LEN
                )));
            }
        }
        for stop in &self.stops {
            if stop.name.chars().count() > STOP_NAME_MAX_LEN {
                return Err(RequestError::InvalidData(format!(
                    "stop {}: name longer than {} characters",
                    stop.id, STOP_NAME_MAX_LEN
                )));
            }
        }
        Ok(())
    }
}

impl SeedPath {
    fn waypoints(&self) -> Vec<Waypoint> {
        self.waypoints
            .iter()
            .enumerate()
            .map(|(position, waypoint)| Waypoint {
                path_id: self.path_id,
                location: Some(Id::new(waypoint.location)),
                order: waypoint.order.unwrap_or(position as i32 + 1),
                distance: waypoint.distance,
            })
            .collect()
    }
}

impl<D> Client<D>
where
    D: Database,
{
    /// Imports a route definition document in a single transaction. Either
    /// everything is stored or nothing.
    pub async fn import(&self, document: SeedDocument) -> RequestResult<SeedSummary> {
        document.check()?;
        let mut summary = SeedSummary::default();
        let mut tx = self.database.transaction().await?;

        for location in document.locations {
            Repo::<Location>::put(
                &mut tx,
                WithId::new(
                    Id::new(location.id),
                    Location {
                        latitude: location.latitude,
                        longitude: location.longitude,
                    },
                ),
            )
            .await?;
            summary.locations += 1;
        }

        for path in document.paths.iter() {
            let stored = tx.replace_path(path.path_id, path.waypoints()).await?;
            summary.waypoints += stored.len();
        }

        for vehicle in document.vehicles {
            Repo::<Vehicle>::put(
                &mut tx,
                WithId::new(
                    Id::new(vehicle.id),
                    Vehicle {
                        name: vehicle.name,
                        path_id: vehicle.path_id,
                        location: vehicle.location.map(Id::new),
                    },
                ),
            )
            .await?;
            summary.vehicles += 1;
        }

        for stop in document.stops {
            let id = Id::new(stop.id);
            Repo::<BusStop>::put(
                &mut tx,
                WithId::new(
                    id,
                    BusStop {
                        name: stop.name,
                        location: Id::new(stop.location),
                    },
                ),
            )
            .await?;
            for bus in stop.buses {
                tx.add_bus(id, Id::new(bus)).await?;
            }
            summary.stops += 1;
        }

        tx.commit().await?;
        log::info!(
            "[{}] imported {} locations, {} waypoints, {} vehicles, {} stops",
            self.id(),
            summary.locations,
            summary.waypoints,
            summary.vehicles,
            summary.stops
        );
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_document_with_defaults() {
        let document = SeedDocument::from_json(
            r#"{
                "locations": [{ "id": 1, "latitude": 54.3, "longitude": 10.2 }],
                "paths": [{ "pathId": 4, "waypoints": [
                    { "location": 1, "distance": 0 },
                    { "location": 2, "distance": 120 }
                ]}]
            }"#,
        )
        .unwrap();
        assert!(document.vehicles.is_empty());
        let waypoints = document.paths[0].waypoints();
        assert_eq!(waypoints[1].order, 2);
        assert_eq!(waypoints[1].path_id, 4);
        assert_eq!(waypoints[1].location, Some(Id::new(2)));
    }

    #[test]
    fn rejects_malformed_json() {
        assert!(matches!(
            SeedDocument::from_json("{ \"locations\": 3 }"),
            Err(RequestError::InvalidData(_))
        ));
    }

    #[test]
    fn rejects_long_vehicle_name() {
        let document = SeedDocument {
            vehicles: vec![SeedVehicle {
                id: 1,
                name: "a very long bus name".to_owned(),
                path_id: 1,
                location: None,
            }],
            ..Default::default()
        };
        assert!(matches!(document.check(), Err(RequestError::InvalidData(_))));
    }

    #[test]
    fn rejects_invalid_coordinates() {
        let document = SeedDocument {
            locations: vec![SeedLocation {
                id: 1,
                latitude: 120.0,
                longitude: 0.0,
            }],
            ..Default::default()
        };
        assert!(matches!(document.check(), Err(RequestError::InvalidData(_))));
    }
}
