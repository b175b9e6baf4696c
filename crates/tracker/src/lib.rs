use std::{error::Error, fmt};

use model::{
    location::Location,
    path::{PathId, Waypoint, WaypointOrderError},
    stop::BusStop,
    vehicle::Vehicle,
};
use utility::geo::{GeoError, GeoPoint};

pub mod client;
pub mod database;
pub mod nearest;
pub mod path_index;
pub mod seed;
pub mod server;

/// Message returned whenever a required query parameter is absent.
pub const PARAMS_REQUIRED: &str = "params are required";

/// Number of stops returned by a nearest stop query unless configured otherwise.
pub const DEFAULT_NEAREST_STOPS: usize = 4;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Entity {
    Location,
    Path,
    Vehicle,
    BusStop,
}

impl fmt::Display for Entity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Entity::Location => "Location",
            Entity::Path => "Path",
            Entity::Vehicle => "Vehicle",
            Entity::BusStop => "BusStop",
        };
        f.write_str(name)
    }
}

/// Ties a model type to the entity reported in `RequestError::NotFound`.
pub trait Named {
    const ENTITY: Entity;
}

impl Named for Location {
    const ENTITY: Entity = Entity::Location;
}

impl Named for Waypoint {
    const ENTITY: Entity = Entity::Path;
}

impl Named for Vehicle {
    const ENTITY: Entity = Entity::Vehicle;
}

impl Named for BusStop {
    const ENTITY: Entity = Entity::BusStop;
}

#[derive(Debug)]
pub enum RequestError {
    /// Missing or malformed parameters supplied by the caller.
    InvalidInput(String),
    /// A referenced record does not exist.
    NotFound(Entity),
    /// The stop is not a waypoint of the bus's route.
    RouteMismatch {
        bus_path: PathId,
        stop_paths: Vec<PathId>,
    },
    /// Stored data violates an invariant.
    InvalidData(String),
    Other(Box<dyn Error + Send + Sync>),
}

impl RequestError {
    pub fn invalid_input<S: Into<String>>(message: S) -> Self {
        Self::InvalidInput(message.into())
    }

    pub fn params_required() -> Self {
        Self::InvalidInput(PARAMS_REQUIRED.to_owned())
    }

    pub fn other<T: Error + Send + Sync + 'static>(why: T) -> Self {
        Self::Other(Box::new(why))
    }

    /// Attaches an entity to a bare not found error from the database.
    pub fn from_database(why: database::DatabaseError, entity: Entity) -> Self {
        match why {
            database::DatabaseError::NotFound => Self::NotFound(entity),
            why => why.into(),
        }
    }
}

impl fmt::Display for RequestError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RequestError::InvalidInput(message) => f.write_str(message),
            RequestError::NotFound(entity) => {
                write!(f, "{} object does not exist.", entity)
            }
            RequestError::RouteMismatch {
                bus_path,
                stop_paths,
            } => write!(
                f,
                "the stop is not on path {} of the bus (stop paths: {:?})",
                bus_path, stop_paths
            ),
            RequestError::InvalidData(message) => {
                write!(f, "invalid stored data: {}", message)
            }
            RequestError::Other(why) => write!(f, "{}", why),
        }
    }
}

impl Error for RequestError {}

impl From<database::DatabaseError> for RequestError {
    fn from(value: database::DatabaseError) -> Self {
        match value {
            database::DatabaseError::NotFound => {
                Self::InvalidData("a referenced record is missing".to_owned())
            }
            database::DatabaseError::InvalidData(message) => Self::InvalidData(message),
            database::DatabaseError::Other(why) => Self::Other(why),
        }
    }
}

impl From<GeoError> for RequestError {
    fn from(value: GeoError) -> Self {
        Self::InvalidInput(value.to_string())
    }
}

impl From<WaypointOrderError> for RequestError {
    fn from(value: WaypointOrderError) -> Self {
        Self::InvalidData(value.to_string())
    }
}

pub type RequestResult<O> = Result<O, RequestError>;

/// Parses a single numeric query parameter. Absent parameters are reported as
/// `params are required`.
pub fn parse_param<T>(name: &str, value: Option<&str>) -> RequestResult<T>
where
    T: std::str::FromStr,
{
    let value = value
        .map(str::trim)
        .filter(|value| !value.is_empty())
        .ok_or_else(RequestError::params_required)?;
    value.parse().map_err(|_| {
        RequestError::invalid_input(format!("{} is not a number: {:?}", name, value))
    })
}

/// Parses a latitude / longitude pair into a validated point.
pub fn parse_coordinates(
    latitude: Option<&str>,
    longitude: Option<&str>,
) -> RequestResult<GeoPoint> {
    if latitude.is_none() || longitude.is_none() {
        return Err(RequestError::params_required());
    }
    let latitude = parse_param("latitude", latitude)?;
    let longitude = parse_param("longitude", longitude)?;
    Ok(GeoPoint::new(latitude, longitude)?)
}
