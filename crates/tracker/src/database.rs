use std::{error, fmt, fmt::Debug, result};

use async_trait::async_trait;
use model::{
    location::Location,
    path::{PathId, Waypoint},
    stop::BusStop,
    vehicle::Vehicle,
    WithId,
};
use serde::Serialize;
use utility::id::{HasId, Id};

#[derive(Debug)]
pub enum DatabaseError {
    NotFound,
    /// Stored or submitted data violates an invariant of the data model, e.g. a
    /// dangling reference or a value of the wrong type.
    InvalidData(String),
    Other(Box<dyn error::Error + Send + Sync>),
}

impl fmt::Display for DatabaseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DatabaseError::NotFound => f.write_str("record not found"),
            DatabaseError::InvalidData(message) => write!(f, "invalid data: {}", message),
            DatabaseError::Other(why) => write!(f, "{}", why),
        }
    }
}

impl error::Error for DatabaseError {}

pub type Result<T> = result::Result<T, DatabaseError>;

#[async_trait]
pub trait Repo<T: Serialize + HasId>
where
    <T as HasId>::IdType: Debug + Clone + Serialize,
{
    /// Fails with `DatabaseError::NotFound` if there is no such record.
    async fn get(&mut self, id: Id<T>) -> Result<T>;
    /// All records in ascending id order.
    async fn get_all(&mut self) -> Result<Vec<WithId<T>>>;
    async fn insert(&mut self, element: T) -> Result<WithId<T>>;
    /// Inserts the element under the given id or replaces an existing one.
    async fn put(&mut self, element: WithId<T>) -> Result<WithId<T>>;
    async fn exists(&mut self, id: Id<T>) -> Result<bool>;
}

#[async_trait]
pub trait LocationRepo: Repo<Location> {
    /// Deletes a location. Stops located there are deleted with it, vehicles
    /// and waypoints referencing it lose their reference.
    async fn delete_location(&mut self, id: Id<Location>) -> Result<()>;
}

#[async_trait]
pub trait WaypointRepo: Repo<Waypoint> {
    /// Replaces all waypoints of a path. Implementations reject waypoint lists
    /// that are not strictly ordered or whose distances decrease.
    async fn replace_path(
        &mut self,
        path_id: PathId,
        waypoints: Vec<Waypoint>,
    ) -> Result<Vec<WithId<Waypoint>>>;
}

#[async_trait]
pub trait VehicleRepo: Repo<Vehicle> {
    async fn set_vehicle_location(
        &mut self,
        id: Id<Vehicle>,
        location: Option<Id<Location>>,
    ) -> Result<()>;
}

#[async_trait]
pub trait BusStopRepo: Repo<BusStop> {
    /// The vehicles serving a stop, in the order they were associated.
    async fn buses_at(&mut self, stop: Id<BusStop>) -> Result<Vec<WithId<Vehicle>>>;

    /// Associates a vehicle with a stop. Associating twice has no effect.
    async fn add_bus(&mut self, stop: Id<BusStop>, vehicle: Id<Vehicle>) -> Result<()>;
}

pub trait DatabaseOperations:
    LocationRepo + WaypointRepo + VehicleRepo + BusStopRepo
{
}

impl<T> DatabaseOperations for T where
    T: LocationRepo + WaypointRepo + VehicleRepo + BusStopRepo
{
}

#[async_trait]
pub trait DatabaseTransaction: DatabaseOperations {
    async fn commit(self) -> Result<()>;
}

pub trait DatabaseAutocommit: DatabaseOperations {}

/// trait to implement a bus tracking database.
/// multiple concurrent accesses should be possible by e.g. cloning the database object.
///
/// A transaction must be isolated: readers never observe its changes before
/// `commit`, and dropping it without committing discards them.
#[async_trait]
pub trait Database: Clone + Send + Sync + Sized + 'static {
    type Transaction: DatabaseTransaction + Send;
    type Autocommit: DatabaseAutocommit + Send;

    async fn transaction(&self) -> Result<Self::Transaction>;

    fn auto(&self) -> Self::Autocommit;
}
