use std::{collections::HashMap, fmt::Debug};

use model::{
    location::Location, path::Waypoint, stop::BusStop, vehicle::Vehicle,
    WithDistance, WithId,
};
use serde::Serialize;
use utility::{
    geo::GeoPoint,
    id::{HasId, Id},
    let_also::LetAlso,
};

use crate::{
    database::{BusStopRepo, Database, DatabaseTransaction, Repo, VehicleRepo},
    nearest::{LinearScan, NearestNeighbors},
    path_index::PathIndex,
    Entity, Named, RequestError, RequestResult, DEFAULT_NEAREST_STOPS,
};

/// Fetches a record, reporting a missing one as `NotFound` of its entity.
pub(crate) async fn fetch<T, R>(repo: &mut R, id: Id<T>) -> RequestResult<T>
where
    T: Named + Serialize + HasId + Send + 'static,
    T::IdType: Debug + Clone + Serialize + Send,
    R: Repo<T> + Send,
{
    repo.get(id)
        .await
        .map_err(|why| RequestError::from_database(why, T::ENTITY))
}

fn with_point<T>(location: Location, item: T) -> Option<(GeoPoint, T)> {
    match location.point() {
        Ok(point) => Some((point, item)),
        Err(why) => {
            log::warn!("ignoring stored location: {}", why);
            None
        }
    }
}

/// The query facade. Every query reads the store afresh, nothing is cached.
#[derive(Debug, Clone)]
pub struct Client<D>
where
    D: Database + Send + Sync + Sized + 'static,
{
    id: String,
    pub database: D,
    nearest_stops: usize,
}

impl<D> Client<D>
where
    D: Database,
{
    pub(crate) fn new<S>(id: S, database: D) -> Self
    where
        S: Into<String>,
    {
        Self {
            id: id.into(),
            database,
            nearest_stops: DEFAULT_NEAREST_STOPS,
        }
    }

    pub fn with_nearest_stops(mut self, k: usize) -> Self {
        self.nearest_stops = k;
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    async fn path_index<R>(&self, repo: &mut R) -> RequestResult<PathIndex>
    where
        R: Repo<Waypoint> + Send,
    {
        Ok(PathIndex::from_rows(repo.get_all().await?))
    }
}

// stops

impl<D> Client<D>
where
    D: Database,
{
    pub async fn get_stop(&self, id: Id<BusStop>) -> RequestResult<WithId<BusStop>> {
        fetch(&mut self.database.auto(), id)
            .await
            .map(|stop| WithId::new(id, stop))
    }

    /// The configured number of stops closest to `origin`, nearest first.
    pub async fn nearest_stops(
        &self,
        origin: GeoPoint,
    ) -> RequestResult<Vec<WithDistance<WithId<BusStop>>>> {
        self.nearest_stops_k(origin, self.nearest_stops).await
    }

    pub async fn nearest_stops_k(
        &self,
        origin: GeoPoint,
        k: usize,
    ) -> RequestResult<Vec<WithDistance<WithId<BusStop>>>> {
        origin.validate()?;
        let mut db = self.database.auto();
        let locations = Repo::<Location>::get_all(&mut db)
            .await?
            .into_iter()
            .map(|location| (location.id, location.content))
            .collect::<HashMap<_, _>>();
        let index = Repo::<BusStop>::get_all(&mut db)
            .await?
            .into_iter()
            .filter_map(|stop| match locations.get(&stop.content.location) {
                Some(location) => with_point(*location, stop),
                None => {
                    log::warn!(
                        "stop {} references missing location {}",
                        stop.id,
                        stop.content.location
                    );
                    None
                }
            })
            .collect::<LinearScan<_>>();
        index
            .nearest(origin, k)
            .into_iter()
            .map(|entry| entry.map(|stop| stop.clone()))
            .collect::<Vec<_>>()
            .let_owned(Ok)
    }
}

// vehicles

impl<D> Client<D>
where
    D: Database,
{
    pub async fn get_bus(&self, id: Id<Vehicle>) -> RequestResult<WithId<Vehicle>> {
        fetch(&mut self.database.auto(), id)
            .await
            .map(|vehicle| WithId::new(id, vehicle))
    }

    /// The vehicles serving a stop, in the order they were associated with it.
    pub async fn buses_at(&self, stop: Id<BusStop>) -> RequestResult<Vec<WithId<Vehicle>>> {
        let mut db = self.database.auto();
        if !Repo::<BusStop>::exists(&mut db, stop).await? {
            return Err(RequestError::NotFound(Entity::BusStop));
        }
        Ok(db.buses_at(stop).await?)
    }

    /// Snaps a vehicle onto the recorded location closest to the reported
    /// position. The reported position itself is not stored.
    ///
    /// Search and update happen in one transaction, so readers either see the
    /// old or the new location of the vehicle.
    pub async fn update_vehicle_location(
        &self,
        id: Id<Vehicle>,
        reported: GeoPoint,
    ) -> RequestResult<WithDistance<WithId<Location>>> {
        reported.validate()?;
        let mut tx = self.database.transaction().await?;
        if !Repo::<Vehicle>::exists(&mut tx, id).await? {
            return Err(RequestError::NotFound(Entity::Vehicle));
        }
        let index = Repo::<Location>::get_all(&mut tx)
            .await?
            .into_iter()
            .filter_map(|location| with_point(location.content, location))
            .collect::<LinearScan<_>>();
        let nearest = index
            .nearest(reported, 1)
            .into_iter()
            .next()
            .map(|entry| entry.map(|location| location.clone()))
            .ok_or(RequestError::NotFound(Entity::Location))?;
        tx.set_vehicle_location(id, Some(nearest.content.id))
            .await
            .map_err(|why| RequestError::from_database(why, Entity::Vehicle))?;
        tx.commit().await?;
        log::debug!(
            "[{}] vehicle {} snapped to location {} ({:.1} m away)",
            self.id,
            id,
            nearest.content.id,
            nearest.distance_meters
        );
        Ok(nearest)
    }
}

// distances

impl<D> Client<D>
where
    D: Database,
{
    /// Signed distance along the bus's route from the bus to the stop. Positive
    /// if the stop lies ahead of the bus, negative once the bus has passed it.
    pub async fn bus_to_stop_distance(
        &self,
        bus_id: Id<Vehicle>,
        stop_id: Id<BusStop>,
    ) -> RequestResult<i32> {
        let mut db = self.database.auto();
        let bus: Vehicle = fetch(&mut db, bus_id).await?;
        let stop: BusStop = fetch(&mut db, stop_id).await?;
        let bus_location = bus.location.ok_or(RequestError::NotFound(Entity::Location))?;
        let index = self.path_index(&mut db).await?;

        let bus_distance = index.distance_along_route(bus.path_id, bus_location)?;
        let stop_distance = match index.distance_along_route(bus.path_id, stop.location) {
            Err(RequestError::NotFound(_)) => {
                let stop_paths = index.paths_through(stop.location);
                return if stop_paths.is_empty() {
                    Err(RequestError::NotFound(Entity::Path))
                } else {
                    Err(RequestError::RouteMismatch {
                        bus_path: bus.path_id,
                        stop_paths,
                    })
                };
            }
            result => result?,
        };

        stop_distance.checked_sub(bus_distance).ok_or_else(|| {
            RequestError::InvalidData(format!(
                "distance {} - {} overflows",
                stop_distance, bus_distance
            ))
        })
    }
}
