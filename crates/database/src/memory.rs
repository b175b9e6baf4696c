//! A database kept entirely in memory. Used for development setups without
//! Postgres and in tests.
//!
//! Transactions hold the write lock of the store from `transaction()` until
//! they are committed or dropped and work on a private copy, so readers never
//! see partial updates.

use std::{collections::BTreeMap, fmt::Debug, iter, sync::Arc};

use async_trait::async_trait;
use indexmap::IndexSet;
use model::{
    location::Location,
    path::{PathId, Waypoint},
    stop::BusStop,
    vehicle::Vehicle,
    WithId,
};
use serde::Serialize;
use tokio::sync::{OwnedRwLockWriteGuard, RwLock};
use tracker::database::{
    BusStopRepo, Database, DatabaseAutocommit, DatabaseError, DatabaseTransaction,
    LocationRepo, Repo, Result, VehicleRepo, WaypointRepo,
};
use utility::{
    id::{HasId, Id},
    let_also::LetAlso,
};

use crate::sorted_path;

/// Rows of one table plus its id sequence. Like a serial column, the sequence
/// never hands out an id twice, even after the row holding it was deleted.
#[derive(Debug, Clone)]
pub struct Rows<T> {
    rows: BTreeMap<i32, T>,
    last_id: i32,
}

impl<T> Default for Rows<T> {
    fn default() -> Self {
        Self {
            rows: BTreeMap::new(),
            last_id: 0,
        }
    }
}

impl<T> Rows<T> {
    fn next_id(&mut self) -> i32 {
        self.last_id += 1;
        self.last_id
    }

    /// Stores a row under an explicit id, keeping the sequence ahead of it.
    fn put(&mut self, id: i32, row: T) {
        self.last_id = self.last_id.max(id);
        self.rows.insert(id, row);
    }
}

#[derive(Debug, Clone, Default)]
pub struct Store {
    locations: Rows<Location>,
    waypoints: Rows<Waypoint>,
    vehicles: Rows<Vehicle>,
    stops: Rows<BusStop>,
    /// stop => vehicles, in association order
    stop_buses: BTreeMap<i32, IndexSet<i32>>,
}

pub trait Table<T> {
    fn table(&self) -> &Rows<T>;
    fn table_mut(&mut self) -> &mut Rows<T>;

    /// Rejects a row that would be stored under `id` if it references missing
    /// records or is otherwise inconsistent with the stored data.
    fn check_row(&self, _id: i32, _row: &T) -> Result<()> {
        Ok(())
    }
}

fn dangling<T: Debug>(what: &str, id: T) -> DatabaseError {
    DatabaseError::InvalidData(format!("{} {:?} does not exist", what, id))
}

impl Table<Location> for Store {
    fn table(&self) -> &Rows<Location> {
        &self.locations
    }

    fn table_mut(&mut self) -> &mut Rows<Location> {
        &mut self.locations
    }
}

impl Table<Waypoint> for Store {
    fn table(&self) -> &Rows<Waypoint> {
        &self.waypoints
    }

    fn table_mut(&mut self) -> &mut Rows<Waypoint> {
        &mut self.waypoints
    }

    /// The path the row ends up on has to stay in order.
    fn check_row(&self, id: i32, row: &Waypoint) -> Result<()> {
        self.check_location(row.location)?;
        let path = self
            .waypoints
            .rows
            .iter()
            .filter(|(other, waypoint)| **other != id && waypoint.path_id == row.path_id)
            .map(|(_, waypoint)| waypoint.clone())
            .chain(iter::once(row.clone()))
            .collect();
        sorted_path(row.path_id, path).map(|_| ())
    }
}

impl Table<Vehicle> for Store {
    fn table(&self) -> &Rows<Vehicle> {
        &self.vehicles
    }

    fn table_mut(&mut self) -> &mut Rows<Vehicle> {
        &mut self.vehicles
    }

    fn check_row(&self, _id: i32, row: &Vehicle) -> Result<()> {
        self.check_location(row.location)
    }
}

impl Table<BusStop> for Store {
    fn table(&self) -> &Rows<BusStop> {
        &self.stops
    }

    fn table_mut(&mut self) -> &mut Rows<BusStop> {
        &mut self.stops
    }

    fn check_row(&self, _id: i32, row: &BusStop) -> Result<()> {
        self.check_location(Some(row.location))
    }
}

impl Store {
    fn check_location(&self, location: Option<Id<Location>>) -> Result<()> {
        match location {
            Some(id) if !self.locations.rows.contains_key(&id.raw()) => {
                Err(dangling("location", id.raw()))
            }
            _ => Ok(()),
        }
    }

    fn get<T>(&self, id: Id<T>) -> Result<T>
    where
        T: HasId<IdType = i32> + Clone,
        Self: Table<T>,
    {
        Table::<T>::table(self)
            .rows
            .get(&id.raw())
            .cloned()
            .ok_or(DatabaseError::NotFound)
    }

    fn get_all<T>(&self) -> Vec<WithId<T>>
    where
        T: HasId<IdType = i32> + Clone,
        Self: Table<T>,
    {
        Table::<T>::table(self)
            .rows
            .iter()
            .map(|(id, row)| WithId::new(Id::new(*id), row.clone()))
            .collect()
    }

    fn insert<T>(&mut self, row: T) -> Result<WithId<T>>
    where
        T: HasId<IdType = i32> + Clone,
        Self: Table<T>,
    {
        // a rejected row does not use up an id
        let id = Table::<T>::table(self).last_id + 1;
        Table::<T>::check_row(self, id, &row)?;
        let id = Table::<T>::table_mut(self).next_id();
        Table::<T>::table_mut(self).rows.insert(id, row.clone());
        Ok(WithId::new(Id::new(id), row))
    }

    fn put<T>(&mut self, element: WithId<T>) -> Result<WithId<T>>
    where
        T: HasId<IdType = i32> + Clone,
        Self: Table<T>,
    {
        Table::<T>::check_row(self, element.id.raw(), &element.content)?;
        Table::<T>::table_mut(self).put(element.id.raw(), element.content.clone());
        Ok(element)
    }

    fn exists<T>(&self, id: Id<T>) -> bool
    where
        T: HasId<IdType = i32>,
        Self: Table<T>,
    {
        Table::<T>::table(self).rows.contains_key(&id.raw())
    }

    fn delete_location(&mut self, id: Id<Location>) -> Result<()> {
        let id = id.raw();
        self.locations
            .rows
            .remove(&id)
            .ok_or(DatabaseError::NotFound)?;
        // stops own their location
        let removed_stops = self
            .stops
            .rows
            .iter()
            .filter(|(_, stop)| stop.location.raw() == id)
            .map(|(stop_id, _)| *stop_id)
            .collect::<Vec<_>>();
        for stop_id in removed_stops {
            self.stops.rows.remove(&stop_id);
            self.stop_buses.remove(&stop_id);
        }
        // vehicles and waypoints merely reference it
        for vehicle in self.vehicles.rows.values_mut() {
            if vehicle.location.map(|location| location.raw()) == Some(id) {
                vehicle.location = None;
            }
        }
        for waypoint in self.waypoints.rows.values_mut() {
            if waypoint.location.map(|location| location.raw()) == Some(id) {
                waypoint.location = None;
            }
        }
        Ok(())
    }

    fn replace_path(
        &mut self,
        path_id: PathId,
        waypoints: Vec<Waypoint>,
    ) -> Result<Vec<WithId<Waypoint>>> {
        let waypoints = sorted_path(path_id, waypoints)?;
        for waypoint in waypoints.iter() {
            self.check_location(waypoint.location)?;
        }
        self.waypoints
            .rows
            .retain(|_, waypoint| waypoint.path_id != path_id);
        waypoints
            .into_iter()
            .map(|waypoint| {
                let id = self.waypoints.next_id();
                self.waypoints.rows.insert(id, waypoint.clone());
                WithId::new(Id::new(id), waypoint)
            })
            .collect::<Vec<_>>()
            .let_owned(Ok)
    }

    fn set_vehicle_location(
        &mut self,
        id: Id<Vehicle>,
        location: Option<Id<Location>>,
    ) -> Result<()> {
        self.check_location(location)?;
        let vehicle = self
            .vehicles
            .rows
            .get_mut(&id.raw())
            .ok_or(DatabaseError::NotFound)?;
        vehicle.location = location;
        Ok(())
    }

    fn buses_at(&self, stop: Id<BusStop>) -> Vec<WithId<Vehicle>> {
        self.stop_buses
            .get(&stop.raw())
            .into_iter()
            .flatten()
            .filter_map(|vehicle_id| {
                self.vehicles
                    .rows
                    .get(vehicle_id)
                    .map(|vehicle| WithId::new(Id::new(*vehicle_id), vehicle.clone()))
            })
            .collect()
    }

    fn add_bus(&mut self, stop: Id<BusStop>, vehicle: Id<Vehicle>) -> Result<()> {
        if !self.stops.rows.contains_key(&stop.raw()) {
            return Err(dangling("stop", stop.raw()));
        }
        if !self.vehicles.rows.contains_key(&vehicle.raw()) {
            return Err(dangling("vehicle", vehicle.raw()));
        }
        self.stop_buses
            .entry(stop.raw())
            .or_default()
            .insert(vehicle.raw());
        Ok(())
    }
}

#[derive(Debug, Clone, Default)]
pub struct MemoryDatabase {
    store: Arc<RwLock<Store>>,
}

impl MemoryDatabase {
    pub fn new() -> Self {
        Self::default()
    }
}

pub struct MemoryAutocommit {
    store: Arc<RwLock<Store>>,
}

impl DatabaseAutocommit for MemoryAutocommit {}

pub struct MemoryTransaction {
    guard: OwnedRwLockWriteGuard<Store>,
    staged: Store,
}

#[async_trait]
impl DatabaseTransaction for MemoryTransaction {
    async fn commit(self) -> Result<()> {
        let MemoryTransaction { mut guard, staged } = self;
        *guard = staged;
        Ok(())
    }
}

#[async_trait]
impl Database for MemoryDatabase {
    type Transaction = MemoryTransaction;
    type Autocommit = MemoryAutocommit;

    async fn transaction(&self) -> Result<Self::Transaction> {
        let guard = self.store.clone().write_owned().await;
        let staged = Store::clone(&guard);
        Ok(MemoryTransaction { guard, staged })
    }

    fn auto(&self) -> Self::Autocommit {
        MemoryAutocommit {
            store: self.store.clone(),
        }
    }
}

// Repo

#[async_trait]
impl<T> Repo<T> for MemoryAutocommit
where
    T: Serialize + HasId<IdType = i32> + Clone + Send + Sync + 'static,
    Store: Table<T>,
{
    async fn get(&mut self, id: Id<T>) -> Result<T> {
        self.store.read().await.get(id)
    }

    async fn get_all(&mut self) -> Result<Vec<WithId<T>>> {
        Ok(self.store.read().await.get_all())
    }

    async fn insert(&mut self, element: T) -> Result<WithId<T>> {
        self.store.write().await.insert(element)
    }

    async fn put(&mut self, element: WithId<T>) -> Result<WithId<T>> {
        self.store.write().await.put(element)
    }

    async fn exists(&mut self, id: Id<T>) -> Result<bool> {
        Ok(self.store.read().await.exists(id))
    }
}

#[async_trait]
impl<T> Repo<T> for MemoryTransaction
where
    T: Serialize + HasId<IdType = i32> + Clone + Send + Sync + 'static,
    Store: Table<T>,
{
    async fn get(&mut self, id: Id<T>) -> Result<T> {
        self.staged.get(id)
    }

    async fn get_all(&mut self) -> Result<Vec<WithId<T>>> {
        Ok(self.staged.get_all())
    }

    async fn insert(&mut self, element: T) -> Result<WithId<T>> {
        self.staged.insert(element)
    }

    async fn put(&mut self, element: WithId<T>) -> Result<WithId<T>> {
        self.staged.put(element)
    }

    async fn exists(&mut self, id: Id<T>) -> Result<bool> {
        Ok(self.staged.exists(id))
    }
}

#[async_trait]
impl LocationRepo for MemoryAutocommit {
    async fn delete_location(&mut self, id: Id<Location>) -> Result<()> {
        self.store.write().await.delete_location(id)
    }
}

#[async_trait]
impl LocationRepo for MemoryTransaction {
    async fn delete_location(&mut self, id: Id<Location>) -> Result<()> {
        self.staged.delete_location(id)
    }
}

#[async_trait]
impl WaypointRepo for MemoryAutocommit {
    async fn replace_path(
        &mut self,
        path_id: PathId,
        waypoints: Vec<Waypoint>,
    ) -> Result<Vec<WithId<Waypoint>>> {
        let mut store = self.store.write().await;
        // work on a copy so a rejected path leaves the store untouched
        let mut staged = store.clone();
        let result = staged.replace_path(path_id, waypoints)?;
        *store = staged;
        Ok(result)
    }
}

#[async_trait]
impl WaypointRepo for MemoryTransaction {
    async fn replace_path(
        &mut self,
        path_id: PathId,
        waypoints: Vec<Waypoint>,
    ) -> Result<Vec<WithId<Waypoint>>> {
        self.staged.replace_path(path_id, waypoints)
    }
}

#[async_trait]
impl VehicleRepo for MemoryAutocommit {
    async fn set_vehicle_location(
        &mut self,
        id: Id<Vehicle>,
        location: Option<Id<Location>>,
    ) -> Result<()> {
        self.store.write().await.set_vehicle_location(id, location)
    }
}

#[async_trait]
impl VehicleRepo for MemoryTransaction {
    async fn set_vehicle_location(
        &mut self,
        id: Id<Vehicle>,
        location: Option<Id<Location>>,
    ) -> Result<()> {
        self.staged.set_vehicle_location(id, location)
    }
}

#[async_trait]
impl BusStopRepo for MemoryAutocommit {
    async fn buses_at(&mut self, stop: Id<BusStop>) -> Result<Vec<WithId<Vehicle>>> {
        Ok(self.store.read().await.buses_at(stop))
    }

    async fn add_bus(&mut self, stop: Id<BusStop>, vehicle: Id<Vehicle>) -> Result<()> {
        self.store.write().await.add_bus(stop, vehicle)
    }
}

#[async_trait]
impl BusStopRepo for MemoryTransaction {
    async fn buses_at(&mut self, stop: Id<BusStop>) -> Result<Vec<WithId<Vehicle>>> {
        Ok(self.staged.buses_at(stop))
    }

    async fn add_bus(&mut self, stop: Id<BusStop>, vehicle: Id<Vehicle>) -> Result<()> {
        self.staged.add_bus(stop, vehicle)
    }
}
