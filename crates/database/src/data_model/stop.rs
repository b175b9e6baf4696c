use async_trait::async_trait;
use model::{stop::BusStop, vehicle::Vehicle, WithId};
use sqlx::prelude::FromRow;
use tracker::database::{BusStopRepo, Result};
use utility::id::Id;

use super::{repo, DatabaseRow};
use crate::{
    queries::stop::{add_bus, buses_at},
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

/// Table: `bus_stops`
#[derive(Debug, Clone, FromRow)]
pub struct BusStopRow {
    pub id: i32,
    pub name: String,
    pub location_id: i32,
}

impl DatabaseRow for BusStopRow {
    type Model = BusStop;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        BusStop {
            name: self.name,
            location: Id::new(self.location_id),
        }
    }
}

repo!(BusStop, stop);

#[async_trait]
impl BusStopRepo for PgDatabaseAutocommit {
    async fn buses_at(&mut self, stop: Id<BusStop>) -> Result<Vec<WithId<Vehicle>>> {
        buses_at(&self.pool, stop).await
    }

    async fn add_bus(&mut self, stop: Id<BusStop>, vehicle: Id<Vehicle>) -> Result<()> {
        add_bus(&self.pool, stop, vehicle).await
    }
}

#[async_trait]
impl<'a> BusStopRepo for PgDatabaseTransaction<'a> {
    async fn buses_at(&mut self, stop: Id<BusStop>) -> Result<Vec<WithId<Vehicle>>> {
        buses_at(&mut *self.tx, stop).await
    }

    async fn add_bus(&mut self, stop: Id<BusStop>, vehicle: Id<Vehicle>) -> Result<()> {
        add_bus(&mut *self.tx, stop, vehicle).await
    }
}
