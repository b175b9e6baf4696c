use async_trait::async_trait;
use model::{location::Location, vehicle::Vehicle};
use sqlx::prelude::FromRow;
use tracker::database::{Result, VehicleRepo};
use utility::id::Id;

use super::{repo, DatabaseRow};
use crate::{
    queries::vehicle::set_location, PgDatabaseAutocommit, PgDatabaseTransaction,
};

/// Table: `vehicles`
#[derive(Debug, Clone, FromRow)]
pub struct VehicleRow {
    pub id: i32,
    pub name: String,
    pub path_id: i32,
    pub location_id: Option<i32>,
}

impl DatabaseRow for VehicleRow {
    type Model = Vehicle;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        Vehicle {
            name: self.name,
            path_id: self.path_id,
            location: self.location_id.map(Id::new),
        }
    }
}

repo!(Vehicle, vehicle);

#[async_trait]
impl VehicleRepo for PgDatabaseAutocommit {
    async fn set_vehicle_location(
        &mut self,
        id: Id<Vehicle>,
        location: Option<Id<Location>>,
    ) -> Result<()> {
        set_location(&self.pool, id, location).await
    }
}

#[async_trait]
impl<'a> VehicleRepo for PgDatabaseTransaction<'a> {
    async fn set_vehicle_location(
        &mut self,
        id: Id<Vehicle>,
        location: Option<Id<Location>>,
    ) -> Result<()> {
        set_location(&mut *self.tx, id, location).await
    }
}
