use async_trait::async_trait;
use model::location::Location;
use sqlx::prelude::FromRow;
use tracker::database::{LocationRepo, Result};
use utility::id::Id;

use super::{repo, DatabaseRow};
use crate::{queries::location::delete, PgDatabaseAutocommit, PgDatabaseTransaction};

/// Table: `locations`
#[derive(Debug, Clone, FromRow)]
pub struct LocationRow {
    pub id: i32,
    pub latitude: f64,
    pub longitude: f64,
}

impl DatabaseRow for LocationRow {
    type Model = Location;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        Location {
            latitude: self.latitude,
            longitude: self.longitude,
        }
    }
}

repo!(Location, location);

#[async_trait]
impl LocationRepo for PgDatabaseAutocommit {
    async fn delete_location(&mut self, id: Id<Location>) -> Result<()> {
        delete(&self.pool, id).await
    }
}

#[async_trait]
impl<'a> LocationRepo for PgDatabaseTransaction<'a> {
    async fn delete_location(&mut self, id: Id<Location>) -> Result<()> {
        delete(&mut *self.tx, id).await
    }
}
