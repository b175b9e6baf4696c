use async_trait::async_trait;
use model::{
    path::{PathId, Waypoint},
    WithId,
};
use sqlx::prelude::FromRow;
use tracker::database::{Repo, Result, WaypointRepo};
use utility::id::Id;

use super::DatabaseRow;
use crate::{
    queries::{
        convert_error,
        waypoint::{self, replace_path},
    },
    PgDatabaseAutocommit, PgDatabaseTransaction,
};

/// Table: `waypoints`
#[derive(Debug, Clone, FromRow)]
pub struct WaypointRow {
    pub id: i32,
    pub path_id: i32,
    pub location_id: Option<i32>,
    pub waypoint_order: i32,
    pub distance: i32,
}

impl DatabaseRow for WaypointRow {
    type Model = Waypoint;

    fn get_id(&self) -> Id<Self::Model> {
        Id::new(self.id)
    }

    fn to_model(self) -> Self::Model {
        Waypoint {
            path_id: self.path_id,
            location: self.location_id.map(Id::new),
            order: self.waypoint_order,
            distance: self.distance,
        }
    }
}

// Writes check the order of the affected path, so they are not generated by
// `repo!`.

#[async_trait]
impl Repo<Waypoint> for PgDatabaseAutocommit {
    async fn get(&mut self, id: Id<Waypoint>) -> Result<Waypoint> {
        waypoint::get(&self.pool, id).await
    }

    async fn get_all(&mut self) -> Result<Vec<WithId<Waypoint>>> {
        waypoint::get_all(&self.pool).await
    }

    async fn insert(&mut self, element: Waypoint) -> Result<WithId<Waypoint>> {
        let mut tx = self.pool.begin().await.map_err(convert_error)?;
        let result = waypoint::insert_checked(&mut *tx, element).await?;
        tx.commit().await.map_err(convert_error)?;
        Ok(result)
    }

    async fn put(&mut self, element: WithId<Waypoint>) -> Result<WithId<Waypoint>> {
        let mut tx = self.pool.begin().await.map_err(convert_error)?;
        let result = waypoint::put_checked(&mut *tx, element).await?;
        tx.commit().await.map_err(convert_error)?;
        Ok(result)
    }

    async fn exists(&mut self, id: Id<Waypoint>) -> Result<bool> {
        waypoint::exists(&self.pool, id).await
    }
}

#[async_trait]
impl<'a> Repo<Waypoint> for PgDatabaseTransaction<'a> {
    async fn get(&mut self, id: Id<Waypoint>) -> Result<Waypoint> {
        waypoint::get(&mut *self.tx, id).await
    }

    async fn get_all(&mut self) -> Result<Vec<WithId<Waypoint>>> {
        waypoint::get_all(&mut *self.tx).await
    }

    async fn insert(&mut self, element: Waypoint) -> Result<WithId<Waypoint>> {
        waypoint::insert_checked(&mut *self.tx, element).await
    }

    async fn put(&mut self, element: WithId<Waypoint>) -> Result<WithId<Waypoint>> {
        waypoint::put_checked(&mut *self.tx, element).await
    }

    async fn exists(&mut self, id: Id<Waypoint>) -> Result<bool> {
        waypoint::exists(&mut *self.tx, id).await
    }
}

#[async_trait]
impl WaypointRepo for PgDatabaseAutocommit {
    async fn replace_path(
        &mut self,
        path_id: PathId,
        waypoints: Vec<Waypoint>,
    ) -> Result<Vec<WithId<Waypoint>>> {
        // delete and insert must not be observed separately
        let mut tx = self.pool.begin().await.map_err(convert_error)?;
        let result = replace_path(&mut *tx, path_id, waypoints).await?;
        tx.commit().await.map_err(convert_error)?;
        Ok(result)
    }
}

#[async_trait]
impl<'a> WaypointRepo for PgDatabaseTransaction<'a> {
    async fn replace_path(
        &mut self,
        path_id: PathId,
        waypoints: Vec<Waypoint>,
    ) -> Result<Vec<WithId<Waypoint>>> {
        replace_path(&mut *self.tx, path_id, waypoints).await
    }
}
