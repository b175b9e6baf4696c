use std::{env, error::Error};

use async_trait::async_trait;
use model::path::{check_waypoint_order, PathId, Waypoint};
use queries::convert_error;
use sqlx::Transaction;
use tracker::database::{
    Database, DatabaseAutocommit, DatabaseError, DatabaseTransaction,
};

pub mod data_model;
pub mod memory;
pub mod queries;

pub use memory::MemoryDatabase;

pub struct DatabaseConnectionInfo {
    pub username: String,
    pub password: String,
    pub hostname: String,
    pub port: u16,
    pub database: String,
}

impl DatabaseConnectionInfo {
    pub fn from_env() -> Option<Self> {
        let username = env::var("DATABASE_USER").ok()?;
        let password = env::var("DATABASE_PASSWORD").ok()?;
        let hostname = env::var("DATABASE_HOST").ok()?;
        let port: u16 = env::var("DATABASE_PORT").ok()?.parse().ok()?;
        let database = env::var("DATABASE_NAME").ok()?;
        Some(Self {
            username,
            password,
            hostname,
            port,
            database,
        })
    }

    pub(self) fn postgres_url(self) -> String {
        format!(
            "postgres://{}:{}@{}:{}/{}",
            self.username, self.password, self.hostname, self.port, self.database
        )
    }
}

/// Sorts the waypoints of a path by order and checks that they form a valid
/// route for `path_id`.
pub(crate) fn sorted_path(
    path_id: PathId,
    mut waypoints: Vec<Waypoint>,
) -> tracker::database::Result<Vec<Waypoint>> {
    if let Some(waypoint) = waypoints.iter().find(|waypoint| waypoint.path_id != path_id) {
        return Err(DatabaseError::InvalidData(format!(
            "waypoint of path {} passed for path {}",
            waypoint.path_id, path_id
        )));
    }
    waypoints.sort_by_key(|waypoint| waypoint.order);
    check_waypoint_order(waypoints.iter())
        .map_err(|why| DatabaseError::InvalidData(why.to_string()))?;
    Ok(waypoints)
}

#[derive(Clone)]
pub struct PgDatabase {
    connection: sqlx::PgPool,
}

pub struct PgDatabaseTransaction<'a> {
    tx: Transaction<'a, sqlx::Postgres>,
}

#[async_trait]
impl<'a> DatabaseTransaction for PgDatabaseTransaction<'a> {
    async fn commit(self) -> tracker::database::Result<()> {
        self.tx.commit().await.map_err(convert_error)
    }
}

pub struct PgDatabaseAutocommit {
    pool: sqlx::PgPool,
}

impl DatabaseAutocommit for PgDatabaseAutocommit {}

impl PgDatabase {
    pub async fn connect(
        database_connection_info: DatabaseConnectionInfo,
    ) -> Result<Self, Box<dyn Error>> {
        let url = database_connection_info.postgres_url();
        let pool = sqlx::postgres::PgPool::connect(&url).await?;

        sqlx::migrate!("./migrations").run(&pool).await?;
        log::info!("connected to postgres, migrations applied");

        Ok(Self { connection: pool })
    }
}

#[async_trait]
impl Database for PgDatabase {
    type Transaction = PgDatabaseTransaction<'static>;
    type Autocommit = PgDatabaseAutocommit;

    fn auto(&self) -> Self::Autocommit {
        PgDatabaseAutocommit {
            pool: self.connection.clone(),
        }
    }

    async fn transaction(&self) -> tracker::database::Result<Self::Transaction> {
        let tx: Transaction<'_, sqlx::Postgres> = self
            .connection
            .begin()
            .await
            .map_err(convert_error)?;

        Ok(PgDatabaseTransaction { tx })
    }
}
