use model::{location::Location, WithId};
use sqlx::{Executor, Postgres};
use tracker::database::{DatabaseError, Result};
use utility::{id::Id, let_also::LetAlso};

use super::convert_error;
use crate::data_model::{location::LocationRow, with_id, with_ids, DatabaseRow};

// Repo

pub async fn get<'c, E>(executor: E, id: Id<Location>) -> Result<Location>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as("SELECT id, latitude, longitude FROM locations WHERE id = $1;")
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
        .map(|row: LocationRow| row.to_model())
}

pub async fn get_all<'c, E>(executor: E) -> Result<Vec<WithId<Location>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as("SELECT id, latitude, longitude FROM locations ORDER BY id ASC;")
        .fetch_all(executor)
        .await
        .map_err(convert_error)?
        .let_owned(|rows: Vec<LocationRow>| Ok(with_ids(rows)))
}

pub async fn insert<'c, E>(executor: E, location: Location) -> Result<WithId<Location>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO locations(
            latitude,
            longitude
        )
        VALUES ($1, $2)
        RETURNING id, latitude, longitude;
        ",
    )
    .bind(location.latitude)
    .bind(location.longitude)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: LocationRow| with_id(row))
}

/// Inserts or replaces the location under its id and moves the id sequence
/// past it, so later inserts do not collide.
pub async fn put<'c, E>(executor: E, location: WithId<Location>) -> Result<WithId<Location>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        WITH upserted AS (
            INSERT INTO locations(
                id,
                latitude,
                longitude
            )
            VALUES ($1, $2, $3)
            ON CONFLICT (id)
            DO UPDATE SET
                latitude = EXCLUDED.latitude,
                longitude = EXCLUDED.longitude
            RETURNING id, latitude, longitude
        )
        SELECT upserted.id, upserted.latitude, upserted.longitude
        FROM upserted, (
            SELECT setval(
                pg_get_serial_sequence('locations', 'id'),
                GREATEST((SELECT COALESCE(MAX(id), 0) FROM locations), $1, 1)
            )
        ) AS sequence;
        ",
    )
    .bind(location.id.raw())
    .bind(location.content.latitude)
    .bind(location.content.longitude)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: LocationRow| with_id(row))
}

pub async fn exists<'c, E>(executor: E, id: Id<Location>) -> Result<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM locations WHERE id = $1);")
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
}

/// Stops at the location go with it, the foreign keys of vehicles and
/// waypoints are set to null.
pub async fn delete<'c, E>(executor: E, id: Id<Location>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query("DELETE FROM locations WHERE id = $1;")
        .bind(id.raw())
        .execute(executor)
        .await
        .map_err(convert_error)?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound);
    }
    Ok(())
}
