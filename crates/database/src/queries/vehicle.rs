use model::{location::Location, vehicle::Vehicle, WithId};
use sqlx::{Executor, Postgres};
use tracker::database::{DatabaseError, Result};
use utility::{
    id::{Id, IdWrapper},
    let_also::LetAlso,
};

use super::convert_error;
use crate::data_model::{vehicle::VehicleRow, with_id, with_ids, DatabaseRow};

// Repo

pub async fn get<'c, E>(executor: E, id: Id<Vehicle>) -> Result<Vehicle>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, name, path_id, location_id
        FROM
            vehicles
        WHERE id = $1;
        ",
    )
    .bind(id.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: VehicleRow| row.to_model())
}

pub async fn get_all<'c, E>(executor: E) -> Result<Vec<WithId<Vehicle>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, name, path_id, location_id
        FROM
            vehicles
        ORDER BY id ASC;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<VehicleRow>| Ok(with_ids(rows)))
}

pub async fn insert<'c, E>(executor: E, vehicle: Vehicle) -> Result<WithId<Vehicle>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO vehicles(
            name,
            path_id,
            location_id
        )
        VALUES ($1, $2, $3)
        RETURNING id, name, path_id, location_id;
        ",
    )
    .bind(vehicle.name)
    .bind(vehicle.path_id)
    .bind(vehicle.location.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: VehicleRow| with_id(row))
}

pub async fn put<'c, E>(executor: E, vehicle: WithId<Vehicle>) -> Result<WithId<Vehicle>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        WITH upserted AS (
            INSERT INTO vehicles(
                id,
                name,
                path_id,
                location_id
            )
            VALUES ($1, $2, $3, $4)
            ON CONFLICT (id)
            DO UPDATE SET
                name = EXCLUDED.name,
                path_id = EXCLUDED.path_id,
                location_id = EXCLUDED.location_id
            RETURNING id, name, path_id, location_id
        )
        SELECT upserted.id, upserted.name, upserted.path_id, upserted.location_id
        FROM upserted, (
            SELECT setval(
                pg_get_serial_sequence('vehicles', 'id'),
                GREATEST((SELECT COALESCE(MAX(id), 0) FROM vehicles), $1, 1)
            )
        ) AS sequence;
        ",
    )
    .bind(vehicle.id.raw())
    .bind(vehicle.content.name)
    .bind(vehicle.content.path_id)
    .bind(vehicle.content.location.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: VehicleRow| with_id(row))
}

pub async fn exists<'c, E>(executor: E, id: Id<Vehicle>) -> Result<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM vehicles WHERE id = $1);")
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
}

pub async fn set_location<'c, E>(
    executor: E,
    id: Id<Vehicle>,
    location: Option<Id<Location>>,
) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    let result = sqlx::query("UPDATE vehicles SET location_id = $2 WHERE id = $1;")
        .bind(id.raw())
        .bind(location.raw())
        .execute(executor)
        .await
        .map_err(convert_error)?;
    if result.rows_affected() == 0 {
        return Err(DatabaseError::NotFound);
    }
    Ok(())
}
