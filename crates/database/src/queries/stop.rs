use model::{stop::BusStop, vehicle::Vehicle, WithId};
use sqlx::{Executor, Postgres};
use tracker::database::Result;
use utility::{id::Id, let_also::LetAlso};

use super::convert_error;
use crate::data_model::{
    stop::BusStopRow, vehicle::VehicleRow, with_id, with_ids, DatabaseRow,
};

// Repo

pub async fn get<'c, E>(executor: E, id: Id<BusStop>) -> Result<BusStop>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as("SELECT id, name, location_id FROM bus_stops WHERE id = $1;")
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
        .map(|row: BusStopRow| row.to_model())
}

pub async fn get_all<'c, E>(executor: E) -> Result<Vec<WithId<BusStop>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as("SELECT id, name, location_id FROM bus_stops ORDER BY id ASC;")
        .fetch_all(executor)
        .await
        .map_err(convert_error)?
        .let_owned(|rows: Vec<BusStopRow>| Ok(with_ids(rows)))
}

pub async fn insert<'c, E>(executor: E, stop: BusStop) -> Result<WithId<BusStop>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO bus_stops(
            name,
            location_id
        )
        VALUES ($1, $2)
        RETURNING id, name, location_id;
        ",
    )
    .bind(stop.name)
    .bind(stop.location.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: BusStopRow| with_id(row))
}

pub async fn put<'c, E>(executor: E, stop: WithId<BusStop>) -> Result<WithId<BusStop>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        WITH upserted AS (
            INSERT INTO bus_stops(
                id,
                name,
                location_id
            )
            VALUES ($1, $2, $3)
            ON CONFLICT (id)
            DO UPDATE SET
                name = EXCLUDED.name,
                location_id = EXCLUDED.location_id
            RETURNING id, name, location_id
        )
        SELECT upserted.id, upserted.name, upserted.location_id
        FROM upserted, (
            SELECT setval(
                pg_get_serial_sequence('bus_stops', 'id'),
                GREATEST((SELECT COALESCE(MAX(id), 0) FROM bus_stops), $1, 1)
            )
        ) AS sequence;
        ",
    )
    .bind(stop.id.raw())
    .bind(stop.content.name)
    .bind(stop.content.location.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: BusStopRow| with_id(row))
}

pub async fn exists<'c, E>(executor: E, id: Id<BusStop>) -> Result<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM bus_stops WHERE id = $1);")
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
}

// buses serving a stop

pub async fn buses_at<'c, E>(executor: E, stop: Id<BusStop>) -> Result<Vec<WithId<Vehicle>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            vehicles.id, vehicles.name, vehicles.path_id, vehicles.location_id
        FROM
            bus_stop_buses
            JOIN vehicles ON vehicles.id = bus_stop_buses.vehicle_id
        WHERE
            bus_stop_buses.stop_id = $1
        ORDER BY bus_stop_buses.id ASC;
        ",
    )
    .bind(stop.raw())
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<VehicleRow>| Ok(with_ids(rows)))
}

pub async fn add_bus<'c, E>(executor: E, stop: Id<BusStop>, vehicle: Id<Vehicle>) -> Result<()>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query(
        "
        INSERT INTO bus_stop_buses(
            stop_id,
            vehicle_id
        )
        VALUES ($1, $2)
        ON CONFLICT (stop_id, vehicle_id) DO NOTHING;
        ",
    )
    .bind(stop.raw())
    .bind(vehicle.raw())
    .execute(executor)
    .await
    .map_err(convert_error)?;
    Ok(())
}
