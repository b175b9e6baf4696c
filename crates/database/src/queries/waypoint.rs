use model::{
    path::{PathId, Waypoint},
    WithId,
};
use sqlx::{Executor, PgConnection, Postgres};
use tracker::database::Result;
use utility::{
    id::{Id, IdWrapper},
    let_also::LetAlso,
};

use super::{convert_error, insert_all_returning};
use crate::{
    data_model::{waypoint::WaypointRow, with_id, with_ids, DatabaseRow},
    sorted_path,
};

const COLUMNS: &[&str] = &["path_id", "location_id", "waypoint_order", "distance"];
const RETURNING: &[&str] = &["id", "path_id", "location_id", "waypoint_order", "distance"];

// Repo

pub async fn get<'c, E>(executor: E, id: Id<Waypoint>) -> Result<Waypoint>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, path_id, location_id, waypoint_order, distance
        FROM
            waypoints
        WHERE id = $1;
        ",
    )
    .bind(id.raw())
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: WaypointRow| row.to_model())
}

pub async fn get_all<'c, E>(executor: E) -> Result<Vec<WithId<Waypoint>>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        SELECT
            id, path_id, location_id, waypoint_order, distance
        FROM
            waypoints
        ORDER BY id ASC;
        ",
    )
    .fetch_all(executor)
    .await
    .map_err(convert_error)?
    .let_owned(|rows: Vec<WaypointRow>| Ok(with_ids(rows)))
}

pub async fn insert<'c, E>(executor: E, waypoint: Waypoint) -> Result<WithId<Waypoint>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        INSERT INTO waypoints(
            path_id,
            location_id,
            waypoint_order,
            distance
        )
        VALUES ($1, $2, $3, $4)
        RETURNING id, path_id, location_id, waypoint_order, distance;
        ",
    )
    .bind(waypoint.path_id)
    .bind(waypoint.location.raw())
    .bind(waypoint.order)
    .bind(waypoint.distance)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: WaypointRow| with_id(row))
}

pub async fn put<'c, E>(executor: E, waypoint: WithId<Waypoint>) -> Result<WithId<Waypoint>>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_as(
        "
        WITH upserted AS (
            INSERT INTO waypoints(
                id,
                path_id,
                location_id,
                waypoint_order,
                distance
            )
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (id)
            DO UPDATE SET
                path_id = EXCLUDED.path_id,
                location_id = EXCLUDED.location_id,
                waypoint_order = EXCLUDED.waypoint_order,
                distance = EXCLUDED.distance
            RETURNING id, path_id, location_id, waypoint_order, distance
        )
        SELECT
            upserted.id, upserted.path_id, upserted.location_id,
            upserted.waypoint_order, upserted.distance
        FROM upserted, (
            SELECT setval(
                pg_get_serial_sequence('waypoints', 'id'),
                GREATEST((SELECT COALESCE(MAX(id), 0) FROM waypoints), $1, 1)
            )
        ) AS sequence;
        ",
    )
    .bind(waypoint.id.raw())
    .bind(waypoint.content.path_id)
    .bind(waypoint.content.location.raw())
    .bind(waypoint.content.order)
    .bind(waypoint.content.distance)
    .fetch_one(executor)
    .await
    .map_err(convert_error)
    .map(|row: WaypointRow| with_id(row))
}

pub async fn exists<'c, E>(executor: E, id: Id<Waypoint>) -> Result<bool>
where
    E: Executor<'c, Database = Postgres>,
{
    sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM waypoints WHERE id = $1);")
        .bind(id.raw())
        .fetch_one(executor)
        .await
        .map_err(convert_error)
}

/// Fails if storing `waypoint`, in place of the row `replaces` if given, would
/// break the order of its path.
async fn check_path(
    connection: &mut PgConnection,
    replaces: Option<Id<Waypoint>>,
    waypoint: &Waypoint,
) -> Result<()> {
    let mut path = sqlx::query_as(
        "
        SELECT
            id, path_id, location_id, waypoint_order, distance
        FROM
            waypoints
        WHERE path_id = $1 AND id IS DISTINCT FROM $2;
        ",
    )
    .bind(waypoint.path_id)
    .bind(replaces.raw())
    .fetch_all(&mut *connection)
    .await
    .map_err(convert_error)?
    .into_iter()
    .map(|row: WaypointRow| row.to_model())
    .collect::<Vec<_>>();
    path.push(waypoint.clone());
    sorted_path(waypoint.path_id, path).map(|_| ())
}

/// `insert` for a single waypoint, rejecting it if it breaks the order of its
/// path. Must run inside a transaction.
pub async fn insert_checked(
    connection: &mut PgConnection,
    waypoint: Waypoint,
) -> Result<WithId<Waypoint>> {
    check_path(&mut *connection, None, &waypoint).await?;
    insert(&mut *connection, waypoint).await
}

/// `put` for a single waypoint, rejecting it if it breaks the order of its
/// path. Must run inside a transaction.
pub async fn put_checked(
    connection: &mut PgConnection,
    waypoint: WithId<Waypoint>,
) -> Result<WithId<Waypoint>> {
    check_path(&mut *connection, Some(waypoint.id), &waypoint.content).await?;
    put(&mut *connection, waypoint).await
}

/// Deletes the waypoints of a path and inserts the new ones. Must run inside a
/// transaction.
pub async fn replace_path(
    connection: &mut PgConnection,
    path_id: PathId,
    waypoints: Vec<Waypoint>,
) -> Result<Vec<WithId<Waypoint>>> {
    let waypoints = sorted_path(path_id, waypoints)?;

    sqlx::query("DELETE FROM waypoints WHERE path_id = $1;")
        .bind(path_id)
        .execute(&mut *connection)
        .await
        .map_err(convert_error)?;

    let rows: Vec<WaypointRow> = insert_all_returning(
        &mut *connection,
        "waypoints",
        COLUMNS,
        RETURNING,
        &waypoints,
        |query, waypoint| {
            query
                .bind(waypoint.path_id)
                .bind(waypoint.location.raw())
                .bind(waypoint.order)
                .bind(waypoint.distance)
        },
    )
    .await
    .map_err(convert_error)?;
    Ok(with_ids(rows))
}
