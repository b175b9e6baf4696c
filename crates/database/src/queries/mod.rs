use std::fmt::Write as _;

use sqlx::{
    error::ErrorKind,
    postgres::{PgArguments, PgRow},
    query::QueryAs,
    Executor, FromRow, Postgres,
};
use tracker::database::DatabaseError;

pub mod location;
pub mod stop;
pub mod vehicle;
pub mod waypoint;

/// Constraint violations and undecodable values are reported as invalid data,
/// everything else the database complains about is passed on as is.
pub(crate) fn convert_error(why: sqlx::Error) -> DatabaseError {
    match why {
        sqlx::Error::RowNotFound => DatabaseError::NotFound,
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            DatabaseError::InvalidData(why.to_string())
        }
        sqlx::Error::Database(ref db) if !matches!(db.kind(), ErrorKind::Other) => {
            DatabaseError::InvalidData(db.message().to_owned())
        }
        _ => DatabaseError::Other(Box::new(why)),
    }
}

// bulk insert

pub async fn insert_all_returning<'c, E, T, B, O>(
    executor: E,
    table: &str,
    columns: &[&str],
    returning: &[&str],
    values: &[T],
    bind: B,
) -> Result<Vec<O>, sqlx::Error>
where
    E: Executor<'c, Database = Postgres>,
    for<'a> B: Fn(
        QueryAs<'a, Postgres, O, PgArguments>,
        &T,
    ) -> QueryAs<'a, Postgres, O, PgArguments>,
    for<'r> O: FromRow<'r, PgRow> + Send + Unpin,
{
    if values.is_empty() {
        return Ok(vec![]);
    }

    // build query string
    let mut query_str =
        format!("INSERT INTO {} ({}) VALUES ", table, columns.join(", "));
    let mut placeholder_index = 1;
    for i in 0..values.len() {
        if i > 0 {
            query_str.push_str(", ");
        }
        query_str.push('(');
        for j in 0..columns.len() {
            if j > 0 {
                query_str.push_str(", ");
            }
            let _ = write!(&mut query_str, "${}", placeholder_index);
            placeholder_index += 1;
        }
        query_str.push(')');
    }
    let _ = write!(&mut query_str, " RETURNING {};", returning.join(", "));

    // query
    let mut query = sqlx::query_as::<Postgres, O>(&query_str);
    for value in values {
        query = bind(query, value);
    }
    query.fetch_all(executor).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_row_is_not_found() {
        assert!(matches!(
            convert_error(sqlx::Error::RowNotFound),
            DatabaseError::NotFound
        ));
    }

    #[test]
    fn decode_failure_is_invalid_data() {
        let why = sqlx::Error::ColumnDecode {
            index: "latitude".to_owned(),
            source: "not a number".into(),
        };
        assert!(matches!(convert_error(why), DatabaseError::InvalidData(_)));
    }

    #[test]
    fn pool_failure_is_other() {
        assert!(matches!(
            convert_error(sqlx::Error::PoolTimedOut),
            DatabaseError::Other(_)
        ));
    }
}
