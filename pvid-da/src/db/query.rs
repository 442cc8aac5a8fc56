//! Chunked `IN (...)` queries with bound parameters

use pvid_common::Result;
use sqlx::postgres::PgRow;
use sqlx::{FromRow, PgPool, Postgres, QueryBuilder};

/// Maximum ids bound into a single statement
pub const QUERY_CHUNK_SIZE: usize = 1000;

/// Run `<select> (<id>, <id>, ...)` once per chunk of `ids` and concatenate rows.
///
/// `select` must end with `IN`. An empty id list returns no rows without
/// touching the database.
pub(crate) async fn fetch_in_chunks<T>(pool: &PgPool, select: &str, ids: &[String]) -> Result<Vec<T>>
where
    T: for<'r> FromRow<'r, PgRow> + Send + Unpin,
{
    let mut rows = Vec::new();
    for chunk in ids.chunks(QUERY_CHUNK_SIZE) {
        let mut builder = build_in_query(select, chunk);
        let mut fetched = builder.build_query_as::<T>().fetch_all(pool).await?;
        rows.append(&mut fetched);
    }
    Ok(rows)
}

pub(crate) fn build_in_query<'args>(select: &str, ids: &[String]) -> QueryBuilder<'args, Postgres> {
    let mut builder = QueryBuilder::<Postgres>::new(select);
    builder.push(" (");
    let mut separated = builder.separated(", ");
    for id in ids {
        separated.push_bind(id.clone());
    }
    separated.push_unseparated(")");
    builder
}
