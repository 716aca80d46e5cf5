//! Values bound to PostgreSQL statements.

use serde_json::Value;
use sqlx::postgres::{PgArguments, Postgres};
use sqlx::query::Query;
use uuid::Uuid;

/// A statement parameter. Text parameters are cast in SQL where another type is needed.
#[derive(Clone, Debug, PartialEq)]
pub enum SqlParam {
    Text(String),
    Uuid(Uuid),
    Json(Value),
}

/// Bind parameters in order; the n-th parameter fills `$n`.
pub fn bind_params<'q>(
    mut query: Query<'q, Postgres, PgArguments>,
    params: &'q [SqlParam],
) -> Query<'q, Postgres, PgArguments> {
    for p in params {
        query = match p {
            SqlParam::Text(s) => query.bind(s.as_str()),
            SqlParam::Uuid(u) => query.bind(*u),
            SqlParam::Json(v) => query.bind(sqlx::types::Json(v)),
        };
    }
    query
}
