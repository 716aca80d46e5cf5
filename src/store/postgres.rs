//! PostgreSQL document store: one table per collection, documents in a JSONB column.

use crate::query::QuerySpec;
use crate::sql::{self, bind_params, QueryBuf};
use crate::store::{
    display_value, strip_managed, Collection, Document, DocumentStore, StoreError, ID_FIELD, VERSION_FIELD,
};
use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{ConnectOptions, PgPool, Row};
use std::str::FromStr;
use uuid::Uuid;

#[derive(Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    pub fn new(pool: PgPool) -> Self {
        PgDocumentStore { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    /// Create collection tables and unique indexes if missing.
    pub async fn ensure_collections(&self, collections: &[Collection]) -> Result<(), StoreError> {
        for collection in collections {
            for ddl in sql::create_collection(collection) {
                sqlx::query(&ddl).execute(&self.pool).await?;
            }
            tracing::info!(collection = collection.name, "collection ready");
        }
        Ok(())
    }

    async fn fetch_all(&self, q: &QueryBuf) -> Result<Vec<Document>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_params(sqlx::query(&q.sql), &q.params).fetch_all(&self.pool).await?;
        rows.iter().map(row_to_document).collect()
    }

    async fn fetch_optional(&self, q: &QueryBuf) -> Result<Option<Document>, StoreError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_params(sqlx::query(&q.sql), &q.params)
            .fetch_optional(&self.pool)
            .await?;
        row.as_ref().map(row_to_document).transpose()
    }
}

fn row_to_document(row: &PgRow) -> Result<Document, StoreError> {
    let id: Uuid = row.try_get("id")?;
    let Json(doc): Json<Value> = row.try_get("doc")?;
    let version: i64 = row.try_get("version")?;
    let Value::Object(mut map) = doc else {
        return Err(StoreError::Malformed(format!("document {} is not an object", id)));
    };
    map.insert(ID_FIELD.into(), Value::String(id.to_string()));
    map.insert(VERSION_FIELD.into(), Value::from(version));
    Ok(map)
}

/// Unique violations on a collection index become [`StoreError::Duplicate`].
fn classify(collection: &Collection, doc: &Document, e: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db) = &e {
        if db.code().as_deref() == Some("23505") {
            let field = collection
                .unique_fields
                .iter()
                .find(|f| db.constraint() == Some(sql::unique_index_name(collection, f).as_str()));
            if let Some(field) = field {
                return StoreError::Duplicate {
                    field: field.to_string(),
                    value: display_value(doc.get(*field)),
                };
            }
        }
    }
    StoreError::Db(e)
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find(&self, collection: &Collection, spec: &QuerySpec) -> Result<Vec<Document>, StoreError> {
        let q = sql::select_list(collection, spec)?;
        let exclusions = collection.default_exclusions();
        Ok(self
            .fetch_all(&q)
            .await?
            .into_iter()
            .map(|doc| spec.project(doc, ID_FIELD, &exclusions))
            .collect())
    }

    async fn scan(&self, collection: &Collection) -> Result<Vec<Document>, StoreError> {
        self.fetch_all(&sql::select_all(collection)).await
    }

    async fn find_by_id(&self, collection: &Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        self.fetch_optional(&sql::select_by_id(collection, id)).await
    }

    async fn insert(&self, collection: &Collection, doc: Document) -> Result<Document, StoreError> {
        let doc = strip_managed(doc);
        let q = sql::insert(collection, Uuid::new_v4(), &doc);
        match self.fetch_optional(&q).await {
            Ok(Some(row)) => Ok(row),
            Ok(None) => Err(StoreError::Malformed("insert returned no row".into())),
            Err(StoreError::Db(e)) => Err(classify(collection, &doc, e)),
            Err(e) => Err(e),
        }
    }

    async fn update(&self, collection: &Collection, id: Uuid, patch: Document) -> Result<Option<Document>, StoreError> {
        let patch = strip_managed(patch);
        let q = sql::update(collection, id, &patch);
        match self.fetch_optional(&q).await {
            Err(StoreError::Db(e)) => Err(classify(collection, &patch, e)),
            other => other,
        }
    }

    async fn delete(&self, collection: &Collection, id: Uuid) -> Result<bool, StoreError> {
        let q = sql::delete(collection, id);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let result = bind_params(sqlx::query(&q.sql), &q.params).execute(&self.pool).await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        sqlx::query("SELECT 1").fetch_optional(&self.pool).await?;
        Ok(())
    }
}

/// Create the target database when it does not exist yet (connects to the `postgres` database).
pub async fn ensure_database_exists(database_url: &str) -> Result<(), StoreError> {
    let (admin_url, db_name) = parse_db_name_from_url(database_url)?;
    if db_name.is_empty() || db_name == "postgres" {
        return Ok(());
    }
    let opts = sqlx::postgres::PgConnectOptions::from_str(&admin_url)?;
    let mut conn: sqlx::PgConnection = opts.connect().await?;
    let exists: (bool,) = sqlx::query_as("SELECT EXISTS(SELECT 1 FROM pg_database WHERE datname = $1)")
        .bind(&db_name)
        .fetch_one(&mut conn)
        .await?;
    if !exists.0 {
        sqlx::query(&format!("CREATE DATABASE \"{}\"", db_name.replace('"', "\"\"")))
            .execute(&mut conn)
            .await?;
        tracing::info!(database = %db_name, "created database");
    }
    Ok(())
}

fn parse_db_name_from_url(url: &str) -> Result<(String, String), StoreError> {
    let path_start = url
        .rfind('/')
        .ok_or_else(|| StoreError::Unavailable("DATABASE_URL: no path".into()))?
        + 1;
    let path_and_query = url.get(path_start..).unwrap_or("");
    let db_name = path_and_query.split('?').next().unwrap_or("").trim();
    let base = url.get(..path_start).unwrap_or(url);
    Ok((format!("{}postgres", base), db_name.to_string()))
}
