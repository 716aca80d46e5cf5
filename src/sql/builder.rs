//! Builds parameterized statements over `(id UUID, doc JSONB, version BIGINT)` collection tables.

use crate::query::{is_numeric_literal, Comparison, FilterValue, QuerySpec, SortDirection};
use crate::sql::params::SqlParam;
use crate::store::{Collection, Document, StoreError};
use uuid::Uuid;

/// Quote identifier for PostgreSQL (safe: only from static collection definitions).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

fn literal(s: &str) -> String {
    format!("'{}'", s.replace('\'', "''"))
}

const RETURNING: &str = "id, doc, version";

#[derive(Debug)]
pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<SqlParam>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: SqlParam) -> u32 {
        let n = self.params.len() as u32 + 1;
        self.params.push(v);
        n
    }

    fn push_text(&mut self, s: &str) -> u32 {
        self.push_param(SqlParam::Text(s.to_string()))
    }
}

/// Name of the unique expression index backing `field`.
pub fn unique_index_name(collection: &Collection, field: &str) -> String {
    format!("{}_{}_key", collection.name, field)
}

/// DDL for one collection table and its unique indexes. Idempotent.
pub fn create_collection(collection: &Collection) -> Vec<String> {
    let table = quoted(collection.name);
    let mut ddl = vec![format!(
        r#"
        CREATE TABLE IF NOT EXISTS {} (
            id UUID PRIMARY KEY,
            doc JSONB NOT NULL,
            version BIGINT NOT NULL DEFAULT 0,
            created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
            updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        table
    )];
    for field in collection.unique_fields {
        ddl.push(format!(
            "CREATE UNIQUE INDEX IF NOT EXISTS {} ON {} ((doc ->> {}))",
            quoted(&unique_index_name(collection, field)),
            table,
            literal(field)
        ));
    }
    ddl
}

/// Visibility clause for the secret flag; `TRUE` for collections without one.
fn visible_clause(q: &mut QueryBuf, collection: &Collection) -> String {
    match collection.secret_flag {
        Some(flag) => {
            let n = q.push_text(flag);
            format!("COALESCE(doc ->> ${}, 'false') <> 'true'", n)
        }
        None => "TRUE".to_string(),
    }
}

fn numeric_field(k: u32) -> String {
    format!("(CASE WHEN jsonb_typeof(doc -> ${k}) = 'number' THEN (doc ->> ${k})::numeric END)")
}

fn string_field(k: u32) -> String {
    format!("(CASE WHEN jsonb_typeof(doc -> ${k}) = 'string' THEN doc ->> ${k} END)")
}

/// Equality: text form, string array membership, and numeric value when the literal is numeric.
fn equality_sql(q: &mut QueryBuf, k: u32, lit: &str) -> String {
    let v = q.push_text(lit);
    let mut parts = vec![
        format!("doc ->> ${k} = ${v}"),
        format!("doc -> ${k} @> jsonb_build_array(${v}::text)"),
    ];
    if is_numeric_literal(lit) {
        parts.push(format!("{} = ${v}::numeric", numeric_field(k)));
        parts.push(format!("doc -> ${k} @> jsonb_build_array(${v}::numeric)"));
    }
    format!("({})", parts.join(" OR "))
}

fn comparison_sql(q: &mut QueryBuf, k: u32, cmp: Comparison, lit: &str) -> String {
    let v = q.push_text(lit);
    if is_numeric_literal(lit) {
        format!("{} {} ${v}::numeric", numeric_field(k), cmp.sql())
    } else {
        format!("{} {} ${v}", string_field(k), cmp.sql())
    }
}

fn predicate_sql(q: &mut QueryBuf, field: &str, cond: &FilterValue) -> Result<String, StoreError> {
    let k = q.push_text(field);
    match cond {
        FilterValue::Literal(lit) => Ok(equality_sql(q, k, lit)),
        FilterValue::Ops(ops) if ops.keys().any(|op| op.starts_with('$')) => {
            let mut parts = Vec::with_capacity(ops.len());
            for (op, operand) in ops {
                let cmp = Comparison::from_operator(op).ok_or_else(|| StoreError::UnsupportedOperator(op.clone()))?;
                let FilterValue::Literal(lit) = operand else {
                    return Err(StoreError::UnsupportedOperator(op.clone()));
                };
                parts.push(comparison_sql(q, k, cmp, lit));
            }
            Ok(parts.join(" AND "))
        }
        FilterValue::Ops(_) => {
            let v = q.push_param(SqlParam::Json(cond.to_json()));
            Ok(format!("doc -> ${k} = ${v}"))
        }
    }
}

/// SELECT for a list request: filter, order (spec keys, then creation order), LIMIT/OFFSET.
/// Projection is applied to the decoded documents, not in SQL.
pub fn select_list(collection: &Collection, spec: &QuerySpec) -> Result<QueryBuf, StoreError> {
    let mut q = QueryBuf::new();
    let mut where_parts = vec![visible_clause(&mut q, collection)];
    for (field, cond) in &spec.filter {
        where_parts.push(predicate_sql(&mut q, field, cond)?);
    }

    let mut order_parts = Vec::with_capacity(spec.sort.len() + 2);
    for key in &spec.sort {
        let k = q.push_text(&key.field);
        // Missing fields (SQL NULL) first when ascending, last when descending.
        let dir = match key.direction {
            SortDirection::Ascending => "ASC NULLS FIRST",
            SortDirection::Descending => "DESC NULLS LAST",
        };
        order_parts.push(format!("doc -> ${} {}", k, dir));
    }
    order_parts.push("created_at".to_string());
    order_parts.push("id".to_string());

    let limit = spec.pagination.limit.min(i64::MAX as u64);
    let offset = spec.pagination.skip.min(i64::MAX as u64);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY {} LIMIT {} OFFSET {}",
        RETURNING,
        quoted(collection.name),
        where_parts.join(" AND "),
        order_parts.join(", "),
        limit,
        offset
    );
    Ok(q)
}

/// Every visible document in creation order.
pub fn select_all(collection: &Collection) -> QueryBuf {
    let mut q = QueryBuf::new();
    let visible = visible_clause(&mut q, collection);
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} ORDER BY created_at, id",
        RETURNING,
        quoted(collection.name),
        visible
    );
    q
}

pub fn select_by_id(collection: &Collection, id: Uuid) -> QueryBuf {
    let mut q = QueryBuf::new();
    let n = q.push_param(SqlParam::Uuid(id));
    let visible = visible_clause(&mut q, collection);
    q.sql = format!(
        "SELECT {} FROM {} WHERE id = ${} AND {}",
        RETURNING,
        quoted(collection.name),
        n,
        visible
    );
    q
}

/// INSERT with a caller-chosen id; `doc` must already be free of store-managed keys.
pub fn insert(collection: &Collection, id: Uuid, doc: &Document) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_n = q.push_param(SqlParam::Uuid(id));
    let doc_n = q.push_param(SqlParam::Json(serde_json::Value::Object(doc.clone())));
    q.sql = format!(
        "INSERT INTO {} (id, doc) VALUES (${}, ${}) RETURNING {}",
        quoted(collection.name),
        id_n,
        doc_n,
        RETURNING
    );
    q
}

/// UPDATE by id: top-level merge of `patch` into the stored document, version bump.
pub fn update(collection: &Collection, id: Uuid, patch: &Document) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_n = q.push_param(SqlParam::Uuid(id));
    let patch_n = q.push_param(SqlParam::Json(serde_json::Value::Object(patch.clone())));
    let visible = visible_clause(&mut q, collection);
    q.sql = format!(
        "UPDATE {} SET doc = doc || ${}, version = version + 1, updated_at = NOW() WHERE id = ${} AND {} RETURNING {}",
        quoted(collection.name),
        patch_n,
        id_n,
        visible,
        RETURNING
    );
    q
}

pub fn delete(collection: &Collection, id: Uuid) -> QueryBuf {
    let mut q = QueryBuf::new();
    let id_n = q.push_param(SqlParam::Uuid(id));
    let visible = visible_clause(&mut q, collection);
    q.sql = format!(
        "DELETE FROM {} WHERE id = ${} AND {}",
        quoted(collection.name),
        id_n,
        visible
    );
    q
}
