//! Document store boundary: the trait services call and its in-memory and PostgreSQL backends.

mod matching;
pub mod memory;
pub mod postgres;

pub use memory::InMemoryDocumentStore;
pub use postgres::{ensure_database_exists, PgDocumentStore};

use crate::query::QuerySpec;
use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

pub type Document = Map<String, Value>;

/// Store-managed identifier field.
pub const ID_FIELD: &str = "id";
/// Store-managed version counter, excluded from output unless projected.
pub const VERSION_FIELD: &str = "__v";

/// Static description of one collection.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Collection {
    pub name: &'static str,
    /// Fields whose values must be unique across the collection.
    pub unique_fields: &'static [&'static str],
    /// Fields left out of output unless explicitly projected.
    pub hidden_fields: &'static [&'static str],
    /// Documents where this field is `true` are invisible to every read, update and delete.
    pub secret_flag: Option<&'static str>,
}

impl Collection {
    pub fn default_exclusions(&self) -> Vec<&'static str> {
        let mut fields = vec![VERSION_FIELD];
        fields.extend_from_slice(self.hidden_fields);
        fields
    }

    pub fn is_secret(&self, doc: &Document) -> bool {
        self.secret_flag
            .map(|flag| doc.get(flag) == Some(&Value::Bool(true)))
            .unwrap_or(false)
    }

    /// Drop default exclusions from a single document before it leaves the service.
    pub fn present(&self, doc: Document) -> Document {
        QuerySpec::default().project(doc, ID_FIELD, &self.default_exclusions())
    }
}

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("duplicate value '{value}' for unique field {field}")]
    Duplicate { field: String, value: String },
    #[error("unsupported filter operator '{0}'")]
    UnsupportedOperator(String),
    #[error("database: {0}")]
    Db(#[from] sqlx::Error),
    #[error("store unavailable: {0}")]
    Unavailable(String),
    #[error("malformed document: {0}")]
    Malformed(String),
}

/// Operations the services need from a document store. `find` is the only place a
/// [`QuerySpec`] is executed.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// Filter, order, skip/limit, then project.
    async fn find(&self, collection: &Collection, spec: &QuerySpec) -> Result<Vec<Document>, StoreError>;

    /// Every visible document in creation order, unprojected.
    async fn scan(&self, collection: &Collection) -> Result<Vec<Document>, StoreError>;

    async fn find_by_id(&self, collection: &Collection, id: Uuid) -> Result<Option<Document>, StoreError>;

    /// Insert with a fresh id and version 0. `id` and `__v` in the input are ignored.
    async fn insert(&self, collection: &Collection, doc: Document) -> Result<Document, StoreError>;

    /// Shallow merge of `patch` into the stored document; bumps the version.
    async fn update(&self, collection: &Collection, id: Uuid, patch: Document) -> Result<Option<Document>, StoreError>;

    /// Returns false when no visible document had that id.
    async fn delete(&self, collection: &Collection, id: Uuid) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError>;
}

/// Remove store-managed keys from caller-supplied content.
pub(crate) fn strip_managed(mut doc: Document) -> Document {
    doc.remove(ID_FIELD);
    doc.remove(VERSION_FIELD);
    doc
}

/// Value shown in duplicate-key messages.
pub(crate) fn display_value(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.clone(),
        Some(other) => other.to_string(),
        None => String::new(),
    }
}
