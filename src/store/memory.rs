//! In-memory document store for tests and local development.

use crate::query::QuerySpec;
use crate::store::matching::{check_filter, compare_docs, matches};
use crate::store::{
    display_value, strip_managed, Collection, Document, DocumentStore, StoreError, ID_FIELD, VERSION_FIELD,
};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use uuid::Uuid;

/// Documents per collection, kept in insertion order.
#[derive(Clone, Default)]
pub struct InMemoryDocumentStore {
    collections: Arc<RwLock<HashMap<&'static str, Vec<Document>>>>,
}

impl InMemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, HashMap<&'static str, Vec<Document>>>, StoreError> {
        self.collections
            .read()
            .map_err(|e| StoreError::Unavailable(format!("failed to acquire read lock: {}", e)))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, HashMap<&'static str, Vec<Document>>>, StoreError> {
        self.collections
            .write()
            .map_err(|e| StoreError::Unavailable(format!("failed to acquire write lock: {}", e)))
    }
}

fn has_id(doc: &Document, id: &str) -> bool {
    doc.get(ID_FIELD).and_then(Value::as_str) == Some(id)
}

fn check_unique(
    collection: &Collection,
    docs: &[Document],
    candidate: &Document,
    skip_id: Option<&str>,
) -> Result<(), StoreError> {
    for field in collection.unique_fields {
        let Some(value) = candidate.get(*field) else {
            continue;
        };
        let clash = docs
            .iter()
            .filter(|d| skip_id.map_or(true, |id| !has_id(d, id)))
            .any(|d| d.get(*field) == Some(value));
        if clash {
            return Err(StoreError::Duplicate {
                field: field.to_string(),
                value: display_value(Some(value)),
            });
        }
    }
    Ok(())
}

fn to_usize(n: u64) -> usize {
    usize::try_from(n).unwrap_or(usize::MAX)
}

#[async_trait]
impl DocumentStore for InMemoryDocumentStore {
    async fn find(&self, collection: &Collection, spec: &QuerySpec) -> Result<Vec<Document>, StoreError> {
        check_filter(&spec.filter)?;
        let mut hits = Vec::new();
        {
            let guard = self.read()?;
            for doc in guard.get(collection.name).into_iter().flatten() {
                if !collection.is_secret(doc) && matches(doc, &spec.filter)? {
                    hits.push(doc.clone());
                }
            }
        }
        hits.sort_by(|a, b| compare_docs(a, b, &spec.sort));
        let exclusions = collection.default_exclusions();
        Ok(hits
            .into_iter()
            .skip(to_usize(spec.pagination.skip))
            .take(to_usize(spec.pagination.limit))
            .map(|doc| spec.project(doc, ID_FIELD, &exclusions))
            .collect())
    }

    async fn scan(&self, collection: &Collection) -> Result<Vec<Document>, StoreError> {
        let guard = self.read()?;
        Ok(guard
            .get(collection.name)
            .into_iter()
            .flatten()
            .filter(|doc| !collection.is_secret(doc))
            .cloned()
            .collect())
    }

    async fn find_by_id(&self, collection: &Collection, id: Uuid) -> Result<Option<Document>, StoreError> {
        let id = id.to_string();
        let guard = self.read()?;
        Ok(guard
            .get(collection.name)
            .into_iter()
            .flatten()
            .find(|doc| has_id(doc, &id) && !collection.is_secret(doc))
            .cloned())
    }

    async fn insert(&self, collection: &Collection, doc: Document) -> Result<Document, StoreError> {
        let mut doc = strip_managed(doc);
        let mut guard = self.write()?;
        let docs = guard.entry(collection.name).or_default();
        check_unique(collection, docs, &doc, None)?;
        doc.insert(ID_FIELD.into(), Value::String(Uuid::new_v4().to_string()));
        doc.insert(VERSION_FIELD.into(), Value::from(0));
        docs.push(doc.clone());
        Ok(doc)
    }

    async fn update(&self, collection: &Collection, id: Uuid, patch: Document) -> Result<Option<Document>, StoreError> {
        let id = id.to_string();
        let patch = strip_managed(patch);
        let mut guard = self.write()?;
        let docs = guard.entry(collection.name).or_default();
        let Some(pos) = docs.iter().position(|d| has_id(d, &id) && !collection.is_secret(d)) else {
            return Ok(None);
        };
        let mut merged = docs[pos].clone();
        merged.extend(patch);
        check_unique(collection, docs, &merged, Some(&id))?;
        let version = merged.get(VERSION_FIELD).and_then(Value::as_i64).unwrap_or(0);
        merged.insert(VERSION_FIELD.into(), Value::from(version + 1));
        docs[pos] = merged.clone();
        Ok(Some(merged))
    }

    async fn delete(&self, collection: &Collection, id: Uuid) -> Result<bool, StoreError> {
        let id = id.to_string();
        let mut guard = self.write()?;
        let docs = guard.entry(collection.name).or_default();
        match docs.iter().position(|d| has_id(d, &id) && !collection.is_secret(d)) {
            Some(pos) => {
                docs.remove(pos);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.read().map(|_| ())
    }
}
