//! Users: read-only listing and lookup, plus startup seeding.

use crate::error::{AppError, ConfigError};
use crate::intercept::capture;
use crate::query::{QuerySpec, RawParams};
use crate::service::tours::body_to_map;
use crate::store::{Collection, Document, DocumentStore, StoreError};
use serde_json::Value;
use std::path::Path;
use uuid::Uuid;

pub const USERS: Collection = Collection {
    name: "users",
    unique_fields: &["email"],
    hidden_fields: &[],
    secret_flag: None,
};

pub struct UserService;

impl UserService {
    pub async fn list(store: &dyn DocumentStore, params: &RawParams) -> Result<Vec<Document>, AppError> {
        let spec = QuerySpec::from_params(params);
        capture(store.find(&USERS, &spec)).await
    }

    pub async fn read(store: &dyn DocumentStore, id: Uuid) -> Result<Document, AppError> {
        let user = capture(store.find_by_id(&USERS, id))
            .await?
            .ok_or_else(|| AppError::not_found("Invalid ID"))?;
        Ok(USERS.present(user))
    }

    /// Insert seed users; ones whose email already exists are skipped. Returns the number inserted.
    pub async fn seed(store: &dyn DocumentStore, users: Vec<Value>) -> Result<usize, AppError> {
        let mut inserted = 0;
        for user in users {
            let doc = body_to_map(user)?;
            match store.insert(&USERS, doc).await {
                Ok(_) => inserted += 1,
                Err(StoreError::Duplicate { field, value }) => {
                    tracing::debug!(%field, %value, "seed user already present");
                }
                Err(e) => return Err(e.into()),
            }
        }
        tracing::info!(inserted, "users seeded");
        Ok(inserted)
    }
}

/// Read a JSON array of user documents.
pub fn load_seed_file(path: &Path) -> Result<Vec<Value>, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))?;
    serde_json::from_str(&raw).map_err(|e| ConfigError::Load(format!("{}: {}", path.display(), e)))
}
