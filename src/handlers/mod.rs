//! HTTP handlers for tours and users.

pub mod tours;
pub mod users;

use crate::error::AppError;
use uuid::Uuid;

/// Path id as a document id; anything that is not a UUID is a client error.
pub(crate) fn parse_id(id: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id).map_err(|_| AppError::bad_request(format!("Invalid id: {}", id)))
}
