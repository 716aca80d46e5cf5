//! User handlers. Only reads are available; writes answer "not yet defined".

use super::parse_id;
use crate::error::AppError;
use crate::extractors::{PathSegment, RequestTime};
use crate::query::RawParams;
use crate::response::{success_many, success_one, Success};
use crate::service::UserService;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    Json,
};

pub async fn list_users(
    State(state): State<AppState>,
    requested_at: RequestTime,
    params: RawParams,
) -> Result<(StatusCode, Json<Success>), AppError> {
    let users = UserService::list(state.store.as_ref(), &params).await?;
    Ok(success_many("users", users, Some(requested_at)))
}

pub async fn get_user(
    State(state): State<AppState>,
    PathSegment(id): PathSegment,
) -> Result<(StatusCode, Json<Success>), AppError> {
    let user = UserService::read(state.store.as_ref(), parse_id(&id)?).await?;
    Ok(success_one("user", user))
}

pub async fn route_not_defined() -> AppError {
    AppError::not_implemented()
}
