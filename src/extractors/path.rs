//! Single path parameter whose decoding failures go through [`AppError`].

use crate::error::AppError;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Path},
    http::request::Parts,
};

#[derive(Clone, Debug)]
pub struct PathSegment(pub String);

#[async_trait]
impl<S> FromRequestParts<S> for PathSegment
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Path(segment) = Path::<String>::from_request_parts(parts, state).await?;
        Ok(PathSegment(segment))
    }
}
