//! Instant the request was received.

use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};
use chrono::{DateTime, SecondsFormat, Utc};

/// Set by `stamp_request_time`; falls back to the extraction instant when the middleware is absent.
#[derive(Clone, Copy, Debug)]
pub struct RequestTime(pub DateTime<Utc>);

impl RequestTime {
    pub fn to_rfc3339(&self) -> String {
        self.0.to_rfc3339_opts(SecondsFormat::Millis, true)
    }
}

#[async_trait]
impl<S> FromRequestParts<S> for RequestTime
where
    S: Send + Sync,
{
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        Ok(parts
            .extensions
            .get::<RequestTime>()
            .copied()
            .unwrap_or_else(|| RequestTime(Utc::now())))
    }
}
