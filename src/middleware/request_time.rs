//! Stamps each request with the instant it was received.

use crate::extractors::RequestTime;
use axum::{extract::Request, middleware::Next, response::Response};
use chrono::Utc;

pub async fn stamp_request_time(mut request: Request, next: Next) -> Response {
    request.extensions_mut().insert(RequestTime(Utc::now()));
    next.run(request).await
}
