//! Captures failures of request-handling futures and hands them to the error stage.
//!
//! Handlers return `Result<_, AppError>` and propagate with `?`. Store calls additionally run
//! through [`capture`], which also turns a panic at any poll of the future into a programming
//! error. Panics elsewhere in a handler are caught router-wide by `CatchPanicLayer` with
//! [`panic_response`]. Either way the request gets exactly one error response.

use crate::error::AppError;
use axum::response::{IntoResponse, Response};
use futures::FutureExt;
use std::any::Any;
use std::future::Future;
use std::panic::AssertUnwindSafe;

/// Drive `fut` to completion; its error is converted once into [`AppError`], a panic becomes
/// [`AppError::Internal`]. Successful output passes through unchanged.
pub async fn capture<F, T, E>(fut: F) -> Result<T, AppError>
where
    F: Future<Output = Result<T, E>>,
    E: Into<AppError>,
{
    match AssertUnwindSafe(fut).catch_unwind().await {
        Ok(result) => result.map_err(Into::into),
        Err(payload) => {
            let message = panic_message(payload.as_ref());
            tracing::error!(panic = %message, "request future panicked");
            Err(AppError::Internal(message))
        }
    }
}

pub fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        s.to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "panic with non-string payload".to_string()
    }
}

/// Response for `tower_http::catch_panic::CatchPanicLayer::custom`.
pub fn panic_response(payload: Box<dyn Any + Send + 'static>) -> Response {
    let message = panic_message(payload.as_ref());
    tracing::error!(panic = %message, "handler panicked");
    AppError::Internal(message).into_response()
}
