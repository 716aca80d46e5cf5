//! Terminal error stage. Every error response passes through here exactly once and is rendered
//! for the configured environment.

use crate::config::Environment;
use crate::error::{AppError, ErrorBody, ErrorDetail, ErrorReport, StatusCategory};
use axum::{
    extract::{OriginalUri, Request, State},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};

/// Client-facing message for programming errors in production.
pub const GENERIC_MESSAGE: &str = "Something went very wrong!";

pub fn render(report: &ErrorReport, environment: Environment) -> Response {
    let body = match environment {
        Environment::Development => ErrorBody {
            status: report.status_category,
            message: report.message.clone(),
            error: Some(ErrorDetail {
                status_code: report.status_code,
                status: report.status_category,
                is_operational: report.is_operational,
            }),
            stack: Some(report.detail.clone()),
        },
        Environment::Production if report.is_operational => ErrorBody {
            status: report.status_category,
            message: report.message.clone(),
            error: None,
            stack: None,
        },
        Environment::Production => ErrorBody {
            status: StatusCategory::Error,
            message: GENERIC_MESSAGE.to_string(),
            error: None,
            stack: None,
        },
    };
    (report.status(), Json(body)).into_response()
}

/// Outermost layer: re-renders any response that carries an [`ErrorReport`].
pub async fn respond_to_errors(State(environment): State<Environment>, request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let mut response = next.run(request).await;
    let Some(report) = response.extensions_mut().remove::<ErrorReport>() else {
        return response;
    };
    if report.is_operational {
        tracing::warn!(%method, %path, status = report.status_code, message = %report.message, "request failed");
    } else {
        tracing::error!(%method, %path, status = report.status_code, detail = %report.detail, "unexpected error");
    }
    render(&report, environment)
}

/// Fallback for paths and methods no route matches.
pub async fn not_found_fallback(OriginalUri(uri): OriginalUri) -> AppError {
    AppError::not_found(format!("Can't find {} on this server!", uri))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::{to_bytes, Body};
    use axum::http::{Request as HttpRequest, StatusCode};
    use axum::{middleware, routing::get, Router};
    use serde_json::Value;
    use tower::ServiceExt;

    async fn body_json(response: Response) -> Value {
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    fn router(environment: Environment) -> Router {
        Router::new()
            .route("/missing", get(|| async { AppError::not_found("No tour found with that ID") }))
            .route("/broken", get(|| async { AppError::Internal("index out of range".into()) }))
            .route("/ok", get(|| async { "fine" }))
            .fallback(not_found_fallback)
            .layer(middleware::from_fn_with_state(environment, respond_to_errors))
    }

    async fn call(environment: Environment, uri: &str) -> Response {
        router(environment)
            .oneshot(HttpRequest::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap()
    }

    #[tokio::test]
    async fn development_exposes_details() {
        let response = call(Environment::Development, "/missing").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "No tour found with that ID");
        assert_eq!(body["error"]["statusCode"], 404);
        assert_eq!(body["error"]["isOperational"], true);
        assert!(body["stack"].as_str().unwrap().contains("Operational"));
    }

    #[tokio::test]
    async fn production_hides_programming_errors() {
        let response = call(Environment::Production, "/broken").await;
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body = body_json(response).await;
        assert_eq!(body, serde_json::json!({"status": "error", "message": GENERIC_MESSAGE}));
    }

    #[tokio::test]
    async fn production_shows_operational_message_only() {
        let body = body_json(call(Environment::Production, "/missing").await).await;
        assert_eq!(body, serde_json::json!({"status": "fail", "message": "No tour found with that ID"}));
    }

    #[tokio::test]
    async fn unmatched_path_names_the_path() {
        let response = call(Environment::Production, "/api/v1/nothing?x=1").await;
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body = body_json(response).await;
        assert_eq!(body["message"], "Can't find /api/v1/nothing?x=1 on this server!");
    }

    #[tokio::test]
    async fn success_is_untouched() {
        let response = call(Environment::Production, "/ok").await;
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.extensions().get::<ErrorReport>().is_none());
    }
}
