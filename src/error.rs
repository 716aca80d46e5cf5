//! Typed errors, status classification and the report handed to the error responder.

use crate::config::Environment;
use crate::middleware::errors::render;
use crate::store::StoreError;
use axum::{
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value for {key}: '{value}'")]
    InvalidValue { key: &'static str, value: String },
    #[error("config load: {0}")]
    Load(String),
}

/// Coarse status derived from the HTTP status code: `fail` for client errors, `error` otherwise.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum StatusCategory {
    Fail,
    Error,
}

impl StatusCategory {
    pub fn from_status(status_code: u16) -> Self {
        if (400..500).contains(&status_code) {
            StatusCategory::Fail
        } else {
            StatusCategory::Error
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            StatusCategory::Fail => "fail",
            StatusCategory::Error => "error",
        }
    }
}

#[derive(Error, Debug)]
pub enum AppError {
    /// Raised on purpose by application logic. The message is safe to show to clients.
    #[error("{message}")]
    Operational { message: String, status_code: u16 },
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("store: {0}")]
    Store(#[source] StoreError),
    #[error("internal: {0}")]
    Internal(String),
}

impl AppError {
    /// The only constructor for operational errors.
    pub fn operational(message: impl Into<String>, status_code: u16) -> Self {
        AppError::Operational {
            message: message.into(),
            status_code,
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::operational(message, 404)
    }

    pub fn bad_request(message: impl Into<String>) -> Self {
        Self::operational(message, 400)
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::operational(message, 400)
    }

    pub fn not_implemented() -> Self {
        Self::operational("This route is not yet defined!", 500)
    }

    /// Status code of the response; anything that is not a valid HTTP status becomes 500.
    pub fn status_code(&self) -> u16 {
        match self {
            AppError::Operational { status_code, .. } if StatusCode::from_u16(*status_code).is_ok() => {
                *status_code
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR.as_u16(),
        }
    }

    pub fn status_category(&self) -> StatusCategory {
        StatusCategory::from_status(self.status_code())
    }

    pub fn is_operational(&self) -> bool {
        matches!(self, AppError::Operational { .. })
    }

    pub fn report(&self) -> ErrorReport {
        ErrorReport {
            message: self.to_string(),
            status_code: self.status_code(),
            status_category: self.status_category(),
            is_operational: self.is_operational(),
            detail: format!("{:?}", self),
        }
    }
}

impl From<StoreError> for AppError {
    fn from(e: StoreError) -> Self {
        match e {
            StoreError::Duplicate { field, value } => AppError::bad_request(format!(
                "Duplicate field value '{}' for {}. Please use another value!",
                value, field
            )),
            StoreError::UnsupportedOperator(op) => {
                AppError::bad_request(format!("Invalid filter operator: {}", op))
            }
            other => AppError::Store(other),
        }
    }
}

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        AppError::operational(rejection.body_text(), rejection.status().as_u16())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::operational(rejection.body_text(), rejection.status().as_u16())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        AppError::bad_request(rejection.body_text())
    }
}

/// Snapshot of an error that travels on the response until the error stage renders it.
#[derive(Clone, Debug)]
pub struct ErrorReport {
    pub message: String,
    pub status_code: u16,
    pub status_category: StatusCategory,
    pub is_operational: bool,
    pub detail: String,
}

impl ErrorReport {
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }
}

#[derive(Serialize)]
pub struct ErrorBody {
    pub status: StatusCategory,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<ErrorDetail>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stack: Option<String>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ErrorDetail {
    pub status_code: u16,
    pub status: StatusCategory,
    pub is_operational: bool,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let report = self.report();
        // Production shape until the error stage re-renders it for the configured environment.
        let mut response = render(&report, Environment::Production);
        response.extensions_mut().insert(report);
        response
    }
}
