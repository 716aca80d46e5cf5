//! Success envelopes: `{status: "success", results?, requestedAt?, data: {<key>: ...}}`.

use crate::extractors::RequestTime;
use axum::{http::StatusCode, Json};
use serde::Serialize;
use serde_json::{Map, Value};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Success {
    pub status: &'static str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub results: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub requested_at: Option<String>,
    pub data: Map<String, Value>,
}

impl Success {
    fn keyed(key: &str, value: Value) -> Self {
        let mut data = Map::new();
        data.insert(key.to_string(), value);
        Success {
            status: "success",
            results: None,
            requested_at: None,
            data,
        }
    }
}

pub fn success_one(key: &str, value: impl Into<Value>) -> (StatusCode, Json<Success>) {
    (StatusCode::OK, Json(Success::keyed(key, value.into())))
}

pub fn created_one(key: &str, value: impl Into<Value>) -> (StatusCode, Json<Success>) {
    (StatusCode::CREATED, Json(Success::keyed(key, value.into())))
}

/// List envelope with a `results` count; `requested_at` is echoed when given.
pub fn success_many<T: Into<Value>>(
    key: &str,
    items: Vec<T>,
    requested_at: Option<RequestTime>,
) -> (StatusCode, Json<Success>) {
    let results = items.len();
    let items: Vec<Value> = items.into_iter().map(Into::into).collect();
    let mut body = Success::keyed(key, Value::Array(items));
    body.results = Some(results);
    body.requested_at = requested_at.map(|t| t.to_rfc3339());
    (StatusCode::OK, Json(body))
}

pub fn no_content() -> StatusCode {
    StatusCode::NO_CONTENT
}
