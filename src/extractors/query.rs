//! Query string into [`RawParams`], keeping bracketed keys such as `price[gte]`.

use crate::error::AppError;
use crate::query::RawParams;
use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Query},
    http::request::Parts,
};

#[async_trait]
impl<S> FromRequestParts<S> for RawParams
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &S) -> Result<Self, Self::Rejection> {
        let Query(pairs) = Query::<Vec<(String, String)>>::from_request_parts(parts, state).await?;
        Ok(RawParams::from_pairs(pairs))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::query::ParamValue;
    use axum::http::Request;

    async fn extract(uri: &str) -> RawParams {
        let (mut parts, _) = Request::builder().uri(uri).body(()).unwrap().into_parts();
        RawParams::from_request_parts(&mut parts, &()).await.unwrap()
    }

    #[tokio::test]
    async fn decodes_bracketed_keys() {
        let params = extract("/tours?price%5Bgte%5D=500&difficulty=easy&sort=-price,ratingsAverage").await;
        assert_eq!(params.scalar("difficulty"), Some("easy"));
        assert_eq!(params.scalar("sort"), Some("-price,ratingsAverage"));
        match params.get("price") {
            Some(ParamValue::Nested(ops)) => assert_eq!(ops.get("gte").and_then(ParamValue::as_scalar), Some("500")),
            other => panic!("expected nested price, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn empty_query_is_empty() {
        assert!(extract("/tours").await.is_empty());
    }
}
