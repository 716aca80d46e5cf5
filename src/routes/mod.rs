//! Route tables and the assembled application router.

mod common;
mod tours;
mod users;

pub use common::common_routes;
pub use tours::tour_routes;
pub use users::user_routes;

use crate::intercept::panic_response;
use crate::middleware::{not_found_fallback, respond_to_errors, stamp_request_time};
use crate::state::AppState;
use axum::{extract::DefaultBodyLimit, middleware, Router};
use tower_http::{catch_panic::CatchPanicLayer, trace::TraceLayer};

pub const API_PREFIX: &str = "/api/v1";

/// Full application: API routes, fallback, body limit, panic capture, and the error stage outermost.
pub fn app(state: AppState) -> Router {
    let environment = state.environment;
    let mut router = Router::new()
        .merge(common_routes(state.clone()))
        .nest(&format!("{}/tours", API_PREFIX), tour_routes(state.clone()))
        .nest(&format!("{}/users", API_PREFIX), user_routes(state.clone()))
        .fallback(not_found_fallback)
        .layer(middleware::from_fn(stamp_request_time))
        .layer(DefaultBodyLimit::max(state.body_limit_bytes))
        .layer(CatchPanicLayer::custom(panic_response));
    if !environment.is_production() {
        router = router.layer(TraceLayer::new_for_http());
    }
    router.layer(middleware::from_fn_with_state(environment, respond_to_errors))
}
