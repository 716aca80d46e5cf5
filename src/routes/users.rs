//! User routes, mounted under `/api/v1/users`.

use crate::handlers::users::{get_user, list_users, route_not_defined};
use crate::middleware::not_found_fallback;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn user_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_users).post(route_not_defined).fallback(not_found_fallback))
        .route(
            "/:id",
            get(get_user)
                .patch(route_not_defined)
                .delete(route_not_defined)
                .fallback(not_found_fallback),
        )
        .with_state(state)
}
