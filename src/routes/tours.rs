//! Tour routes, mounted under `/api/v1/tours`.

use crate::handlers::tours::{
    create_tour, delete_tour, get_tour, list_tours, monthly_plan, top_cheap_tours, tour_stats, update_tour,
};
use crate::middleware::not_found_fallback;
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn tour_routes(state: AppState) -> Router {
    Router::new()
        .route("/", get(list_tours).post(create_tour).fallback(not_found_fallback))
        .route("/top-5-cheap", get(top_cheap_tours).fallback(not_found_fallback))
        .route("/tour-stats", get(tour_stats).fallback(not_found_fallback))
        .route("/monthly-plan/:year", get(monthly_plan).fallback(not_found_fallback))
        .route(
            "/:id",
            get(get_tour)
                .patch(update_tour)
                .delete(delete_tour)
                .fallback(not_found_fallback),
        )
        .with_state(state)
}
