//! Tour handlers: list, alias, reports and CRUD.

use super::parse_id;
use crate::error::AppError;
use crate::extractors::{PathSegment, RequestTime};
use crate::query::RawParams;
use crate::response::{created_one, no_content, success_many, success_one, Success};
use crate::service::{ReportService, TourService};
use crate::state::AppState;
use axum::{
    extract::{rejection::JsonRejection, State},
    http::StatusCode,
    Json,
};
use serde_json::Value;

type Reply = Result<(StatusCode, Json<Success>), AppError>;

pub async fn list_tours(State(state): State<AppState>, requested_at: RequestTime, params: RawParams) -> Reply {
    let tours = TourService::list(state.store.as_ref(), &params).await?;
    Ok(success_many("tours", tours, Some(requested_at)))
}

pub async fn top_cheap_tours(State(state): State<AppState>, requested_at: RequestTime, params: RawParams) -> Reply {
    let tours = TourService::top_cheap(state.store.as_ref(), &params).await?;
    Ok(success_many("tours", tours, Some(requested_at)))
}

pub async fn tour_stats(State(state): State<AppState>) -> Reply {
    let stats = ReportService::tour_stats(state.store.as_ref()).await?;
    Ok(success_one("stats", stats))
}

pub async fn monthly_plan(State(state): State<AppState>, PathSegment(year): PathSegment) -> Reply {
    let year: i32 = year
        .trim()
        .parse()
        .map_err(|_| AppError::bad_request(format!("Invalid year: {}", year)))?;
    let plan = ReportService::monthly_plan(state.store.as_ref(), year).await?;
    Ok(success_one("plan", plan))
}

pub async fn get_tour(State(state): State<AppState>, PathSegment(id): PathSegment) -> Reply {
    let tour = TourService::read(state.store.as_ref(), parse_id(&id)?).await?;
    Ok(success_one("tour", tour))
}

pub async fn create_tour(State(state): State<AppState>, payload: Result<Json<Value>, JsonRejection>) -> Reply {
    let Json(body) = payload?;
    let tour = TourService::create(state.store.as_ref(), body).await?;
    Ok(created_one("tour", tour))
}

pub async fn update_tour(
    State(state): State<AppState>,
    PathSegment(id): PathSegment,
    payload: Result<Json<Value>, JsonRejection>,
) -> Reply {
    let id = parse_id(&id)?;
    let Json(body) = payload?;
    let tour = TourService::update(state.store.as_ref(), id, body).await?;
    Ok(success_one("tour", tour))
}

pub async fn delete_tour(State(state): State<AppState>, PathSegment(id): PathSegment) -> Result<StatusCode, AppError> {
    TourService::delete(state.store.as_ref(), parse_id(&id)?).await?;
    Ok(no_content())
}
