use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::extract::{ApiJson, ApiQuery};
use crate::models::Seat;
use crate::services::planner::SeatRequest;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/seats", get(get_seats))
        .route("/seats/plan", get(plan_seats).post(plan_selection))
        .route("/seats/reset", post(reset_seats))
}

// GET /api/seats
async fn get_seats(State(state): State<Arc<AppState>>) -> ApiResult<Json<Vec<Seat>>> {
    let seats = state.booking.availability().await?;
    tracing::debug!("Found {} seats", seats.len());
    Ok(Json(seats))
}

/* ---------- PLAN ---------- */

#[derive(Debug, Deserialize)]
struct PlanQuery {
    count: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct PlanResponse {
    seat_numbers: Vec<i32>,
}

// GET /api/seats/plan?count=3 - подсказка для автовыбора, ничего не бронирует
async fn plan_seats(
    State(state): State<Arc<AppState>>,
    ApiQuery(params): ApiQuery<PlanQuery>,
) -> ApiResult<Json<PlanResponse>> {
    let seat_numbers = state
        .booking
        .plan(&SeatRequest::Assisted { seat_count: params.count })
        .await?;
    Ok(Json(PlanResponse { seat_numbers }))
}

// POST /api/seats/plan {"mode": "manual", "seatNumbers": [..]} | {"mode": "assisted", "seatCount": n}
async fn plan_selection(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<SeatRequest>,
) -> ApiResult<Json<PlanResponse>> {
    let seat_numbers = state.booking.plan(&req).await?;
    Ok(Json(PlanResponse { seat_numbers }))
}

/* ---------- RESET ---------- */

#[derive(Debug, Serialize)]
struct ResetResponse {
    success: bool,
    message: &'static str,
    seats: Vec<Seat>,
}

// POST /api/seats/reset
async fn reset_seats(State(state): State<Arc<AppState>>) -> ApiResult<impl IntoResponse> {
    let seats = state.booking.reset().await?;
    Ok((
        StatusCode::OK,
        Json(ResetResponse {
            success: true,
            message: "All seats have been reset to available",
            seats,
        }),
    ))
}
