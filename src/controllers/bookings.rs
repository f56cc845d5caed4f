use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::post,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::error::ApiResult;
use crate::extract::ApiJson;
use crate::models::Seat;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/assisted", post(create_assisted_booking))
}

#[derive(Debug, Serialize)]
struct BookingResponse {
    success: bool,
    bookings: Vec<Seat>,
}

// POST /api/bookings
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateBookingRequest {
    seat_numbers: Vec<i32>,
}

async fn create_booking(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<CreateBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    let bookings = state.booking.book(&req.seat_numbers).await?;
    Ok((StatusCode::OK, Json(BookingResponse { success: true, bookings })))
}

// POST /api/bookings/assisted
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssistedBookingRequest {
    seat_count: usize,
}

async fn create_assisted_booking(
    State(state): State<Arc<AppState>>,
    ApiJson(req): ApiJson<AssistedBookingRequest>,
) -> ApiResult<impl IntoResponse> {
    let bookings = state.booking.book_assisted(req.seat_count).await?;
    Ok((StatusCode::OK, Json(BookingResponse { success: true, bookings })))
}
