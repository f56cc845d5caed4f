//! Экстракторы, чьи отказы приходят в общем формате `ApiError` со статусом 400,
//! а не текстом от axum.

use axum::extract::{FromRequest, FromRequestParts};

use crate::error::BookingError;

#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(BookingError))]
pub struct ApiJson<T>(pub T);

#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Query), rejection(BookingError))]
pub struct ApiQuery<T>(pub T);
