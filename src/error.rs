//! error.rs
//!
//! Таксономия ошибок бронирования и её отображение в HTTP-ответы.
//!
//! Ошибки валидации (`InvalidSeatCount`, `InvalidInput`, `InsufficientSeats`)
//! возникают до любой мутации. `SeatConflict` означает, что гонка проиграна на
//! этапе коммита: вызывающий перечитывает места и пробует снова. Ядро само
//! ничего не повторяет.

use axum::{
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BookingError {
    /// Запрошенное количество мест вне диапазона [1, max].
    #[error("You can book between 1 and {max} seats, requested {requested}")]
    InvalidSeatCount { requested: usize, max: usize },

    /// Пустой набор, дубликаты или id вне вагона.
    #[error("Invalid seat numbers: {0}")]
    InvalidInput(String),

    /// Свободных мест меньше, чем просили.
    #[error("Not enough free seats: requested {requested}, available {available}")]
    InsufficientSeats { requested: usize, available: usize },

    /// Ручной выбор указывает на места, уже занятые в снимке.
    #[error("Seats {} are already booked", join_ids(.seat_ids))]
    SeatAlreadyBooked { seat_ids: Vec<i32> },

    /// Транзакция бронирования увидела занятые места и откатилась целиком.
    #[error("Seats {} were booked by someone else", join_ids(.seat_ids))]
    SeatConflict { seat_ids: Vec<i32> },

    /// Хранилище недоступно или не уложилось в дедлайн.
    #[error("Seat store unavailable: {0}")]
    StoreUnavailable(String),
}

impl BookingError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            BookingError::InvalidSeatCount { .. } | BookingError::InvalidInput(_) => {
                StatusCode::BAD_REQUEST
            }
            BookingError::InsufficientSeats { .. } => StatusCode::UNPROCESSABLE_ENTITY,
            BookingError::SeatAlreadyBooked { .. } | BookingError::SeatConflict { .. } => {
                StatusCode::CONFLICT
            }
            BookingError::StoreUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Места, из-за которых запрос не прошёл (если применимо).
    pub fn seat_ids(&self) -> Option<&[i32]> {
        match self {
            BookingError::SeatAlreadyBooked { seat_ids }
            | BookingError::SeatConflict { seat_ids } => Some(seat_ids),
            _ => None,
        }
    }

    /// Стоит ли клиенту перечитать места и повторить.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self,
            BookingError::SeatConflict { .. } | BookingError::StoreUnavailable(_)
        )
    }
}

impl From<sqlx::Error> for BookingError {
    fn from(err: sqlx::Error) -> Self {
        BookingError::StoreUnavailable(err.to_string())
    }
}

impl From<JsonRejection> for BookingError {
    fn from(rejection: JsonRejection) -> Self {
        BookingError::InvalidInput(rejection.body_text())
    }
}

impl From<QueryRejection> for BookingError {
    fn from(rejection: QueryRejection) -> Self {
        BookingError::InvalidInput(rejection.body_text())
    }
}

fn join_ids(ids: &[i32]) -> String {
    ids.iter()
        .map(|id| id.to_string())
        .collect::<Vec<_>>()
        .join(", ")
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ApiError {
    success: bool,
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    seat_ids: Option<Vec<i32>>,
}

impl IntoResponse for BookingError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!("booking request failed: {}", self);
        }
        let body = ApiError {
            success: false,
            error: self.to_string(),
            seat_ids: self.seat_ids().map(<[i32]>::to_vec),
        };
        (status, Json(body)).into_response()
    }
}

pub type ApiResult<T> = Result<T, BookingError>;
