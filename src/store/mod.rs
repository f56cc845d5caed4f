//! Хранилище мест: единственный разделяемый изменяемый ресурс.
//!
//! Любая мутация `is_booked` идёт только через `commit_booking` (false -> true)
//! или `reset_all` (true -> false). Реализации обязаны выполнять проверку и
//! запись под одной блокировкой/транзакцией.

pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::error::BookingError;
use crate::models::Seat;

pub use memory::MemorySeatStore;
pub use postgres::PgSeatStore;

#[async_trait]
pub trait SeatStore: Send + Sync {
    /// Все места по возрастанию id, согласованный снимок.
    async fn list_seats(&self) -> Result<Vec<Seat>, BookingError>;

    /// Создаёт места 1..=count, если хранилище пустое. Возвращает число созданных.
    async fn bulk_create_if_empty(&self, count: i32) -> Result<u64, BookingError>;

    /// Атомарно: либо все `seat_ids` становятся занятыми, либо ничего не меняется
    /// и возвращается `SeatConflict` со списком уже занятых мест.
    async fn commit_booking(&self, seat_ids: &[i32]) -> Result<Vec<Seat>, BookingError>;

    /// Освобождает все места и возвращает свежий снимок.
    async fn reset_all(&self) -> Result<Vec<Seat>, BookingError>;

    /// Полная пересборка: удалить всё и создать 1..=count свободными.
    async fn reseed(&self, count: i32) -> Result<(), BookingError>;
}

/// Разбирает результат чтения запрошенных мест: неизвестные id -> `InvalidInput`,
/// занятые -> `SeatConflict`.
pub(crate) fn check_locked_seats(requested: &[i32], locked: &[Seat]) -> Result<(), BookingError> {
    let missing: Vec<i32> = requested
        .iter()
        .copied()
        .filter(|id| !locked.iter().any(|seat| seat.id == *id))
        .collect();
    if !missing.is_empty() {
        return Err(BookingError::InvalidInput(format!(
            "unknown seats {:?}",
            missing
        )));
    }

    let mut conflicts: Vec<i32> = locked
        .iter()
        .filter(|seat| seat.is_booked)
        .map(|seat| seat.id)
        .collect();
    if !conflicts.is_empty() {
        conflicts.sort_unstable();
        return Err(BookingError::SeatConflict { seat_ids: conflicts });
    }

    Ok(())
}
