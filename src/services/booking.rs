//! booking.rs
//!
//! Сервисный слой над `SeatStore`: снимок мест, транзакция бронирования,
//! сброс и первичное заполнение.
//!
//! Каждый вызов хранилища ограничен дедлайном. По истечении дедлайна будущее
//! хранилища дропается: незакоммиченная транзакция откатывается, частичной
//! мутации не остаётся, а вызывающий получает `StoreUnavailable`.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{info, instrument, warn};

use super::planner::{self, SeatRequest, MAX_SEATS_PER_BOOKING};
use crate::error::BookingError;
use crate::models::Seat;
use crate::store::SeatStore;

#[derive(Clone)]
pub struct BookingService {
    store: Arc<dyn SeatStore>,
    capacity: i32,
    deadline: Duration,
}

impl BookingService {
    pub fn new(store: Arc<dyn SeatStore>, capacity: i32, deadline: Duration) -> Self {
        Self {
            store,
            capacity,
            deadline,
        }
    }

    /// Тот же сервис, но со своим дедлайном для вызовов хранилища.
    pub fn with_deadline(&self, deadline: Duration) -> Self {
        Self {
            deadline,
            ..self.clone()
        }
    }

    async fn within_deadline<T, F>(&self, op: &'static str, fut: F) -> Result<T, BookingError>
    where
        F: Future<Output = Result<T, BookingError>>,
    {
        match tokio::time::timeout(self.deadline, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!("{} exceeded deadline of {:?}", op, self.deadline);
                Err(BookingError::StoreUnavailable(format!(
                    "{} timed out after {} ms",
                    op,
                    self.deadline.as_millis()
                )))
            }
        }
    }

    /// Создаёт места 1..=capacity, если их ещё нет. Повторный вызов ничего не делает.
    #[instrument(skip(self))]
    pub async fn ensure_seeded(&self) -> Result<u64, BookingError> {
        let created = self
            .within_deadline("populate", self.store.bulk_create_if_empty(self.capacity))
            .await?;
        if created > 0 {
            info!("Created {} initial seats", created);
        }
        Ok(created)
    }

    /// Снимок всех мест по возрастанию id.
    #[instrument(skip(self))]
    pub async fn availability(&self) -> Result<Vec<Seat>, BookingError> {
        self.within_deadline("list_seats", self.store.list_seats())
            .await
    }

    /// Подбор мест без бронирования.
    #[instrument(skip(self))]
    pub async fn plan(&self, request: &SeatRequest) -> Result<Vec<i32>, BookingError> {
        // Некорректное количество отсекаем до похода в хранилище.
        if let SeatRequest::Assisted { seat_count } = request {
            planner::check_seat_count(*seat_count)?;
        }
        let snapshot = self.availability().await?;
        planner::plan(&snapshot, request)
    }

    /// Транзакция бронирования: все места или ни одного.
    #[instrument(skip(self))]
    pub async fn book(&self, seat_ids: &[i32]) -> Result<Vec<Seat>, BookingError> {
        self.validate_ids(seat_ids)?;

        let booked = self
            .within_deadline("commit_booking", self.store.commit_booking(seat_ids))
            .await?;

        info!("Booked seats {:?}", seat_ids);
        Ok(booked)
    }

    /// Снимок -> подбор -> коммит. При `SeatConflict` повтор остаётся за вызывающим.
    #[instrument(skip(self))]
    pub async fn book_assisted(&self, seat_count: usize) -> Result<Vec<Seat>, BookingError> {
        let seat_ids = self.plan(&SeatRequest::Assisted { seat_count }).await?;
        self.book(&seat_ids).await
    }

    /// Освобождает все места. Административная операция.
    #[instrument(skip(self))]
    pub async fn reset(&self) -> Result<Vec<Seat>, BookingError> {
        self.within_deadline("reset_all", self.store.reset_all()).await
    }

    fn validate_ids(&self, seat_ids: &[i32]) -> Result<(), BookingError> {
        if seat_ids.is_empty() {
            return Err(BookingError::InvalidInput("no seats requested".to_string()));
        }
        if seat_ids.len() > MAX_SEATS_PER_BOOKING {
            return Err(BookingError::InvalidInput(format!(
                "at most {} seats per booking, got {}",
                MAX_SEATS_PER_BOOKING,
                seat_ids.len()
            )));
        }
        for (i, id) in seat_ids.iter().enumerate() {
            if *id < 1 || *id > self.capacity {
                return Err(BookingError::InvalidInput(format!(
                    "seat {} is outside 1..={}",
                    id, self.capacity
                )));
            }
            if seat_ids[..i].contains(id) {
                return Err(BookingError::InvalidInput(format!("seat {} requested twice", id)));
            }
        }
        Ok(())
    }
}
