use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::RwLock;
use tracing::{info, warn};

use super::{check_locked_seats, SeatStore};
use crate::error::BookingError;
use crate::models::Seat;

/// Места в памяти процесса.
///
/// Write-lock держится на всю последовательность "проверить и занять", так что
/// пересекающиеся брони видят друг друга в одном порядке. Годится для тестов и
/// для запуска без базы (`SEAT_STORE=memory`).
#[derive(Clone, Debug, Default)]
pub struct MemorySeatStore {
    seats: Arc<RwLock<BTreeMap<i32, bool>>>,
}

impl MemorySeatStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Хранилище, уже заполненное местами 1..=count.
    pub fn with_capacity(count: i32) -> Self {
        let seats = (1..=count).map(|id| (id, false)).collect();
        Self {
            seats: Arc::new(RwLock::new(seats)),
        }
    }

    fn snapshot(seats: &BTreeMap<i32, bool>) -> Vec<Seat> {
        seats
            .iter()
            .map(|(&id, &is_booked)| Seat { id, is_booked })
            .collect()
    }
}

#[async_trait]
impl SeatStore for MemorySeatStore {
    async fn list_seats(&self) -> Result<Vec<Seat>, BookingError> {
        let seats = self.seats.read().await;
        Ok(Self::snapshot(&seats))
    }

    async fn bulk_create_if_empty(&self, count: i32) -> Result<u64, BookingError> {
        let mut seats = self.seats.write().await;
        if !seats.is_empty() {
            return Ok(0);
        }
        seats.extend((1..=count).map(|id| (id, false)));
        info!("Populated {} seats", seats.len());
        Ok(seats.len() as u64)
    }

    async fn commit_booking(&self, seat_ids: &[i32]) -> Result<Vec<Seat>, BookingError> {
        let mut seats = self.seats.write().await;

        let locked: Vec<Seat> = seat_ids
            .iter()
            .filter_map(|id| seats.get(id).map(|&is_booked| Seat { id: *id, is_booked }))
            .collect();
        if let Err(e) = check_locked_seats(seat_ids, &locked) {
            if let BookingError::SeatConflict { seat_ids } = &e {
                warn!("Booking conflict on seats {:?}", seat_ids);
            }
            return Err(e);
        }

        let mut booked = Vec::with_capacity(seat_ids.len());
        for id in seat_ids {
            seats.insert(*id, true);
            booked.push(Seat { id: *id, is_booked: true });
        }
        booked.sort_by_key(|seat| seat.id);
        Ok(booked)
    }

    async fn reset_all(&self) -> Result<Vec<Seat>, BookingError> {
        let mut seats = self.seats.write().await;
        let mut freed = 0;
        for is_booked in seats.values_mut() {
            if *is_booked {
                *is_booked = false;
                freed += 1;
            }
        }
        warn!("RESET: released {} seats", freed);
        Ok(Self::snapshot(&seats))
    }

    async fn reseed(&self, count: i32) -> Result<(), BookingError> {
        let mut seats = self.seats.write().await;
        seats.clear();
        seats.extend((1..=count).map(|id| (id, false)));
        info!("Seeded store with {} seats", count);
        Ok(())
    }
}
