use async_trait::async_trait;
use tracing::{debug, info, warn};

use super::{check_locked_seats, SeatStore};
use crate::database::Database;
use crate::error::BookingError;
use crate::models::Seat;

/// Места в Postgres. Сериализация пересекающихся бронирований держится на
/// `SELECT ... FOR UPDATE` в порядке id внутри одной транзакции.
#[derive(Clone)]
pub struct PgSeatStore {
    db: Database,
}

impl PgSeatStore {
    pub fn new(db: Database) -> Self {
        Self { db }
    }
}

#[async_trait]
impl SeatStore for PgSeatStore {
    async fn list_seats(&self) -> Result<Vec<Seat>, BookingError> {
        let seats = sqlx::query_as::<_, Seat>("SELECT id, is_booked FROM seats ORDER BY id")
            .fetch_all(&self.db.pool)
            .await?;
        Ok(seats)
    }

    async fn bulk_create_if_empty(&self, count: i32) -> Result<u64, BookingError> {
        // Пустая таблица проверяется в том же выражении; ON CONFLICT страхует
        // от параллельного bootstrap'а.
        let created = sqlx::query(
            r#"
            INSERT INTO seats (id, is_booked)
            SELECT g, FALSE
            FROM generate_series(1, $1) AS g
            WHERE NOT EXISTS (SELECT 1 FROM seats)
            ON CONFLICT (id) DO NOTHING
            "#,
        )
        .bind(count)
        .execute(&self.db.pool)
        .await?
        .rows_affected();

        if created > 0 {
            info!("Populated {} seats", created);
        } else {
            debug!("Seats already populated, skipping");
        }
        Ok(created)
    }

    async fn commit_booking(&self, seat_ids: &[i32]) -> Result<Vec<Seat>, BookingError> {
        let mut tx = self.db.pool.begin().await?;

        // Блокируем строки в порядке id, чтобы две брони с общими местами не
        // взаимоблокировались.
        let locked = sqlx::query_as::<_, Seat>(
            "SELECT id, is_booked FROM seats WHERE id = ANY($1) ORDER BY id FOR UPDATE",
        )
        .bind(seat_ids)
        .fetch_all(&mut *tx)
        .await?;

        if let Err(e) = check_locked_seats(seat_ids, &locked) {
            tx.rollback().await?;
            if let BookingError::SeatConflict { seat_ids } = &e {
                warn!("Booking conflict on seats {:?}", seat_ids);
            }
            return Err(e);
        }

        let booked = sqlx::query_as::<_, Seat>(
            r#"
            UPDATE seats
            SET is_booked = TRUE
            WHERE id = ANY($1) AND is_booked = FALSE
            RETURNING id, is_booked
            "#,
        )
        .bind(seat_ids)
        .fetch_all(&mut *tx)
        .await?;

        // Под FOR UPDATE сюда не должны попадать, но частичный коммит недопустим.
        if booked.len() != seat_ids.len() {
            tx.rollback().await?;
            return Err(BookingError::StoreUnavailable(format!(
                "expected to book {} seats, updated {}",
                seat_ids.len(),
                booked.len()
            )));
        }

        tx.commit().await?;

        let mut booked = booked;
        booked.sort_by_key(|seat| seat.id);
        Ok(booked)
    }

    async fn reset_all(&self) -> Result<Vec<Seat>, BookingError> {
        let mut tx = self.db.pool.begin().await?;

        let freed = sqlx::query("UPDATE seats SET is_booked = FALSE WHERE is_booked = TRUE")
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let seats = sqlx::query_as::<_, Seat>("SELECT id, is_booked FROM seats ORDER BY id")
            .fetch_all(&mut *tx)
            .await?;

        tx.commit().await?;

        warn!("RESET: released {} seats", freed);
        Ok(seats)
    }

    async fn reseed(&self, count: i32) -> Result<(), BookingError> {
        let mut tx = self.db.pool.begin().await?;

        sqlx::query("DELETE FROM seats").execute(&mut *tx).await?;
        sqlx::query(
            "INSERT INTO seats (id, is_booked) SELECT g, FALSE FROM generate_series(1, $1) AS g",
        )
        .bind(count)
        .execute(&mut *tx)
        .await?;

        tx.commit().await?;
        info!("Seeded database with {} seats", count);
        Ok(())
    }
}
