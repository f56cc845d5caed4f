//! Сквозные сценарии сервиса бронирования поверх in-memory хранилища.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::future::join_all;
use train_booking::error::BookingError;
use train_booking::models::Seat;
use train_booking::services::BookingService;
use train_booking::store::{MemorySeatStore, SeatStore};

const CAPACITY: i32 = 80;

fn service_over(store: MemorySeatStore) -> BookingService {
    BookingService::new(Arc::new(store), CAPACITY, Duration::from_secs(2))
}

fn booked_ids(seats: &[Seat]) -> Vec<i32> {
    seats.iter().filter(|s| s.is_booked).map(|s| s.id).collect()
}

#[tokio::test]
async fn population_is_idempotent() {
    let store = MemorySeatStore::new();
    let service = service_over(store.clone());

    assert_eq!(service.ensure_seeded().await.unwrap(), 80);
    assert_eq!(service.ensure_seeded().await.unwrap(), 0);

    service.book(&[10]).await.unwrap();
    assert_eq!(service.ensure_seeded().await.unwrap(), 0);

    let seats = service.availability().await.unwrap();
    assert_eq!(seats.len(), 80);
    assert_eq!(seats.iter().map(|s| s.id).collect::<Vec<_>>(), (1..=80).collect::<Vec<_>>());
    assert_eq!(booked_ids(&seats), vec![10]);
}

#[tokio::test]
async fn concurrent_population_creates_each_seat_once() {
    let store = MemorySeatStore::new();
    let service = service_over(store);

    let results = join_all((0..8).map(|_| {
        let service = service.clone();
        async move { service.ensure_seeded().await }
    }))
    .await;

    let created: u64 = results.into_iter().map(Result::unwrap).sum();
    assert_eq!(created, 80);
    assert_eq!(service.availability().await.unwrap().len(), 80);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn only_one_of_two_racing_bookings_wins_seat_42() {
    let service = service_over(MemorySeatStore::with_capacity(CAPACITY));

    let a = tokio::spawn({
        let service = service.clone();
        async move { service.book(&[41, 42]).await }
    });
    let b = tokio::spawn({
        let service = service.clone();
        async move { service.book(&[42, 43]).await }
    });
    let results = [a.await.unwrap(), b.await.unwrap()];

    let wins = results.iter().filter(|r| r.is_ok()).count();
    assert_eq!(wins, 1);
    let loser = results.iter().find_map(|r| r.as_ref().err()).unwrap();
    assert_eq!(loser, &BookingError::SeatConflict { seat_ids: vec![42] });

    let booked = booked_ids(&service.availability().await.unwrap());
    assert!(booked == vec![41, 42] || booked == vec![42, 43], "booked {:?}", booked);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_overlapping_bookings_never_double_book() {
    let service = service_over(MemorySeatStore::with_capacity(CAPACITY));

    // 40 запросов на пары соседних мест, каждая пара пересекается с соседними
    let handles: Vec<_> = (1..=40)
        .map(|start| {
            let service = service.clone();
            tokio::spawn(async move { service.book(&[start, start + 1]).await })
        })
        .collect();

    let mut claimed = Vec::new();
    for handle in handles {
        match handle.await.unwrap() {
            Ok(seats) => claimed.extend(seats.into_iter().map(|s| s.id)),
            Err(BookingError::SeatConflict { seat_ids }) => assert!(!seat_ids.is_empty()),
            Err(other) => panic!("unexpected error {:?}", other),
        }
    }

    let mut deduped = claimed.clone();
    deduped.sort_unstable();
    deduped.dedup();
    assert_eq!(deduped.len(), claimed.len(), "a seat was handed out twice");
    assert_eq!(booked_ids(&service.availability().await.unwrap()), deduped);
}

#[tokio::test]
async fn conflict_reports_all_taken_seats_and_books_nothing() {
    let service = service_over(MemorySeatStore::with_capacity(CAPACITY));
    service.book(&[5, 7]).await.unwrap();

    let err = service.book(&[7, 6, 5]).await.unwrap_err();
    assert_eq!(err, BookingError::SeatConflict { seat_ids: vec![5, 7] });
    assert!(err.is_retryable());
    assert_eq!(booked_ids(&service.availability().await.unwrap()), vec![5, 7]);
}

#[tokio::test]
async fn stale_plan_is_caught_at_commit() {
    let service = service_over(MemorySeatStore::with_capacity(CAPACITY));

    let planned = service
        .plan(&train_booking::services::planner::SeatRequest::Assisted { seat_count: 3 })
        .await
        .unwrap();
    assert_eq!(planned, vec![1, 2, 3]);

    // кто-то успел раньше
    service.book(&[2]).await.unwrap();

    assert_eq!(
        service.book(&planned).await,
        Err(BookingError::SeatConflict { seat_ids: vec![2] })
    );

    // перепланирование по свежему снимку
    let replanned = service.book_assisted(3).await.unwrap();
    assert_eq!(replanned.iter().map(|s| s.id).collect::<Vec<_>>(), vec![1, 3, 4]);
}

#[tokio::test]
async fn reset_frees_everything() {
    let service = service_over(MemorySeatStore::with_capacity(CAPACITY));
    service.book(&[1, 2, 3]).await.unwrap();

    let after_reset = service.reset().await.unwrap();
    assert_eq!(after_reset.len(), 80);
    assert!(after_reset.iter().all(Seat::is_free));

    let seats = service.availability().await.unwrap();
    assert!(seats.iter().all(Seat::is_free));

    // повторный сброс ничего не ломает
    assert_eq!(service.reset().await.unwrap(), seats);
}

#[tokio::test]
async fn insufficient_seats_mutates_nothing() {
    let service = service_over(MemorySeatStore::with_capacity(CAPACITY));
    // оставляем свободными только 78, 79, 80
    for start in (1..=77).step_by(7) {
        let ids: Vec<i32> = (start..start + 7).collect();
        service.book(&ids).await.unwrap();
    }

    let before = service.availability().await.unwrap();
    assert_eq!(
        service.book_assisted(5).await,
        Err(BookingError::InsufficientSeats { requested: 5, available: 3 })
    );
    assert_eq!(service.availability().await.unwrap(), before);
}

#[tokio::test]
async fn out_of_range_count_never_reaches_the_store() {
    let service = BookingService::new(Arc::new(UnreachableStore), CAPACITY, Duration::from_secs(1));

    for count in [0, 8] {
        assert_eq!(
            service.book_assisted(count).await,
            Err(BookingError::InvalidSeatCount { requested: count, max: 7 })
        );
    }
}

#[tokio::test]
async fn slow_store_hits_the_deadline_without_committing() {
    let inner = MemorySeatStore::with_capacity(CAPACITY);
    let slow = SlowStore {
        inner: inner.clone(),
        delay: Duration::from_millis(200),
    };
    let service = BookingService::new(Arc::new(slow), CAPACITY, Duration::from_secs(5))
        .with_deadline(Duration::from_millis(20));

    let err = service.book(&[1, 2]).await.unwrap_err();
    assert!(matches!(err, BookingError::StoreUnavailable(_)));
    assert!(matches!(
        service.availability().await,
        Err(BookingError::StoreUnavailable(_))
    ));

    // коммит происходит только после задержки, а будущее уже дропнуто
    tokio::time::sleep(Duration::from_millis(250)).await;
    assert!(inner.list_seats().await.unwrap().iter().all(Seat::is_free));
}

/// Хранилище, которое задерживает каждую операцию перед тем, как её выполнить.
struct SlowStore {
    inner: MemorySeatStore,
    delay: Duration,
}

#[async_trait]
impl SeatStore for SlowStore {
    async fn list_seats(&self) -> Result<Vec<Seat>, BookingError> {
        tokio::time::sleep(self.delay).await;
        self.inner.list_seats().await
    }

    async fn bulk_create_if_empty(&self, count: i32) -> Result<u64, BookingError> {
        tokio::time::sleep(self.delay).await;
        self.inner.bulk_create_if_empty(count).await
    }

    async fn commit_booking(&self, seat_ids: &[i32]) -> Result<Vec<Seat>, BookingError> {
        tokio::time::sleep(self.delay).await;
        self.inner.commit_booking(seat_ids).await
    }

    async fn reset_all(&self) -> Result<Vec<Seat>, BookingError> {
        tokio::time::sleep(self.delay).await;
        self.inner.reset_all().await
    }

    async fn reseed(&self, count: i32) -> Result<(), BookingError> {
        tokio::time::sleep(self.delay).await;
        self.inner.reseed(count).await
    }
}

/// Любое обращение - провал теста.
struct UnreachableStore;

#[async_trait]
impl SeatStore for UnreachableStore {
    async fn list_seats(&self) -> Result<Vec<Seat>, BookingError> {
        panic!("list_seats must not be called")
    }

    async fn bulk_create_if_empty(&self, _count: i32) -> Result<u64, BookingError> {
        panic!("bulk_create_if_empty must not be called")
    }

    async fn commit_booking(&self, _seat_ids: &[i32]) -> Result<Vec<Seat>, BookingError> {
        panic!("commit_booking must not be called")
    }

    async fn reset_all(&self) -> Result<Vec<Seat>, BookingError> {
        panic!("reset_all must not be called")
    }

    async fn reseed(&self, _count: i32) -> Result<(), BookingError> {
        panic!("reseed must not be called")
    }
}
