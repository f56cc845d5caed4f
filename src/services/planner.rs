//! planner.rs
//!
//! Подбор мест по снимку. Чистые функции: ничего не блокируют и не мутируют.
//!
//! Снимок носит рекомендательный характер: итоговую проверку делает транзакция
//! бронирования, поэтому гонка "спланировали по старому снимку" разрешается в
//! момент коммита, а не здесь.
//!
//! Assisted-режим:
//! 1. Ряд целиком: первый по порядку ряд, где свободных мест не меньше, чем
//!    нужно, отдаёт первые `count` свободных.
//! 2. Иначе по всем свободным местам ищется окно из `count` подряд идущих с
//!    минимальным разбросом id (последний - первый), при равенстве берётся
//!    самое раннее окно.
//! 3. Свободных меньше `count` -> `InsufficientSeats`.

use serde::{Deserialize, Serialize};

use crate::error::BookingError;
use crate::models::Seat;

/// Мест в ряду (последний ряд короче).
pub const ROW_WIDTH: i32 = 7;

/// Жёсткий лимит мест на одно бронирование.
pub const MAX_SEATS_PER_BOOKING: usize = 7;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "mode", rename_all = "lowercase", rename_all_fields = "camelCase")]
pub enum SeatRequest {
    /// Пользователь сам выбрал места.
    Manual { seat_numbers: Vec<i32> },
    /// Система подбирает `seat_count` мест рядом.
    Assisted { seat_count: usize },
}

/// Номер ряда (с нуля) для места.
pub fn row_of(seat_id: i32) -> i32 {
    (seat_id - 1) / ROW_WIDTH
}

/// Режет упорядоченный снимок на физические ряды.
pub fn rows(snapshot: &[Seat]) -> Vec<&[Seat]> {
    snapshot
        .chunk_by(|a, b| row_of(a.id) == row_of(b.id))
        .collect()
}

pub fn check_seat_count(count: usize) -> Result<(), BookingError> {
    if count == 0 || count > MAX_SEATS_PER_BOOKING {
        return Err(BookingError::InvalidSeatCount {
            requested: count,
            max: MAX_SEATS_PER_BOOKING,
        });
    }
    Ok(())
}

pub fn plan(snapshot: &[Seat], request: &SeatRequest) -> Result<Vec<i32>, BookingError> {
    match request {
        SeatRequest::Manual { seat_numbers } => validate_manual(snapshot, seat_numbers),
        SeatRequest::Assisted { seat_count } => plan_assisted(snapshot, *seat_count),
    }
}

/// Assisted-подбор `count` мест.
pub fn plan_assisted(snapshot: &[Seat], count: usize) -> Result<Vec<i32>, BookingError> {
    check_seat_count(count)?;

    if let Some(ids) = find_in_row(snapshot, count) {
        return Ok(ids);
    }

    find_nearby(snapshot, count)
}

fn find_in_row(snapshot: &[Seat], count: usize) -> Option<Vec<i32>> {
    rows(snapshot).into_iter().find_map(|row| {
        let free: Vec<i32> = row
            .iter()
            .filter(|seat| seat.is_free())
            .map(|seat| seat.id)
            .take(count)
            .collect();
        (free.len() == count).then_some(free)
    })
}

fn find_nearby(snapshot: &[Seat], count: usize) -> Result<Vec<i32>, BookingError> {
    let free: Vec<i32> = snapshot
        .iter()
        .filter(|seat| seat.is_free())
        .map(|seat| seat.id)
        .collect();

    if free.len() < count {
        return Err(BookingError::InsufficientSeats {
            requested: count,
            available: free.len(),
        });
    }

    // min_by_key возвращает первый минимум, это и есть tie-break по окну.
    let best = free
        .windows(count)
        .min_by_key(|window| window[count - 1] - window[0])
        .ok_or(BookingError::InsufficientSeats {
            requested: count,
            available: free.len(),
        })?;

    Ok(best.to_vec())
}

/// Проверка ручного выбора: количество, дубликаты, существование и занятость.
pub fn validate_manual(snapshot: &[Seat], seat_ids: &[i32]) -> Result<Vec<i32>, BookingError> {
    check_seat_count(seat_ids.len())?;

    let mut seen = Vec::with_capacity(seat_ids.len());
    let mut taken = Vec::new();
    for &id in seat_ids {
        if seen.contains(&id) {
            return Err(BookingError::InvalidInput(format!("seat {} selected twice", id)));
        }
        seen.push(id);

        match snapshot.binary_search_by_key(&id, |seat| seat.id) {
            Ok(idx) if snapshot[idx].is_booked => taken.push(id),
            Ok(_) => {}
            Err(_) => {
                return Err(BookingError::InvalidInput(format!("seat {} does not exist", id)));
            }
        }
    }

    if !taken.is_empty() {
        taken.sort_unstable();
        return Err(BookingError::SeatAlreadyBooked { seat_ids: taken });
    }

    Ok(seat_ids.to_vec())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn coach(capacity: i32, booked: &[i32]) -> Vec<Seat> {
        (1..=capacity)
            .map(|id| Seat {
                id,
                is_booked: booked.contains(&id),
            })
            .collect()
    }

    #[test]
    fn eighty_seats_make_eleven_full_rows_and_a_short_one() {
        let snapshot = coach(80, &[]);
        let rows = rows(&snapshot);
        assert_eq!(rows.len(), 12);
        assert!(rows[..11].iter().all(|r| r.len() == 7));
        assert_eq!(rows[11].iter().map(|s| s.id).collect::<Vec<_>>(), vec![78, 79, 80]);
    }

    #[test]
    fn picks_first_row_with_room() {
        let snapshot = coach(80, &[]);
        assert_eq!(plan_assisted(&snapshot, 3).unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn skips_booked_seats_within_a_row() {
        // в первом ряду свободно только 4, просим 5 -> второй ряд
        let snapshot = coach(80, &[1, 2, 3]);
        assert_eq!(plan_assisted(&snapshot, 4).unwrap(), vec![4, 5, 6, 7]);
        assert_eq!(plan_assisted(&snapshot, 5).unwrap(), vec![8, 9, 10, 11, 12]);
    }

    #[test]
    fn row_with_enough_free_seats_wins_over_tighter_pair() {
        // ряд 1 занят, в ряду 2 свободны только 8 и 14, в ряду 3 только 15
        let mut booked: Vec<i32> = (1..=13).filter(|id| *id != 8).collect();
        booked.extend(16..=21);
        let snapshot = coach(21, &booked);

        // ряд 2 вмещает двоих, хотя [14,15] плотнее
        assert_eq!(plan_assisted(&snapshot, 2).unwrap(), vec![8, 14]);
        // троих не вмещает ни один ряд, окно одно
        assert_eq!(plan_assisted(&snapshot, 3).unwrap(), vec![8, 14, 15]);
    }

    #[test]
    fn falls_back_to_smallest_span() {
        // по одному свободному месту в ряду: 1, 13, 15, 22
        let booked: Vec<i32> = (1..=28).filter(|id| ![1, 13, 15, 22].contains(id)).collect();
        let snapshot = coach(28, &booked);

        // окна: [1,13] span 12, [13,15] span 2, [15,22] span 7
        assert_eq!(plan_assisted(&snapshot, 2).unwrap(), vec![13, 15]);
    }

    #[test]
    fn equal_spans_keep_the_earliest_window() {
        // свободны 6, 8, 13, 15: ни в одном ряду нет троих
        let booked: Vec<i32> = (1..=21).filter(|id| ![6, 8, 13, 15].contains(id)).collect();
        let snapshot = coach(21, &booked);
        // окна [6,8,13] span 7, [8,13,15] span 7
        assert_eq!(plan_assisted(&snapshot, 3).unwrap(), vec![6, 8, 13]);
    }

    #[test]
    fn not_enough_free_seats() {
        let booked: Vec<i32> = (4..=80).collect();
        let snapshot = coach(80, &booked);
        assert_eq!(
            plan_assisted(&snapshot, 5),
            Err(BookingError::InsufficientSeats {
                requested: 5,
                available: 3
            })
        );
    }

    #[test]
    fn count_out_of_range() {
        let snapshot = coach(80, &[]);
        for count in [0, 8] {
            assert_eq!(
                plan_assisted(&snapshot, count),
                Err(BookingError::InvalidSeatCount {
                    requested: count,
                    max: 7
                })
            );
        }
    }

    #[test]
    fn manual_reports_every_booked_seat() {
        let snapshot = coach(80, &[5, 9]);
        assert_eq!(
            validate_manual(&snapshot, &[9, 1, 5]),
            Err(BookingError::SeatAlreadyBooked { seat_ids: vec![5, 9] })
        );
        assert_eq!(validate_manual(&snapshot, &[3, 1]).unwrap(), vec![3, 1]);
    }

    #[test]
    fn manual_rejects_duplicates_and_unknown_ids() {
        let snapshot = coach(80, &[]);
        assert!(matches!(
            validate_manual(&snapshot, &[1, 1]),
            Err(BookingError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_manual(&snapshot, &[81]),
            Err(BookingError::InvalidInput(_))
        ));
        assert!(matches!(
            validate_manual(&snapshot, &[]),
            Err(BookingError::InvalidSeatCount { requested: 0, .. })
        ));
    }

    #[test]
    fn plan_dispatches_on_mode() {
        let snapshot = coach(80, &[1]);
        assert_eq!(
            plan(&snapshot, &SeatRequest::Assisted { seat_count: 2 }).unwrap(),
            vec![2, 3]
        );
        assert_eq!(
            plan(&snapshot, &SeatRequest::Manual { seat_numbers: vec![40] }).unwrap(),
            vec![40]
        );
    }
}
