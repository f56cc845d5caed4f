use serde::{Deserialize, Serialize};
use sqlx::FromRow;

// Одно место в вагоне. id плотные (1..=N), порядок id задаёт физическое соседство.
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromRow, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Seat {
    pub id: i32,
    pub is_booked: bool,
}

impl Seat {
    pub fn free(id: i32) -> Self {
        Seat { id, is_booked: false }
    }

    pub fn is_free(&self) -> bool {
        !self.is_booked
    }
}
