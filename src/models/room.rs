use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A physical room. Monetary amounts are integer minor units (cents).
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Room {
    pub room_number: String,
    pub room_category: String,
    pub capacity: i32,
    pub nightly_rate: i64,
    pub discounted_nightly_rate: Option<i64>,
    /// Advisory flag toggled by check-in/check-out. Conflict detection works
    /// from the booking set, not from this flag.
    pub available_flag: bool,
}

impl Room {
    /// Discounted rate wins when present.
    pub fn effective_nightly_rate(&self) -> i64 {
        self.discounted_nightly_rate.unwrap_or(self.nightly_rate)
    }
}
