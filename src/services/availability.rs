use chrono::NaiveDate;
use serde::Serialize;
use std::fmt;
use std::sync::Arc;

use crate::errors::{EngineError, EngineResult};
use crate::models::{Booking, BookingStatus, Room, StayDates};
use crate::store::Store;

/// Why a room fails an availability check, in precedence order: an
/// intersecting booking outranks capacity, which outranks the advisory flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ConflictReason {
    #[serde(rename = "Booked")]
    Booked,
    #[serde(rename = "Insufficient capacity")]
    InsufficientCapacity,
    #[serde(rename = "Unavailable")]
    Unavailable,
}

impl fmt::Display for ConflictReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ConflictReason::Booked => "Booked",
            ConflictReason::InsufficientCapacity => "Insufficient capacity",
            ConflictReason::Unavailable => "Unavailable",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RoomAvailability {
    #[serde(flatten)]
    pub room: Room,
    pub available: bool,
    pub reason: Option<ConflictReason>,
}

/// Read-only availability search over a room category. Conflict decisions
/// come from interval comparison against the active booking set; the room's
/// `available_flag` is only a secondary signal.
#[derive(Clone)]
pub struct AvailabilityCalculator {
    store: Arc<dyn Store>,
}

impl AvailabilityCalculator {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    /// Every room in `category`, annotated available or blocked with a
    /// reason. "Nothing available" is a normal result, not an error.
    pub async fn find_available(
        &self,
        category: &str,
        check_in: NaiveDate,
        check_out: NaiveDate,
        guest_count: i32,
    ) -> EngineResult<Vec<RoomAvailability>> {
        let stay = StayDates::new(check_in, check_out)?;
        validate_guest_count(guest_count)?;

        let rooms = self.store.rooms_by_category(category).await?;
        if rooms.is_empty() {
            return Ok(Vec::new());
        }

        let room_numbers: Vec<String> = rooms.iter().map(|r| r.room_number.clone()).collect();
        let bookings = self
            .store
            .bookings_for_rooms(&room_numbers, &BookingStatus::ACTIVE, stay)
            .await?;

        Ok(rooms
            .into_iter()
            .map(|room| annotate(room, &bookings, stay, guest_count))
            .collect())
    }

    /// The same decision for a single known room, used by booking creation
    /// to re-validate at insert time.
    pub async fn check_room(
        &self,
        room: &Room,
        stay: StayDates,
        guest_count: i32,
    ) -> EngineResult<Option<ConflictReason>> {
        validate_guest_count(guest_count)?;
        let bookings = self
            .store
            .bookings_for_rooms(
                std::slice::from_ref(&room.room_number),
                &BookingStatus::ACTIVE,
                stay,
            )
            .await?;
        Ok(classify(room, &bookings, stay, guest_count))
    }
}

fn validate_guest_count(guest_count: i32) -> EngineResult<()> {
    if guest_count < 1 {
        return Err(EngineError::validation("guest_count must be at least 1"));
    }
    Ok(())
}

fn annotate(
    room: Room,
    bookings: &[Booking],
    stay: StayDates,
    guest_count: i32,
) -> RoomAvailability {
    let reason = classify(&room, bookings, stay, guest_count);
    RoomAvailability {
        room,
        available: reason.is_none(),
        reason,
    }
}

fn classify(
    room: &Room,
    bookings: &[Booking],
    stay: StayDates,
    guest_count: i32,
) -> Option<ConflictReason> {
    let booked = bookings.iter().any(|b| {
        b.room_number == room.room_number
            && b.status.is_active()
            && b.stay().conflicts_with(&stay)
    });
    if booked {
        Some(ConflictReason::Booked)
    } else if room.capacity < guest_count {
        Some(ConflictReason::InsufficientCapacity)
    } else if !room.available_flag {
        Some(ConflictReason::Unavailable)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::PaymentStatus;
    use crate::store::memory::MemoryStore;
    use chrono::NaiveDate;

    fn d(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    fn room(number: &str, category: &str, capacity: i32) -> Room {
        Room {
            room_number: number.to_string(),
            room_category: category.to_string(),
            capacity,
            nightly_rate: 10_000,
            discounted_nightly_rate: None,
            available_flag: true,
        }
    }

    fn booking(room_number: &str, check_in: &str, check_out: &str, status: BookingStatus) -> Booking {
        Booking {
            booking_id: Booking::new_reference(),
            room_number: room_number.to_string(),
            guest_name: "Dana Petrova".to_string(),
            guest_email: "dana@example.com".to_string(),
            guest_phone: "+77010000000".to_string(),
            check_in_date: d(check_in),
            check_out_date: d(check_out),
            guest_count: 2,
            status,
            payment_status: PaymentStatus::Pending,
            base_total_amount: 50_000,
            paid_amount: 0,
            admin_notes: String::new(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    async fn seeded() -> (Arc<MemoryStore>, AvailabilityCalculator) {
        let store = Arc::new(MemoryStore::with_rooms(vec![room("101", "Standard", 2)]));
        store
            .insert_booking(&booking("101", "2024-01-10", "2024-01-15", BookingStatus::Confirmed))
            .await
            .unwrap();
        let calc = AvailabilityCalculator::new(store.clone());
        (store, calc)
    }

    #[tokio::test]
    async fn overlapping_request_reports_booked() {
        let (_store, calc) = seeded().await;
        let result = calc
            .find_available("Standard", d("2024-01-12"), d("2024-01-14"), 2)
            .await
            .unwrap();
        assert_eq!(result.len(), 1);
        assert!(!result[0].available);
        assert_eq!(result[0].reason, Some(ConflictReason::Booked));
    }

    #[tokio::test]
    async fn same_day_turnover_is_available() {
        let (_store, calc) = seeded().await;
        let result = calc
            .find_available("Standard", d("2024-01-15"), d("2024-01-18"), 2)
            .await
            .unwrap();
        assert!(result[0].available);
        assert_eq!(result[0].reason, None);
    }

    #[tokio::test]
    async fn capacity_shortfall_reported_for_every_room() {
        let store = Arc::new(MemoryStore::with_rooms(vec![
            room("201", "Twin", 2),
            room("202", "Twin", 2),
            room("203", "Twin", 2),
        ]));
        let calc = AvailabilityCalculator::new(store);
        let result = calc
            .find_available("Twin", d("2024-03-01"), d("2024-03-03"), 3)
            .await
            .unwrap();
        assert_eq!(result.len(), 3);
        for entry in &result {
            assert!(!entry.available);
            assert_eq!(entry.reason, Some(ConflictReason::InsufficientCapacity));
        }
    }

    #[tokio::test]
    async fn booked_outranks_capacity_and_flag() {
        let store = Arc::new(MemoryStore::with_rooms(vec![{
            let mut r = room("101", "Standard", 1);
            r.available_flag = false;
            r
        }]));
        store
            .insert_booking(&booking("101", "2024-01-10", "2024-01-15", BookingStatus::CheckedIn))
            .await
            .unwrap();
        let calc = AvailabilityCalculator::new(store);
        let result = calc
            .find_available("Standard", d("2024-01-11"), d("2024-01-13"), 2)
            .await
            .unwrap();
        assert_eq!(result[0].reason, Some(ConflictReason::Booked));
    }

    #[tokio::test]
    async fn advisory_flag_reports_unavailable_when_nothing_else_applies() {
        let store = Arc::new(MemoryStore::with_rooms(vec![{
            let mut r = room("102", "Standard", 2);
            r.available_flag = false;
            r
        }]));
        let calc = AvailabilityCalculator::new(store);
        let result = calc
            .find_available("Standard", d("2024-02-01"), d("2024-02-03"), 2)
            .await
            .unwrap();
        assert_eq!(result[0].reason, Some(ConflictReason::Unavailable));
    }

    #[tokio::test]
    async fn cancelled_and_checked_out_bookings_do_not_block() {
        let store = Arc::new(MemoryStore::with_rooms(vec![room("101", "Standard", 2)]));
        store
            .insert_booking(&booking("101", "2024-01-10", "2024-01-15", BookingStatus::Cancelled))
            .await
            .unwrap();
        let calc = AvailabilityCalculator::new(store);
        let result = calc
            .find_available("Standard", d("2024-01-11"), d("2024-01-13"), 2)
            .await
            .unwrap();
        assert!(result[0].available);
    }

    #[tokio::test]
    async fn malformed_input_is_a_validation_error() {
        let (_store, calc) = seeded().await;
        let inverted = calc
            .find_available("Standard", d("2024-01-14"), d("2024-01-12"), 2)
            .await;
        assert!(matches!(inverted, Err(EngineError::Validation(_))));

        let no_guests = calc
            .find_available("Standard", d("2024-01-12"), d("2024-01-14"), 0)
            .await;
        assert!(matches!(no_guests, Err(EngineError::Validation(_))));
    }

    #[tokio::test]
    async fn unknown_category_is_an_empty_result() {
        let (_store, calc) = seeded().await;
        let result = calc
            .find_available("Penthouse", d("2024-01-12"), d("2024-01-14"), 2)
            .await
            .unwrap();
        assert!(result.is_empty());
    }
}
