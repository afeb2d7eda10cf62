use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Mutex;

use crate::errors::{EngineError, EngineResult};
use crate::models::{Booking, BookingStatus, PaymentRecord, Room, StayDates};

use super::{Store, TransitionChange};

#[derive(Default)]
struct Inner {
    rooms: HashMap<String, Room>,
    bookings: HashMap<String, Booking>,
    payments: Vec<PaymentRecord>,
    fail_payment_writes: bool,
}

/// In-memory store for tests and local development. A single mutex
/// serializes check-and-insert, which closes the same double-booking race
/// the Postgres exclusion constraint closes in production.
#[derive(Default)]
pub struct MemoryStore {
    inner: Mutex<Inner>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_rooms(rooms: Vec<Room>) -> Self {
        let store = Self::new();
        {
            let mut inner = store.inner.lock().unwrap();
            for room in rooms {
                inner.rooms.insert(room.room_number.clone(), room);
            }
        }
        store
    }

    /// Make subsequent `insert_payment` calls fail, to exercise the
    /// checkout-warning path.
    pub fn fail_payment_writes(&self) {
        self.inner.lock().unwrap().fail_payment_writes = true;
    }

    pub fn payments(&self) -> Vec<PaymentRecord> {
        self.inner.lock().unwrap().payments.clone()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn rooms_by_category(&self, category: &str) -> EngineResult<Vec<Room>> {
        let inner = self.inner.lock().unwrap();
        let mut rooms: Vec<Room> = inner
            .rooms
            .values()
            .filter(|r| r.room_category == category)
            .cloned()
            .collect();
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(rooms)
    }

    async fn all_rooms(&self) -> EngineResult<Vec<Room>> {
        let inner = self.inner.lock().unwrap();
        let mut rooms: Vec<Room> = inner.rooms.values().cloned().collect();
        rooms.sort_by(|a, b| a.room_number.cmp(&b.room_number));
        Ok(rooms)
    }

    async fn room(&self, room_number: &str) -> EngineResult<Option<Room>> {
        Ok(self.inner.lock().unwrap().rooms.get(room_number).cloned())
    }

    async fn bookings_for_rooms(
        &self,
        room_numbers: &[String],
        statuses: &[BookingStatus],
        range: StayDates,
    ) -> EngineResult<Vec<Booking>> {
        let inner = self.inner.lock().unwrap();
        let mut found: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| {
                room_numbers.contains(&b.room_number)
                    && statuses.contains(&b.status)
                    && b.stay().conflicts_with(&range)
            })
            .cloned()
            .collect();
        found.sort_by_key(|b| b.check_in_date);
        Ok(found)
    }

    async fn booking(&self, booking_id: &str) -> EngineResult<Option<Booking>> {
        Ok(self.inner.lock().unwrap().bookings.get(booking_id).cloned())
    }

    async fn latest_booking_for_room(
        &self,
        room_number: &str,
        statuses: &[BookingStatus],
    ) -> EngineResult<Option<Booking>> {
        let inner = self.inner.lock().unwrap();
        Ok(inner
            .bookings
            .values()
            .filter(|b| b.room_number == room_number && statuses.contains(&b.status))
            .max_by_key(|b| b.created_at)
            .cloned())
    }

    async fn active_bookings(&self) -> EngineResult<Vec<Booking>> {
        let inner = self.inner.lock().unwrap();
        let mut found: Vec<Booking> = inner
            .bookings
            .values()
            .filter(|b| b.status.is_active())
            .cloned()
            .collect();
        found.sort_by_key(|b| b.check_in_date);
        Ok(found)
    }

    async fn insert_booking(&self, booking: &Booking) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        let stay = booking.stay();
        let clash = inner.bookings.values().any(|b| {
            b.room_number == booking.room_number
                && b.status.is_active()
                && b.stay().conflicts_with(&stay)
        });
        if clash {
            return Err(EngineError::conflict(
                "room already has a booking overlapping the requested stay",
            ));
        }
        inner
            .bookings
            .insert(booking.booking_id.clone(), booking.clone());
        Ok(())
    }

    async fn apply_transition(
        &self,
        booking_id: &str,
        change: TransitionChange,
    ) -> EngineResult<Booking> {
        let mut inner = self.inner.lock().unwrap();

        let booking = inner
            .bookings
            .get_mut(booking_id)
            .ok_or_else(|| EngineError::not_found(format!("booking {booking_id} does not exist")))?;

        if !change.expected_from.contains(&booking.status) {
            return Err(EngineError::InvalidTransition {
                from: booking.status,
                attempted: change.new_status,
            });
        }

        booking.status = change.new_status;
        if let Some(ps) = change.payment_status {
            booking.payment_status = ps;
        }
        if !booking.admin_notes.is_empty() {
            booking.admin_notes.push('\n');
        }
        booking.admin_notes.push_str(&change.audit_note);
        let updated = booking.clone();

        if let Some(flag) = change.room_available_flag {
            if let Some(room) = inner.rooms.get_mut(&updated.room_number) {
                room.available_flag = flag;
            }
        }

        Ok(updated)
    }

    async fn insert_payment(&self, record: &PaymentRecord) -> EngineResult<()> {
        let mut inner = self.inner.lock().unwrap();
        if inner.fail_payment_writes {
            return Err(EngineError::Persistence(
                "payment ledger unavailable".to_string(),
            ));
        }
        inner.payments.push(record.clone());
        Ok(())
    }
}
