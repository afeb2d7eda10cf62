pub mod memory;
pub mod postgres;

use async_trait::async_trait;

use crate::errors::EngineResult;
use crate::models::{Booking, BookingStatus, PaymentRecord, PaymentStatus, Room, StayDates};

/// One lifecycle step, applied by the store as a single atomic unit:
/// booking status + audit note + payment status + room flag either all land
/// or none do.
#[derive(Debug, Clone)]
pub struct TransitionChange {
    /// Statuses the booking must currently be in; the guard is re-checked at
    /// commit time, not only at the service-level read.
    pub expected_from: Vec<BookingStatus>,
    pub new_status: BookingStatus,
    pub audit_note: String,
    /// When set, the room's advisory flag is written in the same unit.
    pub room_available_flag: Option<bool>,
    pub payment_status: Option<PaymentStatus>,
}

/// The Room & Booking Store contract. The engine owns no durable state; it
/// reads and mutates through this trait only.
#[async_trait]
pub trait Store: Send + Sync {
    async fn rooms_by_category(&self, category: &str) -> EngineResult<Vec<Room>>;
    async fn all_rooms(&self) -> EngineResult<Vec<Room>>;
    async fn room(&self, room_number: &str) -> EngineResult<Option<Room>>;

    /// Bookings on the given rooms whose half-open interval intersects
    /// `range`, restricted to `statuses`.
    async fn bookings_for_rooms(
        &self,
        room_numbers: &[String],
        statuses: &[BookingStatus],
        range: StayDates,
    ) -> EngineResult<Vec<Booking>>;

    async fn booking(&self, booking_id: &str) -> EngineResult<Option<Booking>>;

    /// Most recent booking on a room in one of `statuses`. Duplicates can
    /// exist historically; the latest record wins.
    async fn latest_booking_for_room(
        &self,
        room_number: &str,
        statuses: &[BookingStatus],
    ) -> EngineResult<Option<Booking>>;

    /// Every booking in an active status, for occupancy projection.
    async fn active_bookings(&self) -> EngineResult<Vec<Booking>>;

    /// Insert a new booking. The store, not the caller, is responsible for
    /// rejecting an overlapping active booking on the same room with
    /// `EngineError::Conflict` — the availability pre-check alone cannot
    /// close the check-then-insert race.
    async fn insert_booking(&self, booking: &Booking) -> EngineResult<()>;

    /// Apply a lifecycle transition atomically. Fails with
    /// `EngineError::InvalidTransition` if the booking is no longer in an
    /// expected status, leaving everything untouched.
    async fn apply_transition(
        &self,
        booking_id: &str,
        change: TransitionChange,
    ) -> EngineResult<Booking>;

    async fn insert_payment(&self, record: &PaymentRecord) -> EngineResult<()>;
}
