//! Booking lifecycle: creation, check-in, check-out, cancellation.
//!
//! Legal transitions: pending/confirmed -> checked_in -> checked_out, and
//! any active status -> cancelled. Guards are enforced twice: here for a
//! readable error, and inside `Store::apply_transition` at commit time so a
//! racing second transition cannot slip through.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};

use crate::errors::{EngineError, EngineResult};
use crate::models::{Booking, BookingStatus, PaymentRecord, PaymentStatus, StayDates};
use crate::services::availability::AvailabilityCalculator;
use crate::services::notification::NotificationClient;
use crate::services::reconciliation::{self, ExtraCharges};
use crate::store::{Store, TransitionChange};

/// Check-in/check-out accept either a booking reference or a room number;
/// a room number resolves to the most recent matching booking.
#[derive(Debug, Clone)]
pub enum BookingLookup {
    Id(String),
    Room(String),
}

#[derive(Debug, Clone)]
pub struct NewBookingRequest {
    pub room_number: String,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub check_in_date: chrono::NaiveDate,
    pub check_out_date: chrono::NaiveDate,
    pub guest_count: i32,
}

/// How the booking enters the state machine. Staff walk-ins start confirmed
/// with payment pre-recorded.
#[derive(Debug, Clone)]
pub enum BookingOpening {
    GuestRequest,
    StaffWalkIn { paid_amount: i64, staff_email: String },
}

#[derive(Debug, Clone, serde::Serialize)]
pub struct CheckoutOutcome {
    pub booking: Booking,
    pub final_amount: i64,
    pub payment_status: PaymentStatus,
    /// Recoverable problems (e.g. the supplementary payment record failed to
    /// write). The checkout itself stands.
    pub warnings: Vec<String>,
}

/// Free-cancellation window before the check-in day, recorded in the audit
/// note on cancellation.
const FREE_CANCELLATION_HOURS: i64 = 48;

#[derive(Clone)]
pub struct LifecycleManager {
    store: Arc<dyn Store>,
    availability: AvailabilityCalculator,
    notifier: NotificationClient,
}

impl LifecycleManager {
    pub fn new(store: Arc<dyn Store>, notifier: NotificationClient) -> Self {
        Self {
            availability: AvailabilityCalculator::new(store.clone()),
            store,
            notifier,
        }
    }

    /// Create a booking. Availability is re-validated here, but the insert
    /// itself is what settles a race: the store rejects an overlapping
    /// active booking atomically.
    pub async fn create_booking(
        &self,
        req: NewBookingRequest,
        opening: BookingOpening,
    ) -> EngineResult<Booking> {
        let stay = StayDates::new(req.check_in_date, req.check_out_date)?;

        let room = self
            .store
            .room(&req.room_number)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("room {} does not exist", req.room_number)))?;

        if let Some(reason) = self
            .availability
            .check_room(&room, stay, req.guest_count)
            .await?
        {
            return Err(EngineError::conflict(format!(
                "room {} is not available for the requested stay: {reason}",
                room.room_number
            )));
        }

        let base_total_amount = stay.nights() * room.effective_nightly_rate();
        let (status, paid_amount, opening_note) = match &opening {
            BookingOpening::GuestRequest => (
                BookingStatus::Pending,
                0,
                "created from guest request".to_string(),
            ),
            BookingOpening::StaffWalkIn {
                paid_amount,
                staff_email,
            } => {
                if *paid_amount < 0 {
                    return Err(EngineError::validation("paid_amount must not be negative"));
                }
                (
                    BookingStatus::Confirmed,
                    *paid_amount,
                    format!("created as walk-in by {staff_email}"),
                )
            }
        };

        let payment_status = if paid_amount >= base_total_amount {
            PaymentStatus::Paid
        } else if paid_amount > 0 {
            PaymentStatus::Partial
        } else {
            PaymentStatus::Pending
        };

        let booking = Booking {
            booking_id: Booking::new_reference(),
            room_number: room.room_number.clone(),
            guest_name: req.guest_name,
            guest_email: req.guest_email,
            guest_phone: req.guest_phone,
            check_in_date: stay.check_in,
            check_out_date: stay.check_out,
            guest_count: req.guest_count,
            status,
            payment_status,
            base_total_amount,
            paid_amount,
            admin_notes: audit_line(&opening_note),
            created_at: Utc::now().naive_utc(),
        };

        self.store.insert_booking(&booking).await?;
        info!(
            booking_id = %booking.booking_id,
            room = %booking.room_number,
            "booking created ({status})"
        );

        // Fire-and-report; the booking is committed regardless.
        self.notifier.booking_created(&booking).await;

        Ok(booking)
    }

    /// Guest arrival. Allowed from pending or confirmed; marks the room as
    /// occupied via its advisory flag.
    pub async fn check_in(&self, lookup: BookingLookup, staff_email: &str) -> EngineResult<Booking> {
        let booking = self
            .resolve(&lookup, &[BookingStatus::Pending, BookingStatus::Confirmed])
            .await?;

        let updated = self
            .store
            .apply_transition(
                &booking.booking_id,
                TransitionChange {
                    expected_from: vec![BookingStatus::Pending, BookingStatus::Confirmed],
                    new_status: BookingStatus::CheckedIn,
                    audit_note: audit_line(&format!("checked in by {staff_email}")),
                    room_available_flag: Some(false),
                    payment_status: None,
                },
            )
            .await?;

        info!(booking_id = %updated.booking_id, room = %updated.room_number, "guest checked in");
        Ok(updated)
    }

    /// Guest departure. Runs checkout reconciliation, settles the payment
    /// status, frees the room, and records extra charges in the payment
    /// ledger. A failed ledger write is a warning, not a failed checkout.
    pub async fn check_out(
        &self,
        lookup: BookingLookup,
        charges: ExtraCharges,
        staff_email: &str,
    ) -> EngineResult<CheckoutOutcome> {
        let extra_total = charges.total()?;

        let booking = self.resolve(&lookup, &[BookingStatus::CheckedIn]).await?;
        let settlement = reconciliation::reconcile(&booking, &charges)?;

        let note = format!(
            "checked out by {staff_email}; final amount {} with {} paid ({})",
            settlement.final_amount, booking.paid_amount, settlement.payment_status
        );
        let updated = self
            .store
            .apply_transition(
                &booking.booking_id,
                TransitionChange {
                    expected_from: vec![BookingStatus::CheckedIn],
                    new_status: BookingStatus::CheckedOut,
                    audit_note: audit_line(&note),
                    room_available_flag: Some(true),
                    payment_status: Some(settlement.payment_status),
                },
            )
            .await?;

        let mut warnings = Vec::new();
        if extra_total > 0 {
            let record = PaymentRecord::additional_charges(&updated.booking_id, extra_total);
            if let Err(e) = self.store.insert_payment(&record).await {
                warn!(
                    booking_id = %updated.booking_id,
                    "failed to record additional charges after checkout: {e}"
                );
                warnings.push(format!(
                    "additional charges of {extra_total} were not recorded in the payment ledger: {e}"
                ));
            }
        }

        info!(booking_id = %updated.booking_id, room = %updated.room_number, "guest checked out");
        Ok(CheckoutOutcome {
            final_amount: settlement.final_amount,
            payment_status: settlement.payment_status,
            booking: updated,
            warnings,
        })
    }

    /// Cancel an active booking, releasing the room immediately. Whether the
    /// cancellation fell inside the free window is recorded for the audit
    /// trail; no refund is computed here.
    pub async fn cancel(&self, booking_id: &str, actor: &str) -> EngineResult<Booking> {
        let booking = self
            .store
            .booking(booking_id)
            .await?
            .ok_or_else(|| EngineError::not_found(format!("booking {booking_id} does not exist")))?;

        let hours_to_check_in = (booking.stay().check_in_start() - Utc::now().naive_utc()).num_hours();
        let window = if hours_to_check_in >= FREE_CANCELLATION_HOURS {
            "inside the free cancellation window"
        } else {
            "outside the free cancellation window"
        };

        // Only a checked-in stay ever cleared the flag, so only that case
        // restores it.
        let restore_flag = (booking.status == BookingStatus::CheckedIn).then_some(true);

        let updated = self
            .store
            .apply_transition(
                booking_id,
                TransitionChange {
                    expected_from: BookingStatus::ACTIVE.to_vec(),
                    new_status: BookingStatus::Cancelled,
                    audit_note: audit_line(&format!("cancelled by {actor}, {window}")),
                    room_available_flag: restore_flag,
                    payment_status: None,
                },
            )
            .await?;

        info!(booking_id = %updated.booking_id, room = %updated.room_number, "booking cancelled");
        Ok(updated)
    }

    async fn resolve(
        &self,
        lookup: &BookingLookup,
        room_lookup_statuses: &[BookingStatus],
    ) -> EngineResult<Booking> {
        match lookup {
            BookingLookup::Id(id) => self
                .store
                .booking(id)
                .await?
                .ok_or_else(|| EngineError::not_found(format!("booking {id} does not exist"))),
            BookingLookup::Room(room_number) => self
                .store
                .latest_booking_for_room(room_number, room_lookup_statuses)
                .await?
                .ok_or_else(|| {
                    EngineError::not_found(format!(
                        "no matching booking found for room {room_number}"
                    ))
                }),
        }
    }
}

fn audit_line(message: &str) -> String {
    format!("[{}] {message}", Utc::now().format("%Y-%m-%d %H:%M:%S UTC"))
}
