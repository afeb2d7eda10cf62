use chrono::{NaiveDate, NaiveDateTime};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use std::fmt;

use super::dates::StayDates;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "booking_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum BookingStatus {
    Pending,
    Confirmed,
    CheckedIn,
    CheckedOut,
    Cancelled,
}

impl BookingStatus {
    /// Statuses that hold the room: these participate in conflict detection
    /// and occupancy.
    pub const ACTIVE: [BookingStatus; 3] = [
        BookingStatus::Pending,
        BookingStatus::Confirmed,
        BookingStatus::CheckedIn,
    ];

    pub fn is_active(self) -> bool {
        Self::ACTIVE.contains(&self)
    }
}

impl fmt::Display for BookingStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            BookingStatus::Pending => "pending",
            BookingStatus::Confirmed => "confirmed",
            BookingStatus::CheckedIn => "checked_in",
            BookingStatus::CheckedOut => "checked_out",
            BookingStatus::Cancelled => "cancelled",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, sqlx::Type)]
#[sqlx(type_name = "payment_status", rename_all = "snake_case")]
#[serde(rename_all = "snake_case")]
pub enum PaymentStatus {
    Pending,
    Partial,
    Paid,
}

impl fmt::Display for PaymentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            PaymentStatus::Pending => "pending",
            PaymentStatus::Partial => "partial",
            PaymentStatus::Paid => "paid",
        };
        f.write_str(s)
    }
}

/// A reservation on one room. `room_number` is a reference, not ownership.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Booking {
    /// Human-readable unique reference, e.g. `BK-3F9A2C41`.
    pub booking_id: String,
    pub room_number: String,
    pub guest_name: String,
    pub guest_email: String,
    pub guest_phone: String,
    pub check_in_date: NaiveDate,
    pub check_out_date: NaiveDate,
    pub guest_count: i32,
    pub status: BookingStatus,
    pub payment_status: PaymentStatus,
    /// Minor units. nights x effective nightly rate at creation time.
    pub base_total_amount: i64,
    pub paid_amount: i64,
    /// Append-only audit log, one line per lifecycle event.
    pub admin_notes: String,
    pub created_at: NaiveDateTime,
}

impl Booking {
    pub fn new_reference() -> String {
        let id = uuid::Uuid::new_v4().simple().to_string();
        format!("BK-{}", id[..8].to_uppercase())
    }

    pub fn stay(&self) -> StayDates {
        // Both dates were validated on creation; this cannot invert.
        StayDates {
            check_in: self.check_in_date,
            check_out: self.check_out_date,
        }
    }
}
