use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, patch, post},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::errors::EngineError;
use crate::middleware::StaffUser;
use crate::services::lifecycle::{
    BookingLookup, BookingOpening, LifecycleManager, NewBookingRequest,
};
use crate::services::reconciliation::ExtraCharges;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/bookings", post(create_booking))
        .route("/bookings/walk-in", post(create_walk_in))
        .route("/bookings/{booking_id}", get(get_booking))
        .route("/bookings/checkIn", patch(check_in))
        .route("/bookings/checkOut", patch(check_out))
        .route("/bookings/cancel", patch(cancel_booking))
}

fn lifecycle(state: &Arc<AppState>) -> LifecycleManager {
    LifecycleManager::new(state.store.clone(), state.notifier.clone())
}

/* ---------- creation ---------- */

#[derive(Debug, Deserialize)]
struct CreateBookingBody {
    room_number: String,
    guest_name: String,
    guest_email: String,
    #[serde(default)]
    guest_phone: String,
    check_in_date: NaiveDate,
    check_out_date: NaiveDate,
    guest_count: i32,
}

impl CreateBookingBody {
    fn into_request(self) -> Result<NewBookingRequest, EngineError> {
        if self.guest_name.trim().is_empty() {
            return Err(EngineError::validation("guest_name must not be empty"));
        }
        if self.guest_email.trim().is_empty() {
            return Err(EngineError::validation("guest_email must not be empty"));
        }
        Ok(NewBookingRequest {
            room_number: self.room_number,
            guest_name: self.guest_name,
            guest_email: self.guest_email,
            guest_phone: self.guest_phone,
            check_in_date: self.check_in_date,
            check_out_date: self.check_out_date,
            guest_count: self.guest_count,
        })
    }
}

// POST /api/bookings — guest self-service, starts pending.
async fn create_booking(
    State(state): State<Arc<AppState>>,
    Json(body): Json<CreateBookingBody>,
) -> Result<impl IntoResponse, EngineError> {
    let booking = lifecycle(&state)
        .create_booking(body.into_request()?, BookingOpening::GuestRequest)
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "booking": booking }))))
}

#[derive(Debug, Deserialize)]
struct WalkInBody {
    #[serde(flatten)]
    booking: CreateBookingBody,
    #[serde(default)]
    paid_amount: i64,
}

// POST /api/bookings/walk-in — staff-created, starts confirmed with payment
// pre-recorded.
async fn create_walk_in(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Json(body): Json<WalkInBody>,
) -> Result<impl IntoResponse, EngineError> {
    let booking = lifecycle(&state)
        .create_booking(
            body.booking.into_request()?,
            BookingOpening::StaffWalkIn {
                paid_amount: body.paid_amount,
                staff_email: staff.email,
            },
        )
        .await?;
    Ok((StatusCode::CREATED, Json(json!({ "success": true, "booking": booking }))))
}

// GET /api/bookings/{booking_id}
async fn get_booking(
    State(state): State<Arc<AppState>>,
    _staff: StaffUser,
    Path(booking_id): Path<String>,
) -> Result<impl IntoResponse, EngineError> {
    let booking = state
        .store
        .booking(&booking_id)
        .await?
        .ok_or_else(|| EngineError::not_found(format!("booking {booking_id} does not exist")))?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

/* ---------- lifecycle transitions ---------- */

#[derive(Debug, Deserialize)]
struct LookupBody {
    booking_id: Option<String>,
    room_number: Option<String>,
}

impl LookupBody {
    fn into_lookup(self) -> Result<BookingLookup, EngineError> {
        match (self.booking_id, self.room_number) {
            (Some(id), _) if !id.trim().is_empty() => Ok(BookingLookup::Id(id)),
            (_, Some(room)) if !room.trim().is_empty() => Ok(BookingLookup::Room(room)),
            _ => Err(EngineError::validation(
                "either booking_id or room_number is required",
            )),
        }
    }
}

// PATCH /api/bookings/checkIn
async fn check_in(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Json(body): Json<LookupBody>,
) -> Result<impl IntoResponse, EngineError> {
    let booking = lifecycle(&state)
        .check_in(body.into_lookup()?, &staff.email)
        .await?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}

#[derive(Debug, Deserialize)]
struct CheckOutBody {
    #[serde(flatten)]
    lookup: LookupBody,
    #[serde(flatten)]
    charges: ExtraCharges,
}

// PATCH /api/bookings/checkOut
async fn check_out(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Json(body): Json<CheckOutBody>,
) -> Result<impl IntoResponse, EngineError> {
    let outcome = lifecycle(&state)
        .check_out(body.lookup.into_lookup()?, body.charges, &staff.email)
        .await?;
    Ok(Json(json!({
        "success": true,
        "booking": outcome.booking,
        "final_amount": outcome.final_amount,
        "payment_status": outcome.payment_status,
        "warnings": outcome.warnings,
    })))
}

#[derive(Debug, Deserialize)]
struct CancelBody {
    booking_id: String,
}

// PATCH /api/bookings/cancel
async fn cancel_booking(
    State(state): State<Arc<AppState>>,
    staff: StaffUser,
    Json(body): Json<CancelBody>,
) -> Result<impl IntoResponse, EngineError> {
    if body.booking_id.trim().is_empty() {
        return Err(EngineError::validation("booking_id must not be empty"));
    }
    let booking = lifecycle(&state)
        .cancel(&body.booking_id, &staff.email)
        .await?;
    Ok(Json(json!({ "success": true, "booking": booking })))
}
