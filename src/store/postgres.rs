use async_trait::async_trait;
use std::future::Future;
use std::time::Duration;

use crate::database::Database;
use crate::errors::{EngineError, EngineResult};
use crate::models::{Booking, BookingStatus, PaymentRecord, Room, StayDates};

use super::{Store, TransitionChange};

/// SQLSTATE for exclusion-constraint violations. The bookings table carries
/// an exclusion constraint on (room_number, daterange) for active statuses,
/// so a racing double insert surfaces here as a business conflict.
const EXCLUSION_VIOLATION: &str = "23P01";

#[derive(Clone)]
pub struct PgStore {
    db: Database,
    query_timeout: Duration,
}

impl PgStore {
    pub fn new(db: Database, query_timeout: Duration) -> Self {
        Self { db, query_timeout }
    }

    /// Bound a store call; an elapsed timeout is a persistence fault, not a
    /// cancellation of the caller's operation.
    async fn bounded<T, F>(&self, fut: F) -> EngineResult<T>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        match tokio::time::timeout(self.query_timeout, fut).await {
            Ok(res) => res.map_err(map_db_err),
            Err(_) => Err(EngineError::Persistence(
                "store call timed out".to_string(),
            )),
        }
    }
}

fn map_db_err(e: sqlx::Error) -> EngineError {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.code().as_deref() == Some(EXCLUSION_VIOLATION) {
            return EngineError::conflict(
                "room already has a booking overlapping the requested stay",
            );
        }
    }
    EngineError::Persistence(e.to_string())
}

const BOOKING_COLUMNS: &str = "booking_id, room_number, guest_name, guest_email, guest_phone, \
     check_in_date, check_out_date, guest_count, status, payment_status, \
     base_total_amount, paid_amount, admin_notes, created_at";

#[async_trait]
impl Store for PgStore {
    async fn rooms_by_category(&self, category: &str) -> EngineResult<Vec<Room>> {
        self.bounded(
            sqlx::query_as::<_, Room>(
                "SELECT room_number, room_category, capacity, nightly_rate, \
                 discounted_nightly_rate, available_flag \
                 FROM rooms WHERE room_category = $1 ORDER BY room_number",
            )
            .bind(category)
            .fetch_all(&self.db.pool),
        )
        .await
    }

    async fn all_rooms(&self) -> EngineResult<Vec<Room>> {
        self.bounded(
            sqlx::query_as::<_, Room>(
                "SELECT room_number, room_category, capacity, nightly_rate, \
                 discounted_nightly_rate, available_flag \
                 FROM rooms ORDER BY room_number",
            )
            .fetch_all(&self.db.pool),
        )
        .await
    }

    async fn room(&self, room_number: &str) -> EngineResult<Option<Room>> {
        self.bounded(
            sqlx::query_as::<_, Room>(
                "SELECT room_number, room_category, capacity, nightly_rate, \
                 discounted_nightly_rate, available_flag \
                 FROM rooms WHERE room_number = $1",
            )
            .bind(room_number)
            .fetch_optional(&self.db.pool),
        )
        .await
    }

    async fn bookings_for_rooms(
        &self,
        room_numbers: &[String],
        statuses: &[BookingStatus],
        range: StayDates,
    ) -> EngineResult<Vec<Booking>> {
        // Half-open intersection: [a1,a2) meets [b1,b2) iff a1 < b2 and b1 < a2.
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE room_number = ANY($1) AND status = ANY($2) \
               AND check_in_date < $3 AND check_out_date > $4 \
             ORDER BY check_in_date"
        );
        self.bounded(
            sqlx::query_as::<_, Booking>(&query)
                .bind(room_numbers)
                .bind(statuses)
                .bind(range.check_out)
                .bind(range.check_in)
                .fetch_all(&self.db.pool),
        )
        .await
    }

    async fn booking(&self, booking_id: &str) -> EngineResult<Option<Booking>> {
        let query = format!("SELECT {BOOKING_COLUMNS} FROM bookings WHERE booking_id = $1");
        self.bounded(
            sqlx::query_as::<_, Booking>(&query)
                .bind(booking_id)
                .fetch_optional(&self.db.pool),
        )
        .await
    }

    async fn latest_booking_for_room(
        &self,
        room_number: &str,
        statuses: &[BookingStatus],
    ) -> EngineResult<Option<Booking>> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings \
             WHERE room_number = $1 AND status = ANY($2) \
             ORDER BY created_at DESC LIMIT 1"
        );
        self.bounded(
            sqlx::query_as::<_, Booking>(&query)
                .bind(room_number)
                .bind(statuses)
                .fetch_optional(&self.db.pool),
        )
        .await
    }

    async fn active_bookings(&self) -> EngineResult<Vec<Booking>> {
        let query = format!(
            "SELECT {BOOKING_COLUMNS} FROM bookings WHERE status = ANY($1) \
             ORDER BY check_in_date"
        );
        self.bounded(
            sqlx::query_as::<_, Booking>(&query)
                .bind(&BookingStatus::ACTIVE[..])
                .fetch_all(&self.db.pool),
        )
        .await
    }

    async fn insert_booking(&self, booking: &Booking) -> EngineResult<()> {
        self.bounded(
            sqlx::query(
                "INSERT INTO bookings (booking_id, room_number, guest_name, guest_email, \
                 guest_phone, check_in_date, check_out_date, guest_count, status, \
                 payment_status, base_total_amount, paid_amount, admin_notes, created_at) \
                 VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)",
            )
            .bind(&booking.booking_id)
            .bind(&booking.room_number)
            .bind(&booking.guest_name)
            .bind(&booking.guest_email)
            .bind(&booking.guest_phone)
            .bind(booking.check_in_date)
            .bind(booking.check_out_date)
            .bind(booking.guest_count)
            .bind(booking.status)
            .bind(booking.payment_status)
            .bind(booking.base_total_amount)
            .bind(booking.paid_amount)
            .bind(&booking.admin_notes)
            .bind(booking.created_at)
            .execute(&self.db.pool),
        )
        .await?;
        Ok(())
    }

    async fn apply_transition(
        &self,
        booking_id: &str,
        change: TransitionChange,
    ) -> EngineResult<Booking> {
        let pool = self.db.pool.clone();
        let booking_id = booking_id.to_string();
        let update = format!(
            "UPDATE bookings \
             SET status = $2, \
                 payment_status = COALESCE($3, payment_status), \
                 admin_notes = CASE WHEN admin_notes = '' THEN $4 \
                                    ELSE admin_notes || E'\\n' || $4 END \
             WHERE booking_id = $1 AND status = ANY($5) \
             RETURNING {BOOKING_COLUMNS}"
        );

        let tx_work = async {
            let mut tx = pool.begin().await?;

            let updated = sqlx::query_as::<_, Booking>(&update)
                .bind(&booking_id)
                .bind(change.new_status)
                .bind(change.payment_status)
                .bind(&change.audit_note)
                .bind(&change.expected_from)
                .fetch_optional(&mut *tx)
                .await?;

            let updated = match updated {
                Some(b) => b,
                None => {
                    tx.rollback().await?;
                    return Ok(None);
                }
            };

            if let Some(flag) = change.room_available_flag {
                sqlx::query("UPDATE rooms SET available_flag = $2 WHERE room_number = $1")
                    .bind(&updated.room_number)
                    .bind(flag)
                    .execute(&mut *tx)
                    .await?;
            }

            tx.commit().await?;
            Ok(Some(updated))
        };

        match self.bounded(tx_work).await? {
            Some(updated) => Ok(updated),
            // Guard failed at commit time: report the real current status.
            None => {
                let current = self.booking(&booking_id).await?.ok_or_else(|| {
                    EngineError::not_found(format!("booking {booking_id} does not exist"))
                })?;
                Err(EngineError::InvalidTransition {
                    from: current.status,
                    attempted: change.new_status,
                })
            }
        }
    }

    async fn insert_payment(&self, record: &PaymentRecord) -> EngineResult<()> {
        self.bounded(
            sqlx::query(
                "INSERT INTO payments (payment_id, booking_id, amount, record_type, created_at) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(&record.payment_id)
            .bind(&record.booking_id)
            .bind(record.amount)
            .bind(&record.record_type)
            .bind(record.created_at)
            .execute(&self.db.pool),
        )
        .await?;
        Ok(())
    }
}
