use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

/// A payment ledger entry tied to a booking. Written by checkout
/// reconciliation when extra charges are levied.
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct PaymentRecord {
    pub payment_id: String,
    pub booking_id: String,
    /// Minor units.
    pub amount: i64,
    /// e.g. "additional_charges".
    pub record_type: String,
    pub created_at: NaiveDateTime,
}

impl PaymentRecord {
    pub fn additional_charges(booking_id: &str, amount: i64) -> Self {
        Self {
            payment_id: format!("PAY-{}", &uuid::Uuid::new_v4().simple().to_string()[..8].to_uppercase()),
            booking_id: booking_id.to_string(),
            amount,
            record_type: "additional_charges".to_string(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }
}
