use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};
use crate::models::{Booking, PaymentStatus};

/// Itemized extra charges levied at departure, minor units.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct ExtraCharges {
    #[serde(default)]
    pub additional_charge: i64,
    #[serde(default)]
    pub damage_charge: i64,
    #[serde(default)]
    pub other_charge: i64,
}

impl ExtraCharges {
    /// Validated sum of the itemized charges. Rejects negative values and
    /// totals that do not fit in minor-unit i64 arithmetic.
    pub fn total(&self) -> EngineResult<i64> {
        let mut total = 0i64;
        for (name, value) in [
            ("additional_charge", self.additional_charge),
            ("damage_charge", self.damage_charge),
            ("other_charge", self.other_charge),
        ] {
            if value < 0 {
                return Err(EngineError::validation(format!(
                    "{name} must not be negative"
                )));
            }
            total = total
                .checked_add(value)
                .ok_or_else(|| EngineError::validation("extra charges are out of range"))?;
        }
        Ok(total)
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct Reconciliation {
    /// base stay cost plus all extra charges, minor units.
    pub final_amount: i64,
    pub payment_status: PaymentStatus,
}

/// Checkout-time settlement: the final payable amount and the payment
/// status it implies for what the guest has paid so far.
pub fn reconcile(booking: &Booking, charges: &ExtraCharges) -> EngineResult<Reconciliation> {
    let final_amount = booking
        .base_total_amount
        .checked_add(charges.total()?)
        .ok_or_else(|| EngineError::validation("final amount is out of range"))?;
    let payment_status = if booking.paid_amount >= final_amount {
        PaymentStatus::Paid
    } else if booking.paid_amount > 0 {
        PaymentStatus::Partial
    } else {
        PaymentStatus::Pending
    };

    Ok(Reconciliation {
        final_amount,
        payment_status,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::BookingStatus;
    use proptest::prelude::*;

    fn booking_with(base: i64, paid: i64) -> Booking {
        Booking {
            booking_id: "BK-TEST0001".to_string(),
            room_number: "101".to_string(),
            guest_name: "Arman Seitkali".to_string(),
            guest_email: "arman@example.com".to_string(),
            guest_phone: "+77020000000".to_string(),
            check_in_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 10).unwrap(),
            check_out_date: chrono::NaiveDate::from_ymd_opt(2024, 1, 13).unwrap(),
            guest_count: 1,
            status: BookingStatus::CheckedIn,
            payment_status: PaymentStatus::Partial,
            base_total_amount: base,
            paid_amount: paid,
            admin_notes: String::new(),
            created_at: chrono::Utc::now().naive_utc(),
        }
    }

    #[test]
    fn sums_base_and_itemized_charges() {
        let booking = booking_with(300, 370);
        let charges = ExtraCharges {
            additional_charge: 50,
            damage_charge: 20,
            other_charge: 0,
        };
        let r = reconcile(&booking, &charges).unwrap();
        assert_eq!(r.final_amount, 370);
        assert_eq!(r.payment_status, PaymentStatus::Paid);
    }

    #[test]
    fn partial_when_something_but_not_everything_is_paid() {
        let r = reconcile(&booking_with(300, 100), &ExtraCharges::default()).unwrap();
        assert_eq!(r.final_amount, 300);
        assert_eq!(r.payment_status, PaymentStatus::Partial);
    }

    #[test]
    fn pending_when_nothing_is_paid() {
        let r = reconcile(&booking_with(300, 0), &ExtraCharges::default()).unwrap();
        assert_eq!(r.payment_status, PaymentStatus::Pending);
    }

    #[test]
    fn negative_charge_is_rejected_before_any_arithmetic() {
        let charges = ExtraCharges {
            additional_charge: -1,
            ..Default::default()
        };
        let err = reconcile(&booking_with(300, 0), &charges);
        assert!(matches!(err, Err(EngineError::Validation(_))));
    }

    #[test]
    fn oversized_charge_sum_is_rejected_not_wrapped() {
        let charges = ExtraCharges {
            additional_charge: i64::MAX,
            damage_charge: 1,
            other_charge: 0,
        };
        let err = reconcile(&booking_with(300, 0), &charges);
        assert!(matches!(err, Err(EngineError::Validation(_))));
    }

    #[test]
    fn final_amount_past_i64_max_is_rejected() {
        let charges = ExtraCharges {
            additional_charge: i64::MAX,
            ..Default::default()
        };
        let err = reconcile(&booking_with(1, 0), &charges);
        assert!(matches!(err, Err(EngineError::Validation(_))));
    }

    proptest! {
        #[test]
        fn final_amount_is_monotonic_in_each_charge(
            base in 0i64..1_000_000,
            paid in 0i64..1_000_000,
            add in 0i64..100_000,
            damage in 0i64..100_000,
            other in 0i64..100_000,
            bump in 1i64..10_000,
        ) {
            let booking = booking_with(base, paid);
            let charges = ExtraCharges { additional_charge: add, damage_charge: damage, other_charge: other };
            let baseline = reconcile(&booking, &charges).unwrap().final_amount;

            for bumped in [
                ExtraCharges { additional_charge: add + bump, ..charges },
                ExtraCharges { damage_charge: damage + bump, ..charges },
                ExtraCharges { other_charge: other + bump, ..charges },
            ] {
                prop_assert!(reconcile(&booking, &bumped).unwrap().final_amount > baseline);
            }
        }

        #[test]
        fn paid_exactly_when_covered(
            base in 0i64..1_000_000,
            paid in 0i64..1_000_000,
            add in 0i64..100_000,
        ) {
            let booking = booking_with(base, paid);
            let charges = ExtraCharges { additional_charge: add, ..Default::default() };
            let r = reconcile(&booking, &charges).unwrap();
            prop_assert_eq!(r.payment_status == PaymentStatus::Paid, paid >= r.final_amount);
        }
    }
}
