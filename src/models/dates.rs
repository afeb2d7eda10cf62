use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::errors::{EngineError, EngineResult};

/// A stay as a half-open date interval: the guest holds the room from
/// `check_in` (inclusive) to `check_out` (exclusive). Checkout day is free
/// for the next arrival.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StayDates {
    pub check_in: NaiveDate,
    pub check_out: NaiveDate,
}

impl StayDates {
    pub fn new(check_in: NaiveDate, check_out: NaiveDate) -> EngineResult<Self> {
        if check_out <= check_in {
            return Err(EngineError::validation(format!(
                "check_out_date ({check_out}) must be after check_in_date ({check_in})"
            )));
        }
        Ok(Self {
            check_in,
            check_out,
        })
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }

    /// Half-open interval intersection, the conflict-detection rule. A stay
    /// starting exactly on another stay's checkout date does NOT conflict
    /// (same-day turnover).
    pub fn conflicts_with(&self, other: &StayDates) -> bool {
        self.check_in < other.check_out && other.check_in < self.check_out
    }

    /// Every calendar date the stay touches, check-in through checkout
    /// INCLUSIVE. The departing guest is still in house on checkout day, so
    /// calendar views list them under that date. This is deliberately a
    /// different rule from `conflicts_with`.
    pub fn calendar_days(&self) -> impl Iterator<Item = NaiveDate> {
        let end = self.check_out;
        self.check_in.iter_days().take_while(move |d| *d <= end)
    }

    /// Whether `date` falls inside the inclusive calendar span.
    pub fn in_house_on(&self, date: NaiveDate) -> bool {
        self.check_in <= date && date <= self.check_out
    }

    /// The earliest moment of the check-in day, for cancellation-window math.
    pub fn check_in_start(&self) -> chrono::NaiveDateTime {
        self.check_in.and_time(chrono::NaiveTime::MIN)
    }
}
