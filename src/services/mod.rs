pub mod availability;
pub mod lifecycle;
pub mod notification;
pub mod occupancy;
pub mod reconciliation;
