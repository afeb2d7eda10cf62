pub mod booking;
pub mod dates;
pub mod payment;
pub mod room;

pub use booking::{Booking, BookingStatus, PaymentStatus};
pub use dates::StayDates;
pub use payment::PaymentRecord;
pub use room::Room;
