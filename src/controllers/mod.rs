pub mod bookings;
pub mod occupancy;
pub mod rooms;

use axum::Router;
use std::sync::Arc;

pub fn routes() -> Router<Arc<crate::AppState>> {
    Router::new()
        .merge(rooms::routes())
        .merge(bookings::routes())
        .merge(occupancy::routes())
}
