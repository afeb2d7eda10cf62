use axum::{
    extract::{Query, State},
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

use crate::errors::EngineError;
use crate::services::availability::AvailabilityCalculator;
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new().route("/rooms/availability", get(search_availability))
}

#[derive(Debug, Deserialize)]
struct AvailabilityQuery {
    category: String,
    check_in: NaiveDate,
    check_out: NaiveDate,
    guests: i32,
}

// GET /api/rooms/availability?category=Deluxe&check_in=2024-01-10&check_out=2024-01-12&guests=2
async fn search_availability(
    State(state): State<Arc<AppState>>,
    Query(params): Query<AvailabilityQuery>,
) -> Result<impl IntoResponse, EngineError> {
    if params.category.trim().is_empty() {
        return Err(EngineError::validation("category must not be empty"));
    }

    let calculator = AvailabilityCalculator::new(state.store.clone());
    let rooms = calculator
        .find_available(
            &params.category,
            params.check_in,
            params.check_out,
            params.guests,
        )
        .await?;

    Ok(Json(json!({
        "success": true,
        "count": rooms.len(),
        "rooms": rooms,
    })))
}
