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
use crate::services::occupancy::{OccupancyAggregator, RoomFilter};
use crate::AppState;

pub fn routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/occupancy", get(occupancy_report))
        .route("/occupancy/calendar", get(occupancy_calendar))
}

#[derive(Debug, Deserialize)]
struct CalendarQuery {
    from: Option<NaiveDate>,
    to: Option<NaiveDate>,
}

// GET /api/occupancy/calendar?from=2024-01-01&to=2024-01-31
// Dates index bookings check-in through checkout inclusive: a departing
// guest still shows under the departure day.
async fn occupancy_calendar(
    State(state): State<Arc<AppState>>,
    Query(params): Query<CalendarQuery>,
) -> Result<impl IntoResponse, EngineError> {
    if let (Some(from), Some(to)) = (params.from, params.to) {
        if to < from {
            return Err(EngineError::validation("to must not precede from"));
        }
    }

    let aggregator = OccupancyAggregator::new(state.store.clone());
    let calendar = aggregator.calendar(params.from, params.to).await?;
    Ok(Json(json!({
        "success": true,
        "days": calendar.len(),
        "calendar": calendar,
    })))
}

#[derive(Debug, Deserialize)]
struct OccupancyQuery {
    date: NaiveDate,
    category: Option<String>,
    room: Option<String>,
}

// GET /api/occupancy?date=2024-01-11&category=Deluxe
async fn occupancy_report(
    State(state): State<Arc<AppState>>,
    Query(params): Query<OccupancyQuery>,
) -> Result<impl IntoResponse, EngineError> {
    let filter = RoomFilter {
        category: params.category,
        room_number: params.room,
    };
    let aggregator = OccupancyAggregator::new(state.store.clone());
    let snapshot = aggregator.occupancy_on(params.date, &filter).await?;
    Ok(Json(json!({
        "success": true,
        "date": params.date,
        "occupancy": snapshot,
    })))
}
