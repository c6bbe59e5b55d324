//! Request handlers for the API endpoints.

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;

use super::AppState;
use super::types::{ErrorResponse, StepQuery};
use crate::io::PublicationRow;
use crate::sensor::PublishedState;

/// `GET /sensors` → 200 + `Vec<PublishedState>` JSON
pub async fn list_sensors(State(state): State<Arc<AppState>>) -> Json<Vec<PublishedState>> {
    Json(state.sensors.clone())
}

/// Returns the latest publication of one sensor.
///
/// `GET /sensors/{unique_id}` → 200 + `PublishedState` JSON
/// `GET /sensors/unknown` → 404 + `ErrorResponse`
pub async fn get_sensor(
    State(state): State<Arc<AppState>>,
    Path(unique_id): Path<String>,
) -> impl IntoResponse {
    state
        .sensors
        .iter()
        .find(|s| s.unique_id == unique_id)
        .cloned()
        .map(Json)
        .ok_or_else(|| {
            (
                StatusCode::NOT_FOUND,
                Json(ErrorResponse::new(format!("unknown sensor \"{unique_id}\""))),
            )
        })
}

/// Returns the publication log, optionally filtered by step range.
///
/// `GET /publications` → 200 + `Vec<PublicationRow>` JSON
/// `GET /publications?from=N&to=M` → filtered range (inclusive)
/// `GET /publications?from=10&to=5` → 400 + `ErrorResponse`
pub async fn get_publications(
    State(state): State<Arc<AppState>>,
    Query(query): Query<StepQuery>,
) -> impl IntoResponse {
    let from = query.from.unwrap_or(0);
    let to = query.to.unwrap_or(usize::MAX);

    if from > to {
        return Err((
            StatusCode::BAD_REQUEST,
            Json(ErrorResponse::new(format!(
                "`from` ({from}) must be <= `to` ({to})"
            ))),
        ));
    }

    let rows: Vec<PublicationRow> = state
        .publications
        .iter()
        .filter(|r| r.step >= from && r.step <= to)
        .cloned()
        .collect();

    Ok(Json(rows))
}
