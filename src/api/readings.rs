use axum::{Json, extract::State};
use serde::Deserialize;
use std::sync::Arc;

use super::types::ReadingDto;
use super::{ApiError, ApiResponse, AppState};

#[derive(Deserialize)]
pub struct ReadingRequest {
    /// `temp` is accepted for older sensor firmware
    #[serde(alias = "temp")]
    pub temperature: f64,
    pub humidity: f64,
}

/// POST /readings
/// Record a temperature/humidity reading
pub async fn add_reading(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<ReadingRequest>,
) -> Result<Json<ApiResponse<ReadingDto>>, ApiError> {
    let reading = state
        .store()
        .insert_reading(payload.temperature, payload.humidity)
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(ReadingDto::from(reading))))
}

/// GET /readings
/// All recorded readings in insertion order
pub async fn list_readings(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<ReadingDto>>>, ApiError> {
    let readings = state
        .store()
        .list_readings()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(
        readings.into_iter().map(ReadingDto::from).collect(),
    )))
}
