use axum::{Json, extract::State};
use serde::Serialize;
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};

#[derive(Serialize)]
pub struct HealthResponse {
    pub version: String,
    pub database: String,
}

/// GET /system/health
pub async fn get_health(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<HealthResponse>>, ApiError> {
    state
        .store()
        .ping()
        .await
        .map_err(|e| ApiError::DatabaseError(e.to_string()))?;

    Ok(Json(ApiResponse::success(HealthResponse {
        version: env!("CARGO_PKG_VERSION").to_string(),
        database: "ok".to_string(),
    })))
}
