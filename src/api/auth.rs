use axum::{
    Json,
    extract::{Request, State},
    http::HeaderMap,
    middleware::Next,
    response::Response,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::{ApiError, ApiResponse, AppState};
use crate::db::Role;

// ============================================================================
// Request/Response Types
// ============================================================================

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub username: String,
    pub role: Role,
    pub api_key: String,
}

// ============================================================================
// Middleware
// ============================================================================

/// Authentication middleware for routes any valid account may call.
pub async fn require_user(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, &headers, Role::User, request, next).await
}

/// Authentication middleware for admin-only routes.
pub async fn require_admin(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    authorize(&state, &headers, Role::Admin, request, next).await
}

/// Authorization happens exactly once, here; handlers and services trust
/// that the account in the request extensions already cleared the gate.
async fn authorize(
    state: &AppState,
    headers: &HeaderMap,
    min_role: Role,
    mut request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // A missing header authenticates as the empty key and is rejected
    // without a store round-trip.
    let api_key = extract_api_key(headers).unwrap_or_default();

    let account = state
        .authenticator()
        .authenticate(&api_key, min_role)
        .await?;

    request.extensions_mut().insert(account);
    Ok(next.run(request).await)
}

/// Extract API key from:
/// 1. `X-Api-Key` header
/// 2. `Authorization: Bearer <api_key>` header
fn extract_api_key(headers: &HeaderMap) -> Option<String> {
    if let Some(api_key) = headers.get("X-Api-Key")
        && let Ok(key_str) = api_key.to_str()
    {
        return Some(key_str.to_string());
    }

    if let Some(auth_header) = headers.get("Authorization")
        && let Ok(auth_str) = auth_header.to_str()
        && let Some(token) = auth_str.strip_prefix("Bearer ")
    {
        return Some(token.trim().to_string());
    }

    None
}

// ============================================================================
// Handlers
// ============================================================================

/// POST /auth/login
/// Exchange username and password for the account's API key
pub async fn login(
    State(state): State<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<ApiResponse<LoginResponse>>, ApiError> {
    if payload.username.is_empty() {
        return Err(ApiError::validation("Username is required"));
    }
    if payload.password.is_empty() {
        return Err(ApiError::validation("Password is required"));
    }

    let account = state
        .accounts()
        .verify_credentials(&payload.username, &payload.password)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("Invalid credentials".to_string()))?;

    Ok(Json(ApiResponse::success(LoginResponse {
        username: account.username,
        role: account.role,
        api_key: account.api_key,
    })))
}
