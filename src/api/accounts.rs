use axum::{
    Extension, Json,
    extract::{Path, State},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::types::AccountDto;
use super::{ApiError, ApiResponse, AppState};
use crate::db::{Account, Role};
use crate::services::AccountUpdate;

#[derive(Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub password: String,
    #[serde(default = "default_role")]
    pub role: String,
}

fn default_role() -> String {
    Role::User.as_str().to_string()
}

#[derive(Serialize)]
pub struct RegisterResponse {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub api_key: String,
}

#[derive(Deserialize)]
pub struct UpdateAccountRequest {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// POST /accounts
/// Create an account; the response carries the freshly issued API key
pub async fn register(
    State(state): State<Arc<AppState>>,
    Extension(requester): Extension<Account>,
    Json(payload): Json<RegisterRequest>,
) -> Result<Json<ApiResponse<RegisterResponse>>, ApiError> {
    let (account, api_key) = state
        .accounts()
        .register(&payload.username, &payload.password, &payload.role)
        .await?;

    tracing::info!(
        "Account {} ({}) created by {}",
        account.username,
        account.role.as_str(),
        requester.username
    );

    Ok(Json(ApiResponse::success(RegisterResponse {
        id: account.id,
        username: account.username,
        role: account.role,
        api_key,
    })))
}

/// GET /accounts
pub async fn list_accounts(
    State(state): State<Arc<AppState>>,
) -> Result<Json<ApiResponse<Vec<AccountDto>>>, ApiError> {
    let accounts = state.accounts().list().await?;

    Ok(Json(ApiResponse::success(
        accounts.into_iter().map(AccountDto::from).collect(),
    )))
}

/// PUT /accounts/{id}
/// Partial update; absent fields are left untouched
pub async fn update_account(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i32>,
    Json(payload): Json<UpdateAccountRequest>,
) -> Result<Json<ApiResponse<AccountDto>>, ApiError> {
    let account = state
        .accounts()
        .update(
            id,
            AccountUpdate {
                username: payload.username,
                password: payload.password,
                role: payload.role,
            },
        )
        .await?;

    Ok(Json(ApiResponse::success(AccountDto::from(account))))
}
