use serde::Serialize;

use crate::db::{Account, Role};
use crate::entities::sensor_readings;

#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl<T> ApiResponse<T> {
    pub const fn success(data: T) -> Self {
        Self {
            success: true,
            data: Some(data),
            error: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: None,
            error: Some(message.into()),
        }
    }
}

/// Output projection of an account. Built from [`Account`], which never
/// carries the password hash, so the hash cannot reach a response.
#[derive(Debug, Serialize)]
pub struct AccountDto {
    pub id: i32,
    pub username: String,
    pub role: Role,
    pub api_key: String,
    pub created_at: String,
    pub updated_at: String,
}

impl From<Account> for AccountDto {
    fn from(account: Account) -> Self {
        Self {
            id: account.id,
            username: account.username,
            role: account.role,
            api_key: account.api_key,
            created_at: account.created_at,
            updated_at: account.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ReadingDto {
    pub id: i32,
    pub temperature: f64,
    pub humidity: f64,
    pub created_at: String,
}

impl From<sensor_readings::Model> for ReadingDto {
    fn from(model: sensor_readings::Model) -> Self {
        Self {
            id: model.id,
            temperature: model.temperature,
            humidity: model.humidity,
            created_at: model.created_at,
        }
    }
}
