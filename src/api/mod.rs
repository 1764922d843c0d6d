use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::db::Store;
use crate::services::{AccountService, Authenticator};

pub mod accounts;
pub mod auth;
mod error;
pub mod readings;
pub mod system;
mod types;

pub use error::ApiError;
pub use types::*;

pub struct AppState {
    config: Config,
    store: Store,
}

impl AppState {
    #[must_use]
    pub const fn config(&self) -> &Config {
        &self.config
    }

    #[must_use]
    pub const fn store(&self) -> &Store {
        &self.store
    }

    #[must_use]
    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(self.store.clone())
    }

    #[must_use]
    pub fn accounts(&self) -> AccountService {
        AccountService::new(self.store.clone(), self.config.security.clone())
    }
}

pub async fn create_app_state(config: Config) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    Ok(Arc::new(AppState { config, store }))
}

pub fn router(state: Arc<AppState>) -> Router {
    let user_routes = Router::new()
        .route("/readings", post(readings::add_reading))
        .route("/readings", get(readings::list_readings))
        .route("/system/health", get(system::get_health))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_user,
        ));

    let admin_routes = Router::new()
        .route("/accounts", post(accounts::register))
        .route("/accounts", get(accounts::list_accounts))
        .route("/accounts/{id}", put(accounts::update_account))
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            auth::require_admin,
        ));

    let api_router = Router::new()
        .merge(user_routes)
        .merge(admin_routes)
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let cors_origins = &state.config().server.cors_allowed_origins;
    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .nest("/api", api_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
}
