pub mod api;
pub mod cli;
pub mod config;
pub mod db;
pub mod entities;
pub mod services;

use clap::Parser;
use tokio::signal;
use tracing::{error, info, warn};
use tracing_subscriber::EnvFilter;

use cli::{Cli, Commands};
pub use config::Config;
use services::bootstrap;

pub async fn run() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => Config::load_from_path(path)?,
        None => Config::load()?,
    };
    config.validate()?;

    init_tracing(&config);

    match cli.command.unwrap_or(Commands::Serve) {
        Commands::Serve => run_server(config).await,
        Commands::Init => {
            if Config::create_default_if_missing()? {
                info!("Config file created. Edit config.toml and run again.");
            } else {
                info!("config.toml already exists, leaving it untouched");
            }
            Ok(())
        }
    }
}

fn init_tracing(config: &Config) {
    use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(&config.general.log_level));

    let fmt_layer = tracing_subscriber::fmt::layer();

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

async fn run_server(config: Config) -> anyhow::Result<()> {
    info!("Thermolog v{} starting...", env!("CARGO_PKG_VERSION"));

    let state = api::create_app_state(config.clone()).await?;

    // The freshly generated key is unrecoverable; this log line is the one
    // place the operator ever sees it.
    if let Some(admin) = bootstrap::ensure_admin(state.store(), &config.security).await? {
        warn!("No admin account found -> created {}", admin.username);
        warn!("Username: {}", admin.username);
        warn!("Password: {}", bootstrap::DEFAULT_ADMIN_PASSWORD);
        warn!("API Key:  {}", admin.api_key);
    }

    let port = config.server.port;
    let app = api::router(state);
    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    let server_handle = tokio::spawn(async move {
        info!("HTTP API listening at http://{}", addr);
        if let Err(e) = axum::serve(listener, app).await {
            error!("Server error: {}", e);
        }
    });

    info!("Service running. Press Ctrl+C to stop.");

    match signal::ctrl_c().await {
        Ok(()) => info!("Shutdown signal received"),
        Err(e) => error!("Error listening for shutdown: {}", e),
    }

    server_handle.abort();
    info!("Service stopped");

    Ok(())
}
