//! Review Warden server binary.
//!
//! Wires the Gitea client, the engine registry, the workspace manager, and
//! the background job runner together behind an axum webhook endpoint.

use std::env;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tracing::info;
use tracing_subscriber::EnvFilter;

use review_warden_core::command::CommandParser;
use review_warden_core::session::InMemorySessionStore;
use review_warden_core::workspace::WorkspaceManager;
use review_warden_core::ReviewWarden;
use review_warden_developer_platforms::gitea::GiteaProvider;
use review_warden_engines::registry::EngineRegistry;

mod config;
mod errors;
mod jobs;
mod signature;
mod webhook;

use config::{load_config, ServerConfig, DEFAULT_CONFIG_PATH};
use errors::ServerError;
use jobs::JobRunner;
use webhook::AppState;

/// Environment variable naming the configuration file.
const CONFIG_PATH_ENV: &str = "REVIEW_WARDEN_CONFIG";

#[tokio::main]
async fn main() -> Result<(), ServerError> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .init();

    info!("Starting Review Warden");

    let config_path =
        env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| DEFAULT_CONFIG_PATH.to_string());
    let config = load_config(&config_path)?;

    let state = build_state(&config)?;
    let addr = format!("{}:{}", config.server.host, config.server.port);

    let app = Router::new()
        .route("/health", get(webhook::handle_health))
        .route("/webhook", post(webhook::handle_webhook))
        .with_state(state.clone());

    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(address = addr.as_str(), "Listening for webhooks");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    // The router's clone of the state is gone once serving stops, so the
    // runner can be reclaimed and drained.
    info!("Shutting down, waiting for in-flight reviews");
    if let Ok(state) = Arc::try_unwrap(state) {
        state.runner.shutdown().await;
    }
    info!("Shutdown complete");

    Ok(())
}

fn build_state(config: &ServerConfig) -> Result<Arc<AppState>, ServerError> {
    let provider = GiteaProvider::new(&config.gitea.base_url, &config.gitea.token)
        .map_err(|e| ServerError::InitError(format!("Failed to build the Gitea client: {}", e)))?;

    let registry = EngineRegistry::with_builtin_engines(
        &config.review.claude_cli_path,
        &config.review.codex_cli_path,
        Duration::from_secs(config.review.engine_timeout_secs),
    );

    let mut workspaces = WorkspaceManager::new(&config.review.work_dir)
        .map_err(|e| ServerError::InitError(format!("Failed to prepare the work root: {}", e)))?
        .with_clone_timeout(Duration::from_secs(config.review.clone_timeout_secs));
    if !config.review.shallow_clone {
        workspaces = workspaces.with_full_clone();
    }

    let sessions = Arc::new(InMemorySessionStore::new());

    let warden = Arc::new(
        ReviewWarden::new(
            provider,
            registry,
            workspaces,
            sessions,
            config.review.engine.clone(),
        )
        .with_repository_configs(config.repository_engine_configs()),
    );

    let runner = JobRunner::start(warden, config.review.max_concurrent_jobs);

    Ok(Arc::new(AppState {
        runner,
        command_parser: CommandParser::new(config.gitea.bot_username.clone()),
        webhook_secret: config.webhook.secret.clone(),
        repository_secrets: config.repository_webhook_secrets(),
    }))
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "Failed to listen for the shutdown signal");
    }
}
