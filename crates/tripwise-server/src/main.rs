//! Tripwise server binary.
//!
//! Loads configuration, initializes logging and the database, then serves
//! the API with graceful shutdown on SIGTERM/SIGINT.

use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;
use tripwise_ai::AiClient;
use tripwise_map::MapClient;
use tripwise_server::config::{self, Config};
use tripwise_server::middleware::RateLimiter;
use tripwise_server::token::TokenKeys;
use tripwise_server::{app, AppState};
use tripwise_voice::SttService;

fn resolve_config_path() -> (Option<String>, &'static str) {
    if let Some(path) = std::env::args()
        .nth(1)
        .filter(|value| !value.trim().is_empty())
    {
        return (Some(path), "cli-arg");
    }

    if let Ok(path) = std::env::var("TRIPWISE_CONFIG_PATH") {
        if !path.trim().is_empty() {
            return (Some(path), "env-var");
        }
    }

    (None, "default")
}

fn init_tracing(config: &Config) {
    let filter =
        EnvFilter::try_new(&config.logging.level).unwrap_or_else(|_| EnvFilter::new("info"));

    if config.logging.json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .json()
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }
}

/// Warns about vendor integrations that will answer 503.
fn report_vendor_configuration(config: &Config) {
    let voice = config.voice.missing();
    if !voice.is_empty() {
        tracing::warn!(missing = ?voice, "speech recognition disabled");
    }
    let ai = config.ai.missing();
    if !ai.is_empty() {
        tracing::warn!(missing = ?ai, "AI planning disabled");
    }
    if !config.map.has_api_key() {
        tracing::warn!("map service disabled, AMAP_API_KEY is not set");
    }
}

#[tokio::main]
async fn main() {
    let (resolved_config_path, config_source) = resolve_config_path();
    let selected_config_path = resolved_config_path.as_deref().unwrap_or("config.toml");

    let config = config::load_config(Some(selected_config_path))
        .expect("failed to load configuration: the server cannot start without valid config");

    init_tracing(&config);
    tracing::info!(
        source = config_source,
        path = selected_config_path,
        "resolved startup configuration path"
    );

    let tokens = TokenKeys::from_config(&config.auth)
        .expect("invalid auth configuration: set JWT_SECRET and a valid JWT_EXPIRES_IN");
    report_vendor_configuration(&config);

    let pool = tripwise_db::create_pool(
        &config.database.path,
        tripwise_db::DbRuntimeSettings {
            busy_timeout_ms: config.database.busy_timeout_ms,
            pool_max_size: config.database.pool_max_size,
        },
    )
    .expect("failed to create database pool: check database.path in config");

    {
        let conn = pool
            .get()
            .expect("failed to get database connection for migrations");
        let applied =
            tripwise_db::run_migrations(&conn).expect("failed to run database migrations");
        if applied > 0 {
            tracing::info!(count = applied, "applied database migrations");
        }
    }

    let state = AppState {
        pool,
        tokens,
        auth: config.auth.clone(),
        rate_limit: config.rate_limit,
        rate_limiter: RateLimiter::new(),
        stt: Arc::new(SttService::new(config.voice.clone())),
        ai: Arc::new(AiClient::new(config.ai.clone()).expect("failed to build LLM HTTP client")),
        map: Arc::new(MapClient::new(config.map.clone()).expect("failed to build map HTTP client")),
        frontend_url: config.server.frontend_url.clone(),
    };

    let app = app(state);
    let addr = SocketAddr::new(config.server.host, config.server.port);

    tracing::info!(%addr, frontend = %config.server.frontend_url, "starting tripwise server");

    let listener = TcpListener::bind(addr)
        .await
        .expect("failed to bind to address: is another process using this port?");

    axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    )
    .with_graceful_shutdown(shutdown_signal())
    .await
    .expect("server error");

    tracing::info!("tripwise server shut down");
}

/// Waits for a SIGINT (Ctrl+C) or SIGTERM signal for graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = async {
        tokio::signal::ctrl_c()
            .await
            .expect("failed to install Ctrl+C handler");
    };

    #[cfg(unix)]
    let terminate = async {
        tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler")
            .recv()
            .await;
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        () = ctrl_c => { tracing::info!("received SIGINT, initiating graceful shutdown"); }
        () = terminate => { tracing::info!("received SIGTERM, initiating graceful shutdown"); }
    }
}
