//! Tripwise HTTP API.

pub mod api;
pub mod api_admin;
pub mod api_auth;
pub mod api_budget;
pub mod api_map;
pub mod api_travel;
pub mod api_voice;
pub mod config;
pub mod middleware;
pub mod token;

use api::ApiError;
use axum::{
    extract::DefaultBodyLimit,
    http::{header, HeaderValue, Method},
    middleware::from_fn,
    routing::{get, post, put},
    Extension, Json, Router,
};
use chrono::{SecondsFormat, Utc};
use config::{AuthConfig, RateLimitConfig};
use middleware::RateLimiter;
use serde_json::{json, Value};
use std::sync::Arc;
use token::TokenKeys;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tripwise_ai::AiClient;
use tripwise_db::DbPool;
use tripwise_map::MapClient;
use tripwise_voice::SttService;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    pub pool: DbPool,
    /// Session token signing keys.
    pub tokens: TokenKeys,
    /// Password hashing cost and admin bootstrap list.
    pub auth: AuthConfig,
    pub rate_limit: RateLimitConfig,
    pub rate_limiter: RateLimiter,
    pub stt: Arc<SttService>,
    pub ai: Arc<AiClient>,
    pub map: Arc<MapClient>,
    /// Origin allowed by CORS.
    pub frontend_url: String,
}

/// Maximum request body size (10 MiB), covering JSON and audio uploads.
const MAX_REQUEST_BODY_BYTES: usize = 10 * 1024 * 1024;

async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "service": "tripwise",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().to_rfc3339_opts(SecondsFormat::Secs, true),
    }))
}

async fn not_found() -> ApiError {
    ApiError::NotFound("API endpoint does not exist".to_string())
}

fn cors_layer(frontend_url: &str) -> CorsLayer {
    let layer = CorsLayer::new()
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([header::AUTHORIZATION, header::CONTENT_TYPE])
        .allow_credentials(true);
    match HeaderValue::from_str(frontend_url.trim_end_matches('/')) {
        Ok(origin) => layer.allow_origin(origin),
        Err(_) => {
            tracing::warn!(frontend_url, "invalid frontend_url, CORS origins disabled");
            layer
        }
    }
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let auth_routes = Router::new()
        .route("/api/auth/register", post(api_auth::register_handler))
        .route("/api/auth/login", post(api_auth::login_handler))
        .merge(
            Router::new()
                .route("/api/auth/me", get(api_auth::me_handler))
                .route("/api/auth/profile", put(api_auth::update_profile_handler))
                .route_layer(from_fn(middleware::require_auth)),
        );

    let travel_routes = Router::new()
        .route(
            "/api/travel/plans",
            get(api_travel::list_plans_handler).post(api_travel::create_plan_handler),
        )
        .route(
            "/api/travel/plans/ai-generate",
            post(api_travel::generate_plan_handler),
        )
        .route(
            "/api/travel/plans/{id}",
            get(api_travel::get_plan_handler)
                .put(api_travel::update_plan_handler)
                .delete(api_travel::delete_plan_handler),
        )
        .route("/api/travel/advice", post(api_travel::advice_handler))
        .route(
            "/api/travel/search-destination",
            get(api_travel::search_destination_handler),
        )
        .route("/api/travel/stats", get(api_travel::stats_handler))
        .route_layer(from_fn(middleware::require_auth));

    let budget_routes = Router::new()
        .route(
            "/api/budget/plans/{planId}/items",
            get(api_budget::list_items_handler).post(api_budget::create_item_handler),
        )
        .route(
            "/api/budget/items/{id}",
            put(api_budget::update_item_handler).delete(api_budget::delete_item_handler),
        )
        .route(
            "/api/budget/plans/{planId}/summary",
            get(api_budget::summary_handler),
        )
        .route(
            "/api/budget/plans/{planId}/analyze",
            post(api_budget::analyze_handler),
        )
        .route(
            "/api/budget/plans/{planId}/categories",
            get(api_budget::categories_handler),
        )
        .route(
            "/api/budget/plans/{planId}/export",
            get(api_budget::export_handler),
        )
        .route_layer(from_fn(middleware::require_auth));

    let voice_routes = Router::new()
        .route("/api/voice/recognize", post(api_voice::recognize_handler))
        .route(
            "/api/voice/recognize-stream",
            post(api_voice::recognize_stream_handler)
                .layer(DefaultBodyLimit::max(api_voice::STREAM_BODY_LIMIT)),
        )
        .route("/api/voice/status", get(api_voice::status_handler))
        .route("/api/voice/synthesize", post(api_voice::synthesize_handler))
        .route("/api/voice/voices", get(api_voice::voices_handler))
        .route_layer(from_fn(middleware::require_auth));

    let map_routes = Router::new()
        .route("/api/map/geocode", post(api_map::geocode_handler))
        .route(
            "/api/map/reverse-geocode",
            post(api_map::reverse_geocode_handler),
        )
        .route("/api/map/search-poi", get(api_map::search_poi_handler))
        .route("/api/map/driving-route", post(api_map::driving_route_handler))
        .route("/api/map/transit-route", post(api_map::transit_route_handler))
        .route_layer(from_fn(middleware::require_auth))
        .merge(
            Router::new()
                .route("/api/map/weather", get(api_map::weather_handler))
                .route("/api/map/ip-location", get(api_map::ip_location_handler))
                .route("/api/map/status", get(api_map::status_handler))
                .route("/api/map/config", get(api_map::config_handler))
                .route_layer(from_fn(middleware::optional_auth)),
        );

    // Layers run outermost-last: authentication before the role check.
    let admin_routes = Router::new()
        .route("/api/admin/stats", get(api_admin::stats_handler))
        .route_layer(from_fn(middleware::require_admin))
        .route_layer(from_fn(middleware::require_auth));

    let cors = cors_layer(&state.frontend_url);

    Router::new()
        .route("/health", get(health))
        .merge(auth_routes)
        .merge(travel_routes)
        .merge(budget_routes)
        .merge(voice_routes)
        .merge(map_routes)
        .merge(admin_routes)
        .fallback(not_found)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(from_fn(middleware::rate_limit_middleware))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(Arc::new(state)))
}
