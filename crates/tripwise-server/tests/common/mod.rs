#![allow(dead_code)]

use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Method, Request, StatusCode},
    response::Response,
    Router,
};
use serde_json::Value;
use std::net::{IpAddr, Ipv4Addr, SocketAddr};
use std::sync::Arc;
use std::time::Duration;
use tower::ServiceExt;
use tripwise_ai::{AiClient, AiConfig};
use tripwise_db::{create_pool, DbRuntimeSettings};
use tripwise_map::{MapClient, MapConfig};
use tripwise_server::config::{AuthConfig, RateLimitConfig};
use tripwise_server::middleware::RateLimiter;
use tripwise_server::token::TokenKeys;
use tripwise_server::{app, AppState};
use tripwise_voice::{SttService, VoiceConfig};

pub const ADMIN_EMAIL: &str = "admin@example.com";
pub const PASSWORD: &str = "secret123";

pub fn auth_config() -> AuthConfig {
    AuthConfig {
        jwt_secret: "test-secret".to_string(),
        jwt_expires_in: "1h".to_string(),
        bcrypt_cost: 4,
        admin_emails: vec![ADMIN_EMAIL.to_string()],
    }
}

/// State with an in-memory database and no vendor credentials.
pub fn test_state() -> AppState {
    test_state_with(AiConfig::default(), MapConfig::default())
}

pub fn test_state_with(ai: AiConfig, map: MapConfig) -> AppState {
    let pool = create_pool(":memory:", DbRuntimeSettings::default()).unwrap();
    {
        let conn = pool.get().unwrap();
        tripwise_db::run_migrations(&conn).unwrap();
    }

    AppState {
        pool,
        tokens: TokenKeys::new(b"test-secret", Duration::from_secs(3600)),
        auth: auth_config(),
        rate_limit: RateLimitConfig {
            window_secs: 900,
            max_requests: 10_000,
        },
        rate_limiter: RateLimiter::new(),
        stt: Arc::new(SttService::new(VoiceConfig::default())),
        ai: Arc::new(AiClient::new(ai).unwrap()),
        map: Arc::new(MapClient::new(map).unwrap()),
        frontend_url: "http://localhost:3000".to_string(),
    }
}

pub fn peer() -> SocketAddr {
    SocketAddr::new(IpAddr::V4(Ipv4Addr::LOCALHOST), 40000)
}

/// Sends one request through a fresh clone of the router.
pub async fn send(app: &Router, mut request: Request<Body>) -> Response {
    request.extensions_mut().insert(ConnectInfo(peer()));
    app.clone().oneshot(request).await.unwrap()
}

pub fn json_request(method: Method, uri: &str, token: Option<&str>, body: Option<Value>) -> Request<Body> {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    match body {
        Some(body) => builder
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    }
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Sends a JSON request and returns the status with the decoded envelope.
pub async fn call(
    app: &Router,
    method: Method,
    uri: &str,
    token: Option<&str>,
    body: Option<Value>,
) -> (StatusCode, Value) {
    let response = send(app, json_request(method, uri, token, body)).await;
    let status = response.status();
    (status, body_json(response).await)
}

/// Registers an account and returns its token and user id.
pub async fn register(app: &Router, email: &str, name: &str) -> (String, String) {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/auth/register",
        None,
        Some(serde_json::json!({ "email": email, "password": PASSWORD, "name": name })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "register failed: {body}");
    (
        body["data"]["token"].as_str().unwrap().to_string(),
        body["data"]["user"]["id"].as_str().unwrap().to_string(),
    )
}

pub fn router() -> Router {
    app(test_state())
}
