use axum::{
    body::Body,
    extract::ConnectInfo,
    http::{header, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};
use tripwise_plans::{get_user, PlanError, User};
use tripwise_types::UserRole;

use crate::api::{with_conn, ApiError};
use crate::token::TokenError;
use crate::AppState;

/// The authenticated user, stored in request extensions.
#[derive(Clone, Debug)]
pub struct CurrentUser(pub User);

/// The user behind an optional token, if any.
#[derive(Clone, Debug, Default)]
pub struct MaybeUser(pub Option<User>);

fn app_state(req: &Request<Body>) -> Result<Arc<AppState>, ApiError> {
    req.extensions()
        .get::<Arc<AppState>>()
        .cloned()
        .ok_or_else(|| ApiError::InternalServerError("app state missing".to_string()))
}

fn bearer_token(req: &Request<Body>) -> Option<String> {
    let value = req.headers().get(header::AUTHORIZATION)?.to_str().ok()?;
    value
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|t| !t.is_empty())
        .map(str::to_string)
}

/// Resolves a token to a live user row.
async fn authenticate(state: &Arc<AppState>, token: &str) -> Result<User, ApiError> {
    let claims = state.tokens.verify(token).map_err(|e| match e {
        TokenError::Expired => ApiError::Unauthorized("token has expired".to_string()),
        _ => ApiError::Unauthorized("invalid token".to_string()),
    })?;

    with_conn(state, move |conn| match get_user(conn, &claims.user_id) {
        Ok(user) => Ok(user),
        Err(PlanError::NotFound(_)) => Err(ApiError::Unauthorized(
            "user does not exist or has been deleted".to_string(),
        )),
        Err(e) => Err(e.into()),
    })
    .await
}

/// Rejects requests without a valid `Authorization: Bearer` token.
pub async fn require_auth(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let state = app_state(&req)?;
    let token = bearer_token(&req)
        .ok_or_else(|| ApiError::Unauthorized("access token missing".to_string()))?;

    let user = authenticate(&state, &token).await?;
    req.extensions_mut().insert(CurrentUser(user));
    Ok(next.run(req).await)
}

/// Attaches the user when a valid token is present; never rejects.
pub async fn optional_auth(mut req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let state = app_state(&req)?;
    let user = match bearer_token(&req) {
        Some(token) => match authenticate(&state, &token).await {
            Ok(user) => Some(user),
            Err(e) => {
                tracing::debug!(error = %e, "optional authentication failed");
                None
            }
        },
        None => None,
    };
    req.extensions_mut().insert(MaybeUser(user));
    Ok(next.run(req).await)
}

/// Requires an admin. Must run after [`require_auth`].
pub async fn require_admin(req: Request<Body>, next: Next) -> Result<Response, ApiError> {
    let Some(CurrentUser(user)) = req.extensions().get::<CurrentUser>() else {
        return Err(ApiError::Unauthorized("admin privileges required".to_string()));
    };
    if user.role != UserRole::Admin {
        tracing::warn!(user_id = %user.id, "non-admin attempted admin endpoint");
        return Err(ApiError::Forbidden(
            "insufficient permissions, admin role required".to_string(),
        ));
    }
    Ok(next.run(req).await)
}

/// In-memory fixed-window rate limiter keyed by client IP.
#[derive(Clone, Debug)]
pub struct RateLimiter {
    state: Arc<Mutex<HashMap<IpAddr, (u32, Instant)>>>,
}

impl RateLimiter {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HashMap::new())),
        }
    }

    /// Counts a request from `ip`.
    ///
    /// Returns `Err` with the time left in the window once `limit` requests
    /// have been made within `window`.
    pub fn check(&self, ip: IpAddr, limit: u32, window: Duration) -> Result<(), Duration> {
        let mut state = match self.state.lock() {
            Ok(guard) => guard,
            Err(poisoned) => {
                tracing::error!("rate limiter lock poisoned, recovering with stale state");
                poisoned.into_inner()
            }
        };
        let now = Instant::now();

        // Evict expired windows only; clearing everything would reset active limits.
        if state.len() > 10000 {
            state.retain(|_, (_, start)| now.duration_since(*start) <= window);
        }

        let (count, start) = state.entry(ip).or_insert((0, now));
        if now.duration_since(*start) > window {
            *count = 1;
            *start = now;
            return Ok(());
        }

        *count += 1;
        if *count <= limit {
            Ok(())
        } else {
            Err(window.saturating_sub(now.duration_since(*start)))
        }
    }
}

impl Default for RateLimiter {
    fn default() -> Self {
        Self::new()
    }
}

/// Rate limiting middleware.
pub async fn rate_limit_middleware(req: Request<Body>, next: Next) -> Response {
    let state = match app_state(&req) {
        Ok(state) => state,
        Err(e) => return e.into_response(),
    };

    // ConnectInfo is always present behind `into_make_service_with_connect_info`.
    let Some(ConnectInfo(addr)) = req.extensions().get::<ConnectInfo<SocketAddr>>().copied()
    else {
        return StatusCode::INTERNAL_SERVER_ERROR.into_response();
    };

    let limits = state.rate_limit;
    match state.rate_limiter.check(
        addr.ip(),
        limits.max_requests,
        Duration::from_secs(limits.window_secs),
    ) {
        Ok(()) => next.run(req).await,
        Err(remaining) => {
            tracing::debug!(ip = %addr.ip(), "rate limit exceeded");
            ApiError::TooManyRequests {
                retry_after_secs: remaining.as_secs().max(1),
            }
            .into_response()
        }
    }
}
