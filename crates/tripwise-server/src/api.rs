//! Shared plumbing for the API handlers: the error type, the success
//! envelope and the blocking database helper.

use crate::AppState;
use axum::{
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use rusqlite::Connection;
use serde::Serialize;
use serde_json::Value;
use std::sync::Arc;
use thiserror::Error;
use tripwise_ai::AiError;
use tripwise_map::MapError;
use tripwise_plans::PlanError;
use tripwise_types::ApiResponse;
use tripwise_voice::VoiceError;

/// API error type mapping to HTTP status codes.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error("invalid input: {0}")]
    BadRequest(String),
    #[error("unauthorized: {0}")]
    Unauthorized(String),
    #[error("forbidden: {0}")]
    Forbidden(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("too many requests")]
    TooManyRequests { retry_after_secs: u64 },
    /// Details are logged, never returned to the client.
    #[error("internal server error: {0}")]
    InternalServerError(String),
    /// A vendor service is unconfigured or unreachable.
    #[error("service unavailable: {0}")]
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg),
            ApiError::Forbidden(msg) => (StatusCode::FORBIDDEN, msg),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Conflict(msg) => (StatusCode::CONFLICT, msg),
            ApiError::TooManyRequests { retry_after_secs } => {
                let mut response = (
                    StatusCode::TOO_MANY_REQUESTS,
                    Json(ApiResponse::error(
                        "too many requests, please try again later",
                    )),
                )
                    .into_response();
                response.headers_mut().insert(
                    axum::http::header::RETRY_AFTER,
                    axum::http::HeaderValue::from(retry_after_secs),
                );
                return response;
            }
            ApiError::InternalServerError(detail) => {
                tracing::error!(error = %detail, "request failed");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "internal server error".to_string(),
                )
            }
            ApiError::ServiceUnavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
        };

        (status, Json(ApiResponse::error(message))).into_response()
    }
}

impl From<PlanError> for ApiError {
    fn from(e: PlanError) -> Self {
        match e {
            PlanError::NotFound(what) => ApiError::NotFound(format!("{what} not found")),
            PlanError::Conflict(msg) => ApiError::Conflict(msg),
            PlanError::Invalid(msg) => ApiError::BadRequest(msg),
            PlanError::Database(_) | PlanError::Json(_) => {
                ApiError::InternalServerError(e.to_string())
            }
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl From<AiError> for ApiError {
    fn from(e: AiError) -> Self {
        match e {
            AiError::NotConfigured(_) => {
                ApiError::ServiceUnavailable("AI service is not configured".to_string())
            }
            other => {
                tracing::warn!(error = %other, "LLM call failed");
                ApiError::ServiceUnavailable(format!("AI service request failed: {other}"))
            }
        }
    }
}

impl From<MapError> for ApiError {
    fn from(e: MapError) -> Self {
        match e {
            MapError::NotConfigured => {
                ApiError::ServiceUnavailable("map service is not configured".to_string())
            }
            MapError::Vendor(info) => ApiError::BadRequest(info),
            MapError::Coordinate(e) => ApiError::BadRequest(e.to_string()),
            other => {
                tracing::warn!(error = %other, "map call failed");
                ApiError::ServiceUnavailable(
                    "map service is temporarily unavailable".to_string(),
                )
            }
        }
    }
}

impl From<VoiceError> for ApiError {
    fn from(e: VoiceError) -> Self {
        match e {
            VoiceError::NotConfigured(_) => ApiError::ServiceUnavailable(
                "speech recognition is not configured, contact the administrator".to_string(),
            ),
            VoiceError::EmptyAudio | VoiceError::TooLarge { .. } => {
                ApiError::BadRequest(e.to_string())
            }
            other => {
                tracing::warn!(error = %other, "speech recognition failed");
                ApiError::ServiceUnavailable(format!("speech recognition failed: {other}"))
            }
        }
    }
}

pub type ApiResult<T> = Result<Json<ApiResponse<T>>, ApiError>;

/// Wraps `data` in a success envelope.
pub fn ok<T: Serialize>(data: T, message: &str) -> ApiResult<T> {
    Ok(Json(ApiResponse::ok(data, message)))
}

/// Like [`ok`], with `201 Created`.
pub fn created<T: Serialize>(
    data: T,
    message: &str,
) -> Result<(StatusCode, Json<ApiResponse<T>>), ApiError> {
    Ok((StatusCode::CREATED, Json(ApiResponse::ok(data, message))))
}

/// An envelope reporting a degraded service with `200 OK`, used by the
/// status probes.
pub fn unavailable(data: Value, message: &str) -> Json<ApiResponse<Value>> {
    Json(ApiResponse {
        success: false,
        message: message.to_string(),
        data: Some(data),
    })
}

/// Runs `f` against a pooled connection on the blocking thread pool.
pub async fn with_conn<T, F>(state: &Arc<AppState>, f: F) -> Result<T, ApiError>
where
    T: Send + 'static,
    F: FnOnce(&Connection) -> Result<T, ApiError> + Send + 'static,
{
    let pool = state.pool.clone();
    tokio::task::spawn_blocking(move || {
        let conn = pool
            .get()
            .map_err(|e| ApiError::InternalServerError(format!("db connection failed: {e}")))?;
        f(&conn)
    })
    .await
    .map_err(|e| ApiError::InternalServerError(format!("task join error: {e}")))?
}

/// Returns the trimmed value, or `None` when absent or blank.
pub(crate) fn non_blank(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
