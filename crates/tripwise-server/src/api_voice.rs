//! Speech recognition handlers.

use crate::api::{non_blank, ok, unavailable, ApiError, ApiResult};
use crate::AppState;
use axum::{
    body::Bytes,
    extract::{
        multipart::{Multipart, MultipartRejection},
        rejection::JsonRejection,
        Extension,
    },
    http::{header, HeaderMap},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tripwise_types::ApiResponse;
use tripwise_voice::{Transcript, VoiceProfile, SUPPORTED_FORMATS, VOICES};

const SERVICE_NAME: &str = "iFlytek speech recognition";
const DEFAULT_VOICE: &str = "xiaoyan";

/// Raw-body limit for `/recognize-stream`.
pub const STREAM_BODY_LIMIT: usize = 5 * 1024 * 1024;

#[derive(Debug, Deserialize)]
pub struct SynthesizeRequest {
    pub text: Option<String>,
    pub voice: Option<String>,
    pub speed: Option<u8>,
    pub volume: Option<u8>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Synthesis {
    pub audio_url: Option<String>,
    pub text: String,
    pub voice: &'static str,
    pub speed: u8,
    pub volume: u8,
    /// Estimated seconds of speech.
    pub duration: usize,
}

fn is_audio(content_type: Option<&str>) -> bool {
    content_type.is_some_and(|ct| ct.trim().to_ascii_lowercase().starts_with("audio/"))
}

/// Handler for `POST /api/voice/recognize`.
///
/// Expects a multipart upload with the recording in the `audio` field.
pub async fn recognize_handler(
    Extension(state): Extension<Arc<AppState>>,
    multipart: Result<Multipart, MultipartRejection>,
) -> ApiResult<Transcript> {
    let mut multipart = multipart.map_err(|e| ApiError::BadRequest(e.body_text()))?;
    let mut audio = None;
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ApiError::BadRequest(e.body_text()))?
    {
        if field.name() != Some("audio") {
            continue;
        }
        if !is_audio(field.content_type()) {
            return Err(ApiError::BadRequest("only audio files are supported".to_string()));
        }
        audio = Some(
            field
                .bytes()
                .await
                .map_err(|e| ApiError::BadRequest(e.body_text()))?,
        );
        break;
    }
    let audio = audio
        .filter(|a| !a.is_empty())
        .ok_or_else(|| ApiError::BadRequest("an audio file is required".to_string()))?;

    tracing::info!(bytes = audio.len(), "speech recognition requested");
    let transcript = state.stt.recognize(&audio).await?;
    ok(transcript, "speech recognized")
}

/// Handler for `POST /api/voice/recognize-stream`.
///
/// The request body is the raw recording with an `audio/*` content type.
pub async fn recognize_stream_handler(
    Extension(state): Extension<Arc<AppState>>,
    headers: HeaderMap,
    body: Bytes,
) -> ApiResult<Transcript> {
    let content_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok());
    if !is_audio(content_type) || body.is_empty() {
        return Err(ApiError::BadRequest("audio data is required".to_string()));
    }

    tracing::info!(bytes = body.len(), "streaming speech recognition requested");
    let transcript = state.stt.recognize(&body).await?;
    let message = if transcript.is_final {
        "speech recognition complete"
    } else {
        "speech recognition in progress"
    };
    ok(transcript, message)
}

/// Handler for `GET /api/voice/status`.
pub async fn status_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<ApiResponse<Value>> {
    let missing = state.stt.config().missing();
    if missing.is_empty() {
        Json(ApiResponse::ok(
            json!({
                "service": SERVICE_NAME,
                "status": "available",
                "features": ["file recognition", "stream recognition"],
                "supportedFormats": SUPPORTED_FORMATS,
            }),
            "speech recognition is running",
        ))
    } else {
        unavailable(
            json!({
                "service": SERVICE_NAME,
                "status": "unavailable",
                "error": format!("missing configuration: {}", missing.join(", ")),
            }),
            "speech recognition is not configured",
        )
    }
}

/// Handler for `POST /api/voice/synthesize`.
///
/// Validates the request and echoes it back; no audio is produced yet.
pub async fn synthesize_handler(
    payload: Result<Json<SynthesizeRequest>, JsonRejection>,
) -> ApiResult<Synthesis> {
    let Json(payload) = payload?;
    let text = non_blank(payload.text)
        .ok_or_else(|| ApiError::BadRequest("text to synthesize is required".to_string()))?;
    let voice_id = non_blank(payload.voice).unwrap_or_else(|| DEFAULT_VOICE.to_string());
    let voice = VoiceProfile::find(&voice_id)
        .ok_or_else(|| ApiError::BadRequest(format!("unknown voice: {voice_id}")))?;
    let speed = payload.speed.unwrap_or(50);
    let volume = payload.volume.unwrap_or(50);
    if speed > 100 || volume > 100 {
        return Err(ApiError::BadRequest(
            "speed and volume must be between 0 and 100".to_string(),
        ));
    }

    let duration = text.chars().count().div_ceil(3);
    ok(
        Synthesis {
            audio_url: None,
            text,
            voice: voice.id,
            speed,
            volume,
            duration,
        },
        "speech synthesis is not available yet",
    )
}

/// Handler for `GET /api/voice/voices`.
pub async fn voices_handler() -> ApiResult<&'static [VoiceProfile]> {
    ok(&VOICES[..], "voices fetched")
}
