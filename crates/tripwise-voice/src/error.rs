use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("speech recognition is not configured, missing: {}", .0.join(", "))]
    NotConfigured(Vec<&'static str>),

    #[error("invalid speech endpoint: {0}")]
    InvalidUrl(String),

    #[error("audio data exceeds maximum size: {size} bytes (limit: {limit} bytes)")]
    TooLarge { size: usize, limit: usize },

    #[error("no audio data provided")]
    EmptyAudio,

    #[error("websocket error: {0}")]
    WebSocket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("speech vendor error {code}: {message}")]
    Vendor { code: i64, message: String },

    #[error("malformed vendor message: {0}")]
    Protocol(String),
}
