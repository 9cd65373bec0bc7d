use thiserror::Error;

#[derive(Error, Debug)]
pub enum AiError {
    #[error("LLM service is not configured, missing: {}", .0.join(", "))]
    NotConfigured(Vec<&'static str>),

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The vendor answered with a non-success status.
    #[error("API error ({status}): {message}")]
    Api { status: u16, message: String },

    #[error("unexpected API response: {0}")]
    MalformedResponse(String),
}
