use crate::config::AiConfig;
use crate::error::AiError;
use crate::sign;
use chrono::Utc;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::Value;

const COMPLETIONS_PATH: &str = "/v2/app/completions";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ChatMessage {
    pub role: String,
    pub content: String,
}

impl ChatMessage {
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }
}

/// Text of the first choice plus the vendor's token accounting.
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub content: String,
    pub usage: Value,
}

#[derive(Serialize)]
struct CompletionRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    temperature: f64,
    max_tokens: u32,
    stream: bool,
}

#[derive(Deserialize)]
struct CompletionEnvelope {
    data: Option<CompletionData>,
}

#[derive(Deserialize)]
struct CompletionData {
    #[serde(default)]
    choices: Vec<Choice>,
    #[serde(default)]
    usage: Value,
}

#[derive(Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Signed client for the Bailian completion API.
#[derive(Debug, Clone)]
pub struct AiClient {
    config: AiConfig,
    http: Client,
}

impl AiClient {
    pub fn new(config: AiConfig) -> Result<Self, AiError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &AiConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.missing().is_empty()
    }

    /// Sends one chat completion request and returns the first choice.
    pub async fn complete(
        &self,
        messages: &[ChatMessage],
        temperature: f64,
        max_tokens: u32,
    ) -> Result<Completion, AiError> {
        self.config.validate()?;

        let body = serde_json::to_vec(&CompletionRequest {
            model: &self.config.model,
            messages,
            temperature,
            max_tokens,
            stream: false,
        })
        .map_err(|e| AiError::MalformedResponse(e.to_string()))?;

        let date = Utc::now().format("%a, %d %b %Y %H:%M:%S GMT").to_string();
        let nonce = hex::encode(rand::random::<[u8; 16]>());
        let acs_headers = [
            ("x-acs-version", self.config.api_version.as_str()),
            ("x-acs-signature-nonce", nonce.as_str()),
            ("x-acs-signature-method", "HMAC-SHA1"),
            ("x-acs-signature-version", "1.0"),
        ];

        let content_md5 = sign::content_md5(&body);
        let string_to_sign = sign::string_to_sign(
            "POST",
            &content_md5,
            &date,
            &sign::canonical_headers(acs_headers),
            &sign::canonical_resource(COMPLETIONS_PATH, &[]),
        );
        let authorization = sign::authorization(
            &self.config.access_key_id,
            &sign::signature(&self.config.access_key_secret, &string_to_sign),
        );

        let mut request = self
            .http
            .post(format!("{}{COMPLETIONS_PATH}", self.config.base_url()))
            .header("Content-Type", sign::CONTENT_TYPE)
            .header("Content-MD5", content_md5)
            .header("Date", date)
            .header("Authorization", authorization);
        for (name, value) in acs_headers {
            request = request.header(name, value);
        }

        let response = request.body(body).send().await?;
        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            let message = serde_json::from_str::<Value>(&text)
                .ok()
                .and_then(|v| v["message"].as_str().map(str::to_string))
                .or_else(|| status.canonical_reason().map(str::to_string))
                .unwrap_or_else(|| text.clone());
            tracing::warn!(status = status.as_u16(), %message, "LLM request rejected");
            return Err(AiError::Api {
                status: status.as_u16(),
                message,
            });
        }

        let envelope: CompletionEnvelope = response.json().await?;
        let data = envelope
            .data
            .ok_or_else(|| AiError::MalformedResponse("missing data".to_string()))?;
        let content = data
            .choices
            .into_iter()
            .next()
            .map(|c| c.message.content)
            .ok_or_else(|| AiError::MalformedResponse("no choices returned".to_string()))?;

        Ok(Completion {
            content,
            usage: data.usage,
        })
    }
}
