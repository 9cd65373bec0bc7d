use crate::error::AiError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

pub const DEFAULT_ENDPOINT: &str = "bailian.cn-beijing.aliyuncs.com";
pub const DEFAULT_MODEL: &str = "qwen-plus";

fn default_endpoint() -> String {
    DEFAULT_ENDPOINT.to_string()
}

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_api_version() -> String {
    "2023-06-01".to_string()
}

fn default_timeout_secs() -> u64 {
    60
}

#[derive(Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default, skip_serializing)]
    pub access_key_secret: String,
    /// Host name, or a full base URL when a scheme is given.
    #[serde(default = "default_endpoint")]
    pub endpoint: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_api_version")]
    pub api_version: String,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            access_key_id: String::new(),
            access_key_secret: String::new(),
            endpoint: default_endpoint(),
            model: default_model(),
            api_version: default_api_version(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for AiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AiConfig")
            .field("access_key_id", &self.access_key_id)
            .field("access_key_secret", &"[REDACTED]")
            .field("endpoint", &self.endpoint)
            .field("model", &self.model)
            .field("api_version", &self.api_version)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl AiConfig {
    pub fn new(access_key_id: impl Into<String>, access_key_secret: impl Into<String>) -> Self {
        Self {
            access_key_id: access_key_id.into(),
            access_key_secret: access_key_secret.into(),
            ..Self::default()
        }
    }

    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.access_key_id.is_empty() {
            missing.push("ALIYUN_BAILIAN_ACCESS_KEY_ID");
        }
        if self.access_key_secret.is_empty() {
            missing.push("ALIYUN_BAILIAN_ACCESS_KEY_SECRET");
        }
        missing
    }

    pub fn validate(&self) -> Result<(), AiError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(AiError::NotConfigured(missing))
        }
    }

    /// Scheme and authority requests are sent to. A bare host means HTTPS.
    pub fn base_url(&self) -> String {
        let endpoint = self.endpoint.trim_end_matches('/');
        if endpoint.contains("://") {
            endpoint.to_string()
        } else {
            format!("https://{endpoint}")
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}
