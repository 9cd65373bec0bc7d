use crate::error::VoiceError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::Duration;

/// Production dictation endpoint.
pub const DEFAULT_HOST_URL: &str = "wss://iat-api.xfyun.cn/v2/iat";

fn default_host_url() -> String {
    DEFAULT_HOST_URL.to_string()
}

fn default_timeout_secs() -> u64 {
    30
}

#[derive(Clone, Serialize, Deserialize)]
pub struct VoiceConfig {
    #[serde(default)]
    pub app_id: String,
    #[serde(default)]
    pub api_key: String,
    #[serde(default, skip_serializing)]
    pub api_secret: String,
    /// WebSocket endpoint. Default: the public iFlytek dictation URL.
    #[serde(default = "default_host_url")]
    pub host_url: String,
    /// How long to wait for the final result before returning what has
    /// been recognised so far. Default: 30.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

impl Default for VoiceConfig {
    fn default() -> Self {
        Self {
            app_id: String::new(),
            api_key: String::new(),
            api_secret: String::new(),
            host_url: default_host_url(),
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl fmt::Debug for VoiceConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("VoiceConfig")
            .field("app_id", &self.app_id)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("host_url", &self.host_url)
            .field("timeout_secs", &self.timeout_secs)
            .finish()
    }
}

impl VoiceConfig {
    pub fn new(
        app_id: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            app_id: app_id.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            ..Self::default()
        }
    }

    /// Lists the credential settings that are still empty.
    pub fn missing(&self) -> Vec<&'static str> {
        let mut missing = Vec::new();
        if self.app_id.is_empty() {
            missing.push("IFLYTEK_APP_ID");
        }
        if self.api_key.is_empty() {
            missing.push("IFLYTEK_API_KEY");
        }
        if self.api_secret.is_empty() {
            missing.push("IFLYTEK_API_SECRET");
        }
        missing
    }

    pub fn validate(&self) -> Result<(), VoiceError> {
        let missing = self.missing();
        if missing.is_empty() {
            Ok(())
        } else {
            Err(VoiceError::NotConfigured(missing))
        }
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validate_lists_every_missing_setting() {
        let err = VoiceConfig::default().validate().unwrap_err();
        assert_eq!(
            err.to_string(),
            "speech recognition is not configured, missing: IFLYTEK_APP_ID, IFLYTEK_API_KEY, IFLYTEK_API_SECRET"
        );

        assert!(VoiceConfig::new("app", "key", "secret").validate().is_ok());
    }

    #[test]
    fn debug_redacts_secret() {
        let rendered = format!("{:?}", VoiceConfig::new("app", "key", "hunter2"));
        assert!(!rendered.contains("hunter2"));
        assert!(rendered.contains("[REDACTED]"));
    }

    #[test]
    fn toml_defaults() {
        let config: VoiceConfig = toml::from_str("app_id = \"a1\"").unwrap();
        assert_eq!(config.host_url, DEFAULT_HOST_URL);
        assert_eq!(config.timeout(), Duration::from_secs(30));
        assert_eq!(config.missing(), vec!["IFLYTEK_API_KEY", "IFLYTEK_API_SECRET"]);
    }
}
