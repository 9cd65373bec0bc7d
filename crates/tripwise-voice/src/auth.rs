//! Request signing for the dictation WebSocket.
//!
//! The vendor authenticates the upgrade request through three query
//! parameters: `host`, `date` and `authorization`. The last one is the
//! base64 of an `api_key=…, algorithm=…, headers=…, signature=…` line where
//! the signature is an HMAC-SHA256 over the host, date and request line.

use crate::config::VoiceConfig;
use crate::error::VoiceError;
use base64::Engine;
use chrono::{DateTime, Utc};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use url::Url;

/// Formats a timestamp the way HTTP `Date` headers do.
pub fn rfc1123_date(now: DateTime<Utc>) -> String {
    now.format("%a, %d %b %Y %H:%M:%S GMT").to_string()
}

fn host_header(url: &Url) -> Result<String, VoiceError> {
    let host = url
        .host_str()
        .ok_or_else(|| VoiceError::InvalidUrl(format!("{url} has no host")))?;
    Ok(match url.port() {
        Some(port) => format!("{host}:{port}"),
        None => host.to_string(),
    })
}

fn signature(secret: &str, origin: &str) -> String {
    let mut mac = Hmac::<Sha256>::new_from_slice(secret.as_bytes())
        .expect("HMAC accepts keys of any length");
    mac.update(origin.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

/// Builds the signed connection URL for `config.host_url` at `date`.
///
/// `date` must be an RFC 1123 timestamp (see [`rfc1123_date`]); the vendor
/// rejects signatures more than five minutes off its clock.
pub fn sign_url(config: &VoiceConfig, date: &str) -> Result<Url, VoiceError> {
    let mut url =
        Url::parse(&config.host_url).map_err(|e| VoiceError::InvalidUrl(e.to_string()))?;
    let host = host_header(&url)?;

    let origin = format!("host: {host}\ndate: {date}\nGET {} HTTP/1.1", url.path());
    let authorization = format!(
        "api_key=\"{}\", algorithm=\"hmac-sha256\", headers=\"host date request-line\", signature=\"{}\"",
        config.api_key,
        signature(&config.api_secret, &origin)
    );

    url.query_pairs_mut()
        .clear()
        .append_pair(
            "authorization",
            &base64::engine::general_purpose::STANDARD.encode(authorization),
        )
        .append_pair("date", date)
        .append_pair("host", &host);
    Ok(url)
}
