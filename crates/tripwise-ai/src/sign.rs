//! ACS request signature (HMAC-SHA1, signature version 1.0).
//!
//! ```text
//! StringToSign = METHOD \n Content-MD5 \n Content-Type \n Date \n
//!                CanonicalizedHeaders CanonicalizedResource
//! Authorization = "acs " AccessKeyId ":" base64(HMAC-SHA1(secret, StringToSign))
//! ```

use base64::Engine;
use hmac::{Hmac, Mac};
use sha1::Sha1;

pub const CONTENT_TYPE: &str = "application/json";

/// Base64 of the MD5 digest of the request body.
pub fn content_md5(body: &[u8]) -> String {
    base64::engine::general_purpose::STANDARD.encode(md5::compute(body).0)
}

/// `x-acs-*` headers, lowercased and sorted, one `name:value\n` line each.
/// Other headers are ignored.
pub fn canonical_headers<'a, I>(headers: I) -> String
where
    I: IntoIterator<Item = (&'a str, &'a str)>,
{
    let mut acs: Vec<(String, &str)> = headers
        .into_iter()
        .map(|(name, value)| (name.to_ascii_lowercase(), value))
        .filter(|(name, _)| name.starts_with("x-acs-"))
        .collect();
    acs.sort();
    acs.into_iter()
        .map(|(name, value)| format!("{name}:{value}\n"))
        .collect()
}

/// Path followed by the query parameters sorted by name.
pub fn canonical_resource(path: &str, query: &[(&str, &str)]) -> String {
    if query.is_empty() {
        return path.to_string();
    }
    let mut params = query.to_vec();
    params.sort();
    let joined = params
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{path}?{joined}")
}

pub fn string_to_sign(
    method: &str,
    content_md5: &str,
    date: &str,
    canonical_headers: &str,
    canonical_resource: &str,
) -> String {
    format!("{method}\n{content_md5}\n{CONTENT_TYPE}\n{date}\n{canonical_headers}{canonical_resource}")
}

pub fn signature(secret: &str, string_to_sign: &str) -> String {
    let mut mac =
        Hmac::<Sha1>::new_from_slice(secret.as_bytes()).expect("HMAC accepts keys of any length");
    mac.update(string_to_sign.as_bytes());
    base64::engine::general_purpose::STANDARD.encode(mac.finalize().into_bytes())
}

pub fn authorization(access_key_id: &str, signature: &str) -> String {
    format!("acs {access_key_id}:{signature}")
}
