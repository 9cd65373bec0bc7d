use thiserror::Error;
use tripwise_types::CoordinateError;

#[derive(Error, Debug)]
pub enum MapError {
    #[error("map service is not configured, missing: AMAP_API_KEY")]
    NotConfigured,

    #[error("network error: {0}")]
    Http(#[from] reqwest::Error),

    /// The vendor rejected the request; carries its `info` text.
    #[error("{0}")]
    Vendor(String),

    #[error("unexpected map response: {0}")]
    MalformedResponse(String),

    #[error(transparent)]
    Coordinate(#[from] CoordinateError),
}
