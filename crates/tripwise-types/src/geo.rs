//! Geographic coordinates.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// A WGS-84 / GCJ-02 point as exchanged with the frontend.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

/// Errors produced when parsing a `"lng,lat"` pair.
#[derive(Debug, Error, PartialEq)]
pub enum CoordinateError {
    #[error("expected \"lng,lat\", got {0:?}")]
    Malformed(String),
    #[error("invalid number in coordinate pair: {0:?}")]
    Number(String),
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Formats the point in the vendor's `lng,lat` order.
    pub fn to_lng_lat(&self) -> String {
        format!("{},{}", self.lng, self.lat)
    }
}

impl fmt::Display for Coordinates {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_lng_lat())
    }
}

/// Parses the vendor's `lng,lat` representation.
impl FromStr for Coordinates {
    type Err = CoordinateError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (lng, lat) = s
            .split_once(',')
            .ok_or_else(|| CoordinateError::Malformed(s.to_string()))?;
        let lng: f64 = lng
            .trim()
            .parse()
            .map_err(|_| CoordinateError::Number(lng.to_string()))?;
        let lat: f64 = lat
            .trim()
            .parse()
            .map_err(|_| CoordinateError::Number(lat.to_string()))?;
        Ok(Self { lat, lng })
    }
}
