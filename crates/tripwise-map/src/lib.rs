//! AMap (Gaode) web service client for Tripwise.
//!
//! Every call is a keyed GET against the v3 REST API. The vendor always
//! answers 200 and reports failure through a `status` field of `"0"` with
//! a human-readable `info`; [`MapClient`] turns that into
//! [`MapError::Vendor`]. Responses are reshaped into camelCase structs the
//! frontend consumes directly.

pub mod client;
pub mod config;
pub mod error;
pub mod models;

pub use client::MapClient;
pub use config::{MapConfig, DEFAULT_BASE_URL};
pub use error::MapError;
pub use models::{
    Address, DrivingRoute, DrivingStep, GeocodeResult, IpLocation, Place, Poi, PoiSearch,
    ReverseGeocodeResult, TransitPlan, TransitRoutes, Weather, WeatherNow,
};
