//! LLM client for Tripwise.
//!
//! Talks to the Alibaba Cloud Bailian completion endpoint using the ACS
//! HMAC-SHA1 request signature, and layers the travel-specific prompts on
//! top: itinerary generation, budget analysis and destination advice. The
//! model is asked for JSON; when it answers with anything else the caller
//! still gets a well-formed fallback document plus the raw text.

pub mod client;
pub mod config;
pub mod error;
pub mod planner;
mod prompts;
pub mod sign;

pub use client::{AiClient, ChatMessage, Completion};
pub use config::{AiConfig, DEFAULT_ENDPOINT, DEFAULT_MODEL};
pub use error::AiError;
pub use planner::{
    extract_json, AiDocument, BudgetSnapshot, ServiceStatus, TravelRequest,
};
