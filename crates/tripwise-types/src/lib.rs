//! Shared types for the Tripwise travel planner.
//!
//! This crate provides the foundational types used across all Tripwise
//! crates: the JSON response envelope returned by every API endpoint, the
//! user role, travel plan status and budget category enums, and the
//! coordinate type shared by the map client and the HTTP layer.
//!
//! No crate in the workspace depends on anything *except* `tripwise-types`
//! for cross-cutting type definitions.

mod geo;

pub use geo::{CoordinateError, Coordinates};

use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::fmt;
use std::str::FromStr;

/// The JSON envelope wrapping every API response.
///
/// Successful responses carry `data`; failures carry only `message`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ApiResponse<T> {
    /// Whether the operation succeeded.
    pub success: bool,
    /// Human-readable outcome.
    pub message: String,
    /// Payload, omitted when absent.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

impl<T> ApiResponse<T> {
    /// Builds a successful envelope around `data`.
    pub fn ok(data: T, message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
            data: Some(data),
        }
    }
}

impl ApiResponse<Value> {
    /// Builds a failure envelope with no payload.
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
            data: None,
        }
    }
}

/// Error returned when parsing an unknown enum label.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParseLabelError {
    /// Which kind of label was being parsed.
    pub kind: &'static str,
    /// The rejected input.
    pub value: String,
}

impl fmt::Display for ParseLabelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown {}: {}", self.kind, self.value)
    }
}

impl std::error::Error for ParseLabelError {}

/// Account role of a registered user.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    /// A regular traveller.
    #[default]
    User,
    /// An operator allowed to use the admin endpoints.
    Admin,
}

impl UserRole {
    /// Returns the stored label for this role.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Admin => "admin",
        }
    }
}

impl fmt::Display for UserRole {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for UserRole {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(Self::User),
            "admin" => Ok(Self::Admin),
            _ => Err(ParseLabelError {
                kind: "user role",
                value: s.to_string(),
            }),
        }
    }
}

/// Lifecycle status of a travel plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PlanStatus {
    /// Created by hand, not yet planned out.
    #[default]
    Draft,
    /// Itinerary drafted by the LLM.
    Generated,
    /// Trip in progress.
    Active,
    /// Trip finished.
    Completed,
}

impl PlanStatus {
    /// All statuses, in lifecycle order.
    pub const ALL: [PlanStatus; 4] = [
        PlanStatus::Draft,
        PlanStatus::Generated,
        PlanStatus::Active,
        PlanStatus::Completed,
    ];

    /// Returns the stored label for this status.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Draft => "draft",
            Self::Generated => "generated",
            Self::Active => "active",
            Self::Completed => "completed",
        }
    }
}

impl fmt::Display for PlanStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for PlanStatus {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(Self::Draft),
            "generated" => Ok(Self::Generated),
            "active" => Ok(Self::Active),
            "completed" => Ok(Self::Completed),
            _ => Err(ParseLabelError {
                kind: "plan status",
                value: s.to_string(),
            }),
        }
    }
}

/// Spending category of a budget item.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BudgetCategory {
    Transportation,
    Accommodation,
    Food,
    Activities,
    Shopping,
    Other,
}

impl BudgetCategory {
    /// All categories, in reporting order.
    pub const ALL: [BudgetCategory; 6] = [
        BudgetCategory::Transportation,
        BudgetCategory::Accommodation,
        BudgetCategory::Food,
        BudgetCategory::Activities,
        BudgetCategory::Shopping,
        BudgetCategory::Other,
    ];

    /// Returns the stored label for this category.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Transportation => "transportation",
            Self::Accommodation => "accommodation",
            Self::Food => "food",
            Self::Activities => "activities",
            Self::Shopping => "shopping",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for BudgetCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for BudgetCategory {
    type Err = ParseLabelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|c| c.as_str() == s)
            .ok_or_else(|| ParseLabelError {
                kind: "budget category",
                value: s.to_string(),
            })
    }
}

/// Preferences stored for a freshly registered user.
pub fn default_user_preferences() -> Value {
    json!({
        "travelStyles": [],
        "budgetRange": { "min": 0, "max": 10000 },
        "interests": []
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_omits_missing_data() {
        let body = serde_json::to_value(ApiResponse::error("nope")).unwrap();
        assert_eq!(body, json!({ "success": false, "message": "nope" }));

        let body = serde_json::to_value(ApiResponse::ok(vec![1, 2], "done")).unwrap();
        assert_eq!(body["data"], json!([1, 2]));
        assert_eq!(body["success"], true);
    }

    #[test]
    fn plan_status_labels() {
        for status in PlanStatus::ALL {
            assert_eq!(status.as_str().parse::<PlanStatus>(), Ok(status));
            assert_eq!(
                serde_json::to_value(status).unwrap(),
                Value::String(status.to_string())
            );
        }
        assert!("archived".parse::<PlanStatus>().is_err());
    }

    #[test]
    fn budget_category_rejects_unknown() {
        assert_eq!("food".parse::<BudgetCategory>(), Ok(BudgetCategory::Food));
        let err = "souvenirs".parse::<BudgetCategory>().unwrap_err();
        assert_eq!(err.to_string(), "unknown budget category: souvenirs");
    }

    #[test]
    fn user_role_defaults_to_user() {
        assert_eq!(UserRole::default(), UserRole::User);
        assert_eq!("admin".parse::<UserRole>(), Ok(UserRole::Admin));
    }

    #[test]
    fn default_preferences_shape() {
        let prefs = default_user_preferences();
        assert_eq!(prefs["budgetRange"]["max"], 10000);
        assert!(prefs["interests"].as_array().unwrap().is_empty());
    }
}
