//! Persistence for Tripwise users, travel plans and budget items.
//!
//! Every function takes a borrowed `rusqlite::Connection` and performs one
//! logical operation. Ownership is enforced in SQL: plan and budget item
//! lookups are always filtered by the requesting user's ID, and a row that
//! exists but belongs to somebody else is reported exactly like a missing
//! row ([`PlanError::NotFound`]).
//!
//! JSON-shaped columns (preferences, itinerary, budget breakdown, tips,
//! emergency contacts) are stored as TEXT and surfaced as
//! [`serde_json::Value`].

mod budget;
mod plans;
mod report;
mod users;

pub use budget::{
    create_item, delete_item, get_item, list_items, update_item, BudgetItem, BudgetItemUpdate,
    NewBudgetItem,
};
pub use plans::{
    count_plans, create_plan, delete_plan, get_plan, list_plans, plan_stats, trip_days,
    update_plan, NewPlan, PlanStats, PlanUpdate, StatusCounts, TravelPlan,
};
pub use report::{
    budget_summary, category_breakdown, count_items, export_csv, BudgetSummary, CategoryShare,
    CategorySpend, CSV_HEADER,
};
pub use users::{
    count_users, create_user, get_user, get_user_by_email, get_user_credentials,
    update_user_profile, NewUser, ProfileUpdate, User, UserCredentials,
};

use chrono::{DateTime, NaiveDate, SecondsFormat, Utc};
use rusqlite::ErrorCode;
use thiserror::Error;

/// Errors that can occur during persistence operations.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("json serialization error: {0}")]
    Json(#[from] serde_json::Error),
    /// The row does not exist or is not visible to the requesting user.
    #[error("{0} not found")]
    NotFound(&'static str),
    #[error("conflict: {0}")]
    Conflict(String),
    /// Caller-supplied data violates a domain rule.
    #[error("{0}")]
    Invalid(String),
}

impl PlanError {
    /// Returns true when `err` is a SQLite constraint violation.
    fn is_constraint(err: &rusqlite::Error) -> bool {
        matches!(
            err,
            rusqlite::Error::SqliteFailure(e, _) if e.code == ErrorCode::ConstraintViolation
        )
    }
}

/// Current instant as stored in `created_at` / `updated_at`.
pub(crate) fn now_timestamp() -> String {
    Utc::now().to_rfc3339_opts(SecondsFormat::Micros, true)
}

/// Parses a calendar date, accepting `YYYY-MM-DD` or a full RFC 3339 timestamp.
pub fn parse_date(value: &str) -> Result<NaiveDate, PlanError> {
    let value = value.trim();
    NaiveDate::parse_from_str(value, "%Y-%m-%d")
        .or_else(|_| DateTime::parse_from_rfc3339(value).map(|dt| dt.date_naive()))
        .map_err(|_| PlanError::Invalid(format!("invalid date: {value:?}")))
}

fn json_column(idx: usize, raw: String) -> rusqlite::Result<serde_json::Value> {
    serde_json::from_str(&raw).map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}

fn label_column<T>(idx: usize, raw: String) -> rusqlite::Result<T>
where
    T: std::str::FromStr<Err = tripwise_types::ParseLabelError>,
{
    raw.parse().map_err(|e| {
        rusqlite::Error::FromSqlConversionFailure(idx, rusqlite::types::Type::Text, Box::new(e))
    })
}
