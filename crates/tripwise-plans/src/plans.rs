//! Travel plan rows.

use crate::{json_column, label_column, now_timestamp, parse_date, PlanError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tripwise_types::PlanStatus;
use uuid::Uuid;

/// A stored travel plan.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TravelPlan {
    pub id: String,
    pub user_id: String,
    pub title: String,
    pub destination: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub days: i64,
    pub budget: f64,
    pub travelers: i64,
    pub preferences: Value,
    pub notes: String,
    pub status: PlanStatus,
    pub itinerary: Value,
    pub budget_breakdown: Value,
    pub travel_tips: Value,
    pub emergency_contacts: Value,
    pub ai_generated: bool,
    pub created_at: String,
    pub updated_at: String,
}

/// Parameters for inserting a plan.
#[derive(Debug, Clone)]
pub struct NewPlan {
    pub user_id: String,
    pub title: String,
    pub destination: String,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    /// Trip length, used only when either date is missing.
    pub days: Option<i64>,
    pub budget: f64,
    pub travelers: i64,
    pub preferences: Vec<String>,
    pub notes: String,
    pub status: PlanStatus,
    pub itinerary: Value,
    pub budget_breakdown: Value,
    pub travel_tips: Value,
    pub emergency_contacts: Value,
    pub ai_generated: bool,
}

impl NewPlan {
    /// A hand-written draft with empty itinerary fields.
    pub fn new(
        user_id: impl Into<String>,
        title: impl Into<String>,
        destination: impl Into<String>,
        budget: f64,
        travelers: i64,
    ) -> Self {
        Self {
            user_id: user_id.into(),
            title: title.into(),
            destination: destination.into(),
            start_date: None,
            end_date: None,
            days: None,
            budget,
            travelers,
            preferences: Vec::new(),
            notes: String::new(),
            status: PlanStatus::Draft,
            itinerary: json!([]),
            budget_breakdown: json!({}),
            travel_tips: json!([]),
            emergency_contacts: json!([]),
            ai_generated: false,
        }
    }
}

/// Partial update of a plan. `None` leaves the field untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlanUpdate {
    pub title: Option<String>,
    pub destination: Option<String>,
    #[serde(alias = "start_date")]
    pub start_date: Option<String>,
    #[serde(alias = "end_date")]
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub travelers: Option<i64>,
    pub preferences: Option<Value>,
    pub notes: Option<String>,
    pub status: Option<PlanStatus>,
    pub itinerary: Option<Value>,
    #[serde(alias = "budget_breakdown")]
    pub budget_breakdown: Option<Value>,
    #[serde(alias = "travel_tips")]
    pub travel_tips: Option<Value>,
    #[serde(alias = "emergency_contacts")]
    pub emergency_contacts: Option<Value>,
}

/// Plan counts per status.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
pub struct StatusCounts {
    pub draft: u64,
    pub generated: u64,
    pub active: u64,
    pub completed: u64,
}

/// Aggregate view over one user's plans.
#[derive(Debug, Clone, Default, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PlanStats {
    pub total_plans: u64,
    pub completed_plans: u64,
    pub total_budget: f64,
    pub plans_by_status: StatusCounts,
}

/// Number of calendar days covered by a trip, both ends inclusive.
///
/// Returns [`PlanError::Invalid`] if `end` falls before `start`.
pub fn trip_days(start: &str, end: &str) -> Result<i64, PlanError> {
    let days = (parse_date(end)? - parse_date(start)?).num_days() + 1;
    if days <= 0 {
        return Err(PlanError::Invalid(
            "end date cannot be before start date".to_string(),
        ));
    }
    Ok(days)
}

fn validate_fields(
    title: &str,
    destination: &str,
    budget: f64,
    travelers: i64,
    days: i64,
) -> Result<(), PlanError> {
    if title.trim().is_empty() {
        return Err(PlanError::Invalid("title is required".to_string()));
    }
    if destination.trim().is_empty() {
        return Err(PlanError::Invalid("destination is required".to_string()));
    }
    if !budget.is_finite() || budget <= 0.0 {
        return Err(PlanError::Invalid("budget must be a positive number".to_string()));
    }
    if travelers < 1 {
        return Err(PlanError::Invalid("travelers must be at least 1".to_string()));
    }
    if days < 1 {
        return Err(PlanError::Invalid("trip must last at least one day".to_string()));
    }
    Ok(())
}

/// Rejects any supplied date that does not parse, even when its partner is absent.
fn check_dates(start: Option<&str>, end: Option<&str>) -> Result<(), PlanError> {
    for date in [start, end].into_iter().flatten() {
        parse_date(date)?;
    }
    Ok(())
}

fn resolve_days(
    explicit: Option<i64>,
    start: Option<&str>,
    end: Option<&str>,
) -> Result<i64, PlanError> {
    check_dates(start, end)?;
    let from_dates = match (start, end) {
        (Some(s), Some(e)) => Some(trip_days(s, e)?),
        _ => None,
    };
    from_dates
        .or(explicit)
        .ok_or_else(|| PlanError::Invalid("trip length or start and end dates are required".to_string()))
}

const PLAN_COLUMNS: &str = "id, user_id, title, destination, start_date, end_date, days, budget,
    travelers, preferences, notes, status, itinerary, budget_breakdown, travel_tips,
    emergency_contacts, ai_generated, created_at, updated_at";

/// Inserts a plan and returns the stored row.
pub fn create_plan(conn: &Connection, plan: &NewPlan) -> Result<TravelPlan, PlanError> {
    let days = resolve_days(plan.days, plan.start_date.as_deref(), plan.end_date.as_deref())?;
    validate_fields(&plan.title, &plan.destination, plan.budget, plan.travelers, days)?;

    let now = now_timestamp();
    let plan = conn.query_row(
        &format!(
            "INSERT INTO travel_plans (
                id, user_id, title, destination, start_date, end_date, days, budget,
                travelers, preferences, notes, status, itinerary, budget_breakdown,
                travel_tips, emergency_contacts, ai_generated, created_at, updated_at
            ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14, ?15, ?16, ?17, ?18, ?18)
            RETURNING {PLAN_COLUMNS}"
        ),
        params![
            Uuid::new_v4().to_string(),
            plan.user_id,
            plan.title.trim(),
            plan.destination.trim(),
            plan.start_date,
            plan.end_date,
            days,
            plan.budget,
            plan.travelers,
            serde_json::to_string(&plan.preferences)?,
            plan.notes,
            plan.status.as_str(),
            serde_json::to_string(&plan.itinerary)?,
            serde_json::to_string(&plan.budget_breakdown)?,
            serde_json::to_string(&plan.travel_tips)?,
            serde_json::to_string(&plan.emergency_contacts)?,
            plan.ai_generated,
            now,
        ],
        map_row_to_plan,
    )?;

    tracing::debug!(plan_id = %plan.id, user_id = %plan.user_id, "travel plan created");
    Ok(plan)
}

/// Retrieves a plan owned by `user_id`.
pub fn get_plan(conn: &Connection, user_id: &str, plan_id: &str) -> Result<TravelPlan, PlanError> {
    conn.query_row(
        &format!("SELECT {PLAN_COLUMNS} FROM travel_plans WHERE id = ?1 AND user_id = ?2"),
        [plan_id, user_id],
        map_row_to_plan,
    )
    .optional()?
    .ok_or(PlanError::NotFound("travel plan"))
}

/// Lists a user's plans, newest first.
pub fn list_plans(conn: &Connection, user_id: &str) -> Result<Vec<TravelPlan>, PlanError> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {PLAN_COLUMNS} FROM travel_plans
         WHERE user_id = ?1
         ORDER BY created_at DESC, rowid DESC"
    ))?;

    let rows = stmt.query_map([user_id], map_row_to_plan)?;
    let mut plans = Vec::new();
    for row in rows {
        plans.push(row?);
    }
    Ok(plans)
}

/// Applies a partial update to a plan owned by `user_id`.
///
/// `days` is recomputed whenever either date changes and both are known.
/// `updated_at` is always bumped, even for an empty update.
pub fn update_plan(
    conn: &Connection,
    user_id: &str,
    plan_id: &str,
    update: &PlanUpdate,
) -> Result<TravelPlan, PlanError> {
    let tx = conn.unchecked_transaction()?;
    let mut plan = get_plan(&tx, user_id, plan_id)?;

    check_dates(update.start_date.as_deref(), update.end_date.as_deref())?;
    let dates_changed = update.start_date.is_some() || update.end_date.is_some();
    if let Some(title) = &update.title {
        plan.title = title.trim().to_string();
    }
    if let Some(destination) = &update.destination {
        plan.destination = destination.trim().to_string();
    }
    if let Some(start) = &update.start_date {
        plan.start_date = Some(start.clone());
    }
    if let Some(end) = &update.end_date {
        plan.end_date = Some(end.clone());
    }
    if let Some(budget) = update.budget {
        plan.budget = budget;
    }
    if let Some(travelers) = update.travelers {
        plan.travelers = travelers;
    }
    if let Some(preferences) = &update.preferences {
        plan.preferences = preferences.clone();
    }
    if let Some(notes) = &update.notes {
        plan.notes = notes.clone();
    }
    if let Some(status) = update.status {
        plan.status = status;
    }
    if let Some(itinerary) = &update.itinerary {
        plan.itinerary = itinerary.clone();
    }
    if let Some(breakdown) = &update.budget_breakdown {
        plan.budget_breakdown = breakdown.clone();
    }
    if let Some(tips) = &update.travel_tips {
        plan.travel_tips = tips.clone();
    }
    if let Some(contacts) = &update.emergency_contacts {
        plan.emergency_contacts = contacts.clone();
    }

    if dates_changed {
        if let (Some(start), Some(end)) = (&plan.start_date, &plan.end_date) {
            plan.days = trip_days(start, end)?;
        }
    }
    validate_fields(&plan.title, &plan.destination, plan.budget, plan.travelers, plan.days)?;

    let updated = tx.query_row(
        &format!(
            "UPDATE travel_plans SET
                title = ?1, destination = ?2, start_date = ?3, end_date = ?4, days = ?5,
                budget = ?6, travelers = ?7, preferences = ?8, notes = ?9, status = ?10,
                itinerary = ?11, budget_breakdown = ?12, travel_tips = ?13,
                emergency_contacts = ?14, updated_at = ?15
             WHERE id = ?16 AND user_id = ?17
             RETURNING {PLAN_COLUMNS}"
        ),
        params![
            plan.title,
            plan.destination,
            plan.start_date,
            plan.end_date,
            plan.days,
            plan.budget,
            plan.travelers,
            serde_json::to_string(&plan.preferences)?,
            plan.notes,
            plan.status.as_str(),
            serde_json::to_string(&plan.itinerary)?,
            serde_json::to_string(&plan.budget_breakdown)?,
            serde_json::to_string(&plan.travel_tips)?,
            serde_json::to_string(&plan.emergency_contacts)?,
            now_timestamp(),
            plan_id,
            user_id,
        ],
        map_row_to_plan,
    )?;
    tx.commit()?;

    Ok(updated)
}

/// Deletes a plan owned by `user_id`, together with its budget items.
pub fn delete_plan(conn: &Connection, user_id: &str, plan_id: &str) -> Result<(), PlanError> {
    let count = conn.execute(
        "DELETE FROM travel_plans WHERE id = ?1 AND user_id = ?2",
        [plan_id, user_id],
    )?;
    if count == 0 {
        return Err(PlanError::NotFound("travel plan"));
    }
    Ok(())
}

/// Summarises a user's plans by status and total budget.
pub fn plan_stats(conn: &Connection, user_id: &str) -> Result<PlanStats, PlanError> {
    let mut stmt = conn.prepare(
        "SELECT status, COUNT(*), COALESCE(SUM(budget), 0)
         FROM travel_plans WHERE user_id = ?1 GROUP BY status",
    )?;
    let rows = stmt.query_map([user_id], |row| {
        Ok((
            label_column::<PlanStatus>(0, row.get(0)?)?,
            row.get::<_, u64>(1)?,
            row.get::<_, f64>(2)?,
        ))
    })?;

    let mut stats = PlanStats::default();
    for row in rows {
        let (status, count, budget) = row?;
        stats.total_plans += count;
        stats.total_budget += budget;
        match status {
            PlanStatus::Draft => stats.plans_by_status.draft = count,
            PlanStatus::Generated => stats.plans_by_status.generated = count,
            PlanStatus::Active => stats.plans_by_status.active = count,
            PlanStatus::Completed => stats.plans_by_status.completed = count,
        }
    }
    stats.completed_plans = stats.plans_by_status.completed;
    Ok(stats)
}

/// Counts all stored plans.
pub fn count_plans(conn: &Connection) -> Result<u64, PlanError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM travel_plans", [], |row| row.get(0))?)
}

fn map_row_to_plan(row: &Row) -> rusqlite::Result<TravelPlan> {
    Ok(TravelPlan {
        id: row.get(0)?,
        user_id: row.get(1)?,
        title: row.get(2)?,
        destination: row.get(3)?,
        start_date: row.get(4)?,
        end_date: row.get(5)?,
        days: row.get(6)?,
        budget: row.get(7)?,
        travelers: row.get(8)?,
        preferences: json_column(9, row.get(9)?)?,
        notes: row.get(10)?,
        status: label_column(11, row.get(11)?)?,
        itinerary: json_column(12, row.get(12)?)?,
        budget_breakdown: json_column(13, row.get(13)?)?,
        travel_tips: json_column(14, row.get(14)?)?,
        emergency_contacts: json_column(15, row.get(15)?)?,
        ai_generated: row.get(16)?,
        created_at: row.get(17)?,
        updated_at: row.get(18)?,
    })
}
