//! Travel plan handlers, including AI generation and destination advice.

use crate::api::{created, non_blank, ok, with_conn, ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Path, Query},
    http::StatusCode,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::sync::Arc;
use tripwise_ai::TravelRequest;
use tripwise_map::PoiSearch;
use tripwise_plans::{
    create_plan, delete_plan, get_plan, list_plans, parse_date, plan_stats, update_plan, NewPlan,
    PlanStats, PlanUpdate, TravelPlan,
};
use tripwise_types::{ApiResponse, PlanStatus};

const DESTINATION_SEARCH_PAGE_SIZE: u32 = 10;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreatePlanRequest {
    pub title: Option<String>,
    pub destination: Option<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
    pub budget: Option<f64>,
    pub travelers: Option<i64>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratePlanRequest {
    pub destination: Option<String>,
    pub days: Option<i64>,
    pub budget: Option<f64>,
    pub travelers: Option<i64>,
    #[serde(default)]
    pub preferences: Vec<String>,
    pub start_date: Option<String>,
    pub end_date: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GeneratedPlan {
    pub plan: TravelPlan,
    pub ai_response: Value,
    pub usage: Value,
}

#[derive(Debug, Deserialize)]
pub struct AdviceRequest {
    pub destination: Option<String>,
    #[serde(default)]
    pub preferences: Vec<String>,
    #[serde(default)]
    pub questions: Vec<String>,
}

#[derive(Debug, Serialize)]
pub struct Advice {
    pub advice: Value,
    pub usage: Value,
}

#[derive(Debug, Deserialize)]
pub struct DestinationQuery {
    pub keyword: Option<String>,
    pub city: Option<String>,
}

/// Handler for `GET /api/travel/plans`.
pub async fn list_plans_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<Vec<TravelPlan>> {
    let plans = with_conn(&state, move |conn| Ok(list_plans(conn, &user.id)?)).await?;
    ok(plans, "travel plans fetched")
}

/// Handler for `GET /api/travel/plans/{id}`.
pub async fn get_plan_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
) -> ApiResult<TravelPlan> {
    let plan = with_conn(&state, move |conn| Ok(get_plan(conn, &user.id, &plan_id)?)).await?;
    ok(plan, "travel plan fetched")
}

/// Handler for `POST /api/travel/plans`.
pub async fn create_plan_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<CreatePlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<TravelPlan>>), ApiError> {
    let Json(payload) = payload?;
    let (
        Some(title),
        Some(destination),
        Some(start_date),
        Some(end_date),
        Some(budget),
        Some(travelers),
    ) = (
        non_blank(payload.title),
        non_blank(payload.destination),
        non_blank(payload.start_date),
        non_blank(payload.end_date),
        payload.budget,
        payload.travelers,
    )
    else {
        return Err(ApiError::BadRequest(
            "title, destination, startDate, endDate, budget and travelers are required"
                .to_string(),
        ));
    };

    let mut plan = NewPlan::new(user.id, title, destination, budget, travelers);
    plan.start_date = Some(start_date);
    plan.end_date = Some(end_date);
    plan.preferences = payload.preferences;
    plan.notes = payload.notes;

    let plan = with_conn(&state, move |conn| Ok(create_plan(conn, &plan)?)).await?;
    created(plan, "travel plan created")
}

fn document_field(document: &Value, field: &str, default: Value) -> Value {
    match document.get(field) {
        Some(value) if !value.is_null() => value.clone(),
        _ => default,
    }
}

/// Handler for `POST /api/travel/plans/ai-generate`.
pub async fn generate_plan_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    payload: Result<Json<GeneratePlanRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<GeneratedPlan>>), ApiError> {
    let Json(payload) = payload?;
    let (Some(destination), Some(days), Some(budget), Some(travelers)) = (
        non_blank(payload.destination),
        payload.days.filter(|d| *d > 0),
        payload.budget.filter(|b| b.is_finite() && *b > 0.0),
        payload.travelers.filter(|t| *t > 0),
    ) else {
        return Err(ApiError::BadRequest(
            "destination, days, budget and travelers are required".to_string(),
        ));
    };

    let start_date = non_blank(payload.start_date);
    let end_date = non_blank(payload.end_date);
    for date in [&start_date, &end_date].into_iter().flatten() {
        parse_date(date)?;
    }

    if !state.ai.is_configured() {
        return Err(ApiError::ServiceUnavailable(
            "AI service is not configured, cannot generate a travel plan".to_string(),
        ));
    }

    let request = TravelRequest {
        destination,
        days,
        budget,
        travelers,
        preferences: payload.preferences,
        start_date,
        end_date,
    };
    let generated = state.ai.generate_travel_plan(&request).await?;
    let document = generated.document;

    let title = document
        .get("title")
        .and_then(Value::as_str)
        .filter(|t| !t.trim().is_empty())
        .map(str::to_string)
        .unwrap_or_else(|| format!("{} {}-day trip", request.destination, request.days));

    let mut plan = NewPlan::new(
        user.id,
        title,
        request.destination.clone(),
        request.budget,
        request.travelers,
    );
    plan.start_date = request.start_date.clone();
    plan.end_date = request.end_date.clone();
    plan.days = Some(request.days);
    plan.preferences = request.preferences.clone();
    plan.status = PlanStatus::Generated;
    plan.ai_generated = true;
    plan.itinerary = document_field(&document, "dailyItinerary", json!([]));
    plan.budget_breakdown = document_field(&document, "budgetBreakdown", json!({}));
    plan.travel_tips = document_field(&document, "travelTips", json!([]));
    plan.emergency_contacts = document_field(&document, "emergencyContacts", json!([]));

    let plan = with_conn(&state, move |conn| Ok(create_plan(conn, &plan)?)).await?;
    tracing::info!(plan_id = %plan.id, destination = %plan.destination, "AI travel plan stored");

    created(
        GeneratedPlan {
            plan,
            ai_response: document,
            usage: generated.usage,
        },
        "AI travel plan generated",
    )
}

/// Handler for `PUT /api/travel/plans/{id}`.
pub async fn update_plan_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
    payload: Result<Json<PlanUpdate>, JsonRejection>,
) -> ApiResult<TravelPlan> {
    let Json(update) = payload?;
    let plan = with_conn(&state, move |conn| {
        Ok(update_plan(conn, &user.id, &plan_id, &update)?)
    })
    .await?;
    ok(plan, "travel plan updated")
}

/// Handler for `DELETE /api/travel/plans/{id}`.
pub async fn delete_plan_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
) -> ApiResult<Value> {
    with_conn(&state, move |conn| Ok(delete_plan(conn, &user.id, &plan_id)?)).await?;
    ok(Value::Null, "travel plan deleted")
}

/// Handler for `POST /api/travel/advice`.
pub async fn advice_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<AdviceRequest>, JsonRejection>,
) -> ApiResult<Advice> {
    let Json(payload) = payload?;
    let destination = non_blank(payload.destination)
        .ok_or_else(|| ApiError::BadRequest("destination is required".to_string()))?;

    if !state.ai.is_configured() {
        return Err(ApiError::ServiceUnavailable(
            "AI service is not configured, cannot provide travel advice".to_string(),
        ));
    }

    let generated = state
        .ai
        .travel_advice(&destination, &payload.preferences, &payload.questions)
        .await?;
    ok(
        Advice {
            advice: generated.document,
            usage: generated.usage,
        },
        "travel advice fetched",
    )
}

/// Handler for `GET /api/travel/search-destination`.
pub async fn search_destination_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<DestinationQuery>,
) -> ApiResult<PoiSearch> {
    let keyword = non_blank(query.keyword)
        .ok_or_else(|| ApiError::BadRequest("search keyword is required".to_string()))?;
    let city = non_blank(query.city);

    let result = state
        .map
        .search_poi(&keyword, city.as_deref(), None, 1, DESTINATION_SEARCH_PAGE_SIZE)
        .await?;
    ok(result, "destinations found")
}

/// Handler for `GET /api/travel/stats`.
pub async fn stats_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> ApiResult<PlanStats> {
    let stats = with_conn(&state, move |conn| Ok(plan_stats(conn, &user.id)?)).await?;
    ok(stats, "travel plan statistics fetched")
}
