//! Budget item handlers and spending reports.

use crate::api::{created, non_blank, ok, with_conn, ApiError, ApiResult};
use crate::middleware::CurrentUser;
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, Extension, Path},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;
use std::sync::Arc;
use tripwise_ai::BudgetSnapshot;
use tripwise_plans::{
    budget_summary, category_breakdown, create_item, delete_item, export_csv, list_items,
    update_item, BudgetItem, BudgetItemUpdate, BudgetSummary, CategoryShare, NewBudgetItem,
};
use tripwise_types::{ApiResponse, BudgetCategory};

#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    pub category: Option<String>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Serialize)]
pub struct Analysis {
    pub analysis: Value,
    pub usage: Value,
}

/// Handler for `GET /api/budget/plans/{planId}/items`.
pub async fn list_items_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
) -> ApiResult<Vec<BudgetItem>> {
    let items = with_conn(&state, move |conn| Ok(list_items(conn, &user.id, &plan_id)?)).await?;
    ok(items, "budget items fetched")
}

/// Handler for `POST /api/budget/plans/{planId}/items`.
pub async fn create_item_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
    payload: Result<Json<CreateItemRequest>, JsonRejection>,
) -> Result<(StatusCode, Json<ApiResponse<BudgetItem>>), ApiError> {
    let Json(payload) = payload?;
    let (Some(category), Some(description), Some(amount), Some(date)) = (
        non_blank(payload.category),
        non_blank(payload.description),
        payload.amount,
        non_blank(payload.date),
    ) else {
        return Err(ApiError::BadRequest(
            "category, description, amount and date are required".to_string(),
        ));
    };
    let category: BudgetCategory = category
        .parse()
        .map_err(|e: tripwise_types::ParseLabelError| ApiError::BadRequest(e.to_string()))?;

    let item = NewBudgetItem {
        category,
        description,
        amount,
        date,
        notes: payload.notes,
    };
    let item = with_conn(&state, move |conn| {
        Ok(create_item(conn, &user.id, &plan_id, &item)?)
    })
    .await?;
    created(item, "budget item added")
}

/// Handler for `PUT /api/budget/items/{id}`.
pub async fn update_item_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(item_id): Path<String>,
    payload: Result<Json<BudgetItemUpdate>, JsonRejection>,
) -> ApiResult<BudgetItem> {
    let Json(update) = payload?;
    let item = with_conn(&state, move |conn| {
        Ok(update_item(conn, &user.id, &item_id, &update)?)
    })
    .await?;
    ok(item, "budget item updated")
}

/// Handler for `DELETE /api/budget/items/{id}`.
pub async fn delete_item_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(item_id): Path<String>,
) -> ApiResult<Value> {
    with_conn(&state, move |conn| Ok(delete_item(conn, &user.id, &item_id)?)).await?;
    ok(Value::Null, "budget item deleted")
}

/// Handler for `GET /api/budget/plans/{planId}/summary`.
pub async fn summary_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
) -> ApiResult<BudgetSummary> {
    let today = Utc::now().date_naive();
    let summary = with_conn(&state, move |conn| {
        Ok(budget_summary(conn, &user.id, &plan_id, today)?)
    })
    .await?;
    ok(summary, "budget summary fetched")
}

/// Handler for `POST /api/budget/plans/{planId}/analyze`.
pub async fn analyze_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
) -> ApiResult<Analysis> {
    let today = Utc::now().date_naive();
    // Ownership is checked before the AI configuration so strangers get 404.
    let summary = with_conn(&state, move |conn| {
        Ok(budget_summary(conn, &user.id, &plan_id, today)?)
    })
    .await?;

    if !state.ai.is_configured() {
        return Err(ApiError::ServiceUnavailable(
            "AI service is not configured, cannot analyze the budget".to_string(),
        ));
    }

    let snapshot = BudgetSnapshot {
        total_budget: summary.total_budget,
        total_spent: summary.total_spent,
        by_category: summary
            .by_category
            .iter()
            .map(|(category, spend)| (category.as_str().to_string(), spend.spent))
            .collect(),
        remaining_days: summary.remaining_days,
    };
    let generated = state.ai.analyze_budget(&snapshot).await?;

    ok(
        Analysis {
            analysis: generated.document,
            usage: generated.usage,
        },
        "budget analyzed",
    )
}

/// Handler for `GET /api/budget/plans/{planId}/categories`.
pub async fn categories_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
) -> ApiResult<BTreeMap<BudgetCategory, CategoryShare>> {
    let breakdown = with_conn(&state, move |conn| {
        Ok(category_breakdown(conn, &user.id, &plan_id)?)
    })
    .await?;
    ok(breakdown, "budget categories fetched")
}

/// Handler for `GET /api/budget/plans/{planId}/export`.
///
/// Returns the plan's items as a CSV attachment.
pub async fn export_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Path(plan_id): Path<String>,
) -> Result<Response, ApiError> {
    let filename = format!("budget-{plan_id}.csv");
    let csv = with_conn(&state, move |conn| Ok(export_csv(conn, &user.id, &plan_id)?)).await?;

    Ok((
        [
            (header::CONTENT_TYPE, "text/csv; charset=utf-8".to_string()),
            (
                header::CONTENT_DISPOSITION,
                format!("attachment; filename=\"{filename}\""),
            ),
        ],
        csv,
    )
        .into_response())
}
