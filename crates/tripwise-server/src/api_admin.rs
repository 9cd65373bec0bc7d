//! Admin API handlers.

use crate::api::{ok, with_conn, ApiResult};
use crate::middleware::CurrentUser;
use crate::AppState;
use axum::extract::Extension;
use serde::Serialize;
use std::sync::Arc;
use tripwise_plans::{count_items, count_plans, count_users};

#[derive(Debug, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct SystemStats {
    pub total_users: u64,
    pub total_plans: u64,
    pub total_budget_items: u64,
}

/// Handler for `GET /api/admin/stats`.
///
/// Requires the admin role.
pub async fn stats_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(admin)): Extension<CurrentUser>,
) -> ApiResult<SystemStats> {
    let stats = with_conn(&state, |conn| {
        Ok(SystemStats {
            total_users: count_users(conn)?,
            total_plans: count_plans(conn)?,
            total_budget_items: count_items(conn)?,
        })
    })
    .await?;

    tracing::info!(admin = %admin.id, "system statistics fetched");
    ok(stats, "system statistics fetched")
}
