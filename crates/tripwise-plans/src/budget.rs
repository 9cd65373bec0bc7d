//! Expenses recorded against a travel plan.
//!
//! Items carry no user column; ownership is checked by joining through
//! `travel_plans`.

use crate::{label_column, now_timestamp, parse_date, plans::get_plan, PlanError};
use rusqlite::{params, Connection, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use tripwise_types::BudgetCategory;
use uuid::Uuid;

/// A stored budget item.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BudgetItem {
    pub id: String,
    pub plan_id: String,
    pub category: BudgetCategory,
    pub description: String,
    pub amount: f64,
    pub date: String,
    pub notes: String,
    pub created_at: String,
    pub updated_at: String,
}

/// Parameters for recording an expense.
#[derive(Debug, Clone, Deserialize)]
pub struct NewBudgetItem {
    pub category: BudgetCategory,
    pub description: String,
    pub amount: f64,
    pub date: String,
    #[serde(default)]
    pub notes: String,
}

/// Partial update of a budget item.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BudgetItemUpdate {
    pub category: Option<BudgetCategory>,
    pub description: Option<String>,
    pub amount: Option<f64>,
    pub date: Option<String>,
    pub notes: Option<String>,
}

fn validate_amount(amount: f64) -> Result<(), PlanError> {
    if !amount.is_finite() || amount <= 0.0 {
        return Err(PlanError::Invalid(
            "amount must be a number greater than 0".to_string(),
        ));
    }
    Ok(())
}

fn validate_item(description: &str, amount: f64, date: &str) -> Result<(), PlanError> {
    if description.trim().is_empty() {
        return Err(PlanError::Invalid("description is required".to_string()));
    }
    validate_amount(amount)?;
    parse_date(date)?;
    Ok(())
}

const ITEM_COLUMNS: &str =
    "budget_items.id, budget_items.plan_id, budget_items.category, budget_items.description,
     budget_items.amount, budget_items.date, budget_items.notes, budget_items.created_at,
     budget_items.updated_at";

/// Lists the items of a plan owned by `user_id`, latest date first.
pub fn list_items(
    conn: &Connection,
    user_id: &str,
    plan_id: &str,
) -> Result<Vec<BudgetItem>, PlanError> {
    get_plan(conn, user_id, plan_id)?;

    let mut stmt = conn.prepare(&format!(
        "SELECT {ITEM_COLUMNS} FROM budget_items
         WHERE plan_id = ?1
         ORDER BY date DESC, created_at DESC"
    ))?;
    let rows = stmt.query_map([plan_id], map_row_to_item)?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row?);
    }
    Ok(items)
}

/// Records an expense against a plan owned by `user_id`.
pub fn create_item(
    conn: &Connection,
    user_id: &str,
    plan_id: &str,
    item: &NewBudgetItem,
) -> Result<BudgetItem, PlanError> {
    validate_item(&item.description, item.amount, &item.date)?;
    get_plan(conn, user_id, plan_id)?;

    let now = now_timestamp();
    let stored = conn.query_row(
        &format!(
            "INSERT INTO budget_items (id, plan_id, category, description, amount, date, notes, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?8)
             RETURNING {ITEM_COLUMNS}"
        ),
        params![
            Uuid::new_v4().to_string(),
            plan_id,
            item.category.as_str(),
            item.description.trim(),
            item.amount,
            item.date,
            item.notes,
            now,
        ],
        map_row_to_item,
    )?;

    tracing::debug!(item_id = %stored.id, plan_id, category = %stored.category, "budget item recorded");
    Ok(stored)
}

/// Retrieves an item whose plan is owned by `user_id`.
pub fn get_item(conn: &Connection, user_id: &str, item_id: &str) -> Result<BudgetItem, PlanError> {
    conn.query_row(
        &format!(
            "SELECT {ITEM_COLUMNS} FROM budget_items
             JOIN travel_plans ON travel_plans.id = budget_items.plan_id
             WHERE budget_items.id = ?1 AND travel_plans.user_id = ?2"
        ),
        [item_id, user_id],
        map_row_to_item,
    )
    .optional()?
    .ok_or(PlanError::NotFound("budget item"))
}

/// Applies a partial update to an item whose plan is owned by `user_id`.
pub fn update_item(
    conn: &Connection,
    user_id: &str,
    item_id: &str,
    update: &BudgetItemUpdate,
) -> Result<BudgetItem, PlanError> {
    let tx = conn.unchecked_transaction()?;
    let mut item = get_item(&tx, user_id, item_id)?;

    if let Some(category) = update.category {
        item.category = category;
    }
    if let Some(description) = &update.description {
        item.description = description.trim().to_string();
    }
    if let Some(amount) = update.amount {
        item.amount = amount;
    }
    if let Some(date) = &update.date {
        item.date = date.clone();
    }
    if let Some(notes) = &update.notes {
        item.notes = notes.clone();
    }
    validate_item(&item.description, item.amount, &item.date)?;

    let updated = tx.query_row(
        &format!(
            "UPDATE budget_items SET
                category = ?1, description = ?2, amount = ?3, date = ?4, notes = ?5,
                updated_at = ?6
             WHERE id = ?7
             RETURNING {ITEM_COLUMNS}"
        ),
        params![
            item.category.as_str(),
            item.description,
            item.amount,
            item.date,
            item.notes,
            now_timestamp(),
            item_id,
        ],
        map_row_to_item,
    )?;
    tx.commit()?;

    Ok(updated)
}

/// Deletes an item whose plan is owned by `user_id`.
pub fn delete_item(conn: &Connection, user_id: &str, item_id: &str) -> Result<(), PlanError> {
    let count = conn.execute(
        "DELETE FROM budget_items
         WHERE id = ?1
           AND plan_id IN (SELECT id FROM travel_plans WHERE user_id = ?2)",
        [item_id, user_id],
    )?;
    if count == 0 {
        return Err(PlanError::NotFound("budget item"));
    }
    Ok(())
}

fn map_row_to_item(row: &Row) -> rusqlite::Result<BudgetItem> {
    Ok(BudgetItem {
        id: row.get(0)?,
        plan_id: row.get(1)?,
        category: label_column(2, row.get(2)?)?,
        description: row.get(3)?,
        amount: row.get(4)?,
        date: row.get(5)?,
        notes: row.get(6)?,
        created_at: row.get(7)?,
        updated_at: row.get(8)?,
    })
}
