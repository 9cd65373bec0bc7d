//! Budget aggregates and CSV export.

use crate::{label_column, parse_date, plans::get_plan, PlanError};
use chrono::NaiveDate;
use rusqlite::Connection;
use serde::Serialize;
use std::collections::BTreeMap;
use std::fmt::Write as _;
use tripwise_types::BudgetCategory;

/// Column header line of the CSV export.
pub const CSV_HEADER: &str = "category,description,amount,date,notes";

/// Money spent in one category.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct CategorySpend {
    pub spent: f64,
    pub count: u64,
}

/// Money spent in one category with its share of total spending.
#[derive(Debug, Clone, Copy, Default, Serialize, PartialEq)]
pub struct CategoryShare {
    pub spent: f64,
    pub count: u64,
    /// Whole-number percentage of total spending.
    pub percentage: u32,
}

/// Spending against a plan's budget.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct BudgetSummary {
    pub total_budget: f64,
    pub total_spent: f64,
    pub remaining_budget: f64,
    /// Percent of the budget spent, two decimal places.
    pub budget_utilization: f64,
    /// Only categories with at least one item.
    pub by_category: BTreeMap<BudgetCategory, CategorySpend>,
    pub remaining_days: i64,
    pub daily_budget: f64,
}

fn spend_by_category(
    conn: &Connection,
    plan_id: &str,
) -> Result<BTreeMap<BudgetCategory, CategorySpend>, PlanError> {
    let mut stmt = conn.prepare(
        "SELECT category, COALESCE(SUM(amount), 0), COUNT(*)
         FROM budget_items WHERE plan_id = ?1 GROUP BY category",
    )?;
    let rows = stmt.query_map([plan_id], |row| {
        Ok((
            label_column::<BudgetCategory>(0, row.get(0)?)?,
            CategorySpend {
                spent: row.get(1)?,
                count: row.get(2)?,
            },
        ))
    })?;

    let mut spend = BTreeMap::new();
    for row in rows {
        let (category, totals) = row?;
        spend.insert(category, totals);
    }
    Ok(spend)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Summarises spending on a plan owned by `user_id` as of `today`.
///
/// `remaining_days` counts from `today` to the plan's end date and is zero
/// once the trip is over or when the plan has no end date.
pub fn budget_summary(
    conn: &Connection,
    user_id: &str,
    plan_id: &str,
    today: NaiveDate,
) -> Result<BudgetSummary, PlanError> {
    let plan = get_plan(conn, user_id, plan_id)?;
    let by_category = spend_by_category(conn, plan_id)?;

    let total_spent: f64 = by_category.values().map(|c| c.spent).sum();
    let remaining_budget = (plan.budget - total_spent).max(0.0);
    let budget_utilization = if plan.budget > 0.0 {
        round2(total_spent / plan.budget * 100.0)
    } else {
        0.0
    };
    let remaining_days = match plan.end_date.as_deref() {
        Some(end) => (parse_date(end)? - today).num_days().max(0),
        None => 0,
    };
    let daily_budget = if remaining_days > 0 {
        remaining_budget / remaining_days as f64
    } else {
        0.0
    };

    Ok(BudgetSummary {
        total_budget: plan.budget,
        total_spent,
        remaining_budget,
        budget_utilization,
        by_category,
        remaining_days,
        daily_budget,
    })
}

/// Spending per category for a plan owned by `user_id`. Every category is
/// present, including those with no items.
pub fn category_breakdown(
    conn: &Connection,
    user_id: &str,
    plan_id: &str,
) -> Result<BTreeMap<BudgetCategory, CategoryShare>, PlanError> {
    get_plan(conn, user_id, plan_id)?;
    let spend = spend_by_category(conn, plan_id)?;
    let total: f64 = spend.values().map(|c| c.spent).sum();

    Ok(BudgetCategory::ALL
        .into_iter()
        .map(|category| {
            let CategorySpend { spent, count } = spend.get(&category).copied().unwrap_or_default();
            let percentage = if total > 0.0 {
                (spent / total * 100.0).round() as u32
            } else {
                0
            };
            (
                category,
                CategoryShare {
                    spent,
                    count,
                    percentage,
                },
            )
        })
        .collect())
}

fn quoted(field: &str) -> String {
    format!("\"{}\"", field.replace('"', "\"\""))
}

/// Renders the items of a plan owned by `user_id` as CSV, latest date first.
pub fn export_csv(conn: &Connection, user_id: &str, plan_id: &str) -> Result<String, PlanError> {
    let items = crate::list_items(conn, user_id, plan_id)?;

    let mut csv = String::from(CSV_HEADER);
    for item in &items {
        // Writing to a String cannot fail.
        let _ = write!(
            csv,
            "\n{},{},{},{},{}",
            quoted(item.category.as_str()),
            quoted(&item.description),
            item.amount,
            quoted(&item.date),
            quoted(&item.notes),
        );
    }
    csv.push('\n');
    Ok(csv)
}

/// Counts all stored budget items.
pub fn count_items(conn: &Connection) -> Result<u64, PlanError> {
    Ok(conn.query_row("SELECT COUNT(*) FROM budget_items", [], |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{seed_plan, seed_user, setup_db};
    use crate::{create_item, NewBudgetItem};
    use serde_json::json;

    fn spend(conn: &Connection, user_id: &str, plan_id: &str, category: BudgetCategory, amount: f64) {
        create_item(
            conn,
            user_id,
            plan_id,
            &NewBudgetItem {
                category,
                description: format!("{category} expense"),
                amount,
                date: "2024-04-02".to_string(),
                notes: String::new(),
            },
        )
        .unwrap();
    }

    fn date(s: &str) -> NaiveDate {
        NaiveDate::parse_from_str(s, "%Y-%m-%d").unwrap()
    }

    #[test]
    fn test_summary_mid_trip() {
        let conn = setup_db();
        let user = seed_user(&conn, "sum@example.com");
        let plan = seed_plan(&conn, &user.id, 3000.0);
        spend(&conn, &user.id, &plan.id, BudgetCategory::Food, 200.0);
        spend(&conn, &user.id, &plan.id, BudgetCategory::Food, 100.0);
        spend(&conn, &user.id, &plan.id, BudgetCategory::Accommodation, 700.0);

        let summary = budget_summary(&conn, &user.id, &plan.id, date("2024-04-03")).unwrap();
        assert_eq!(summary.total_budget, 3000.0);
        assert_eq!(summary.total_spent, 1000.0);
        assert_eq!(summary.remaining_budget, 2000.0);
        assert_eq!(summary.budget_utilization, 33.33);
        assert_eq!(summary.remaining_days, 2);
        assert_eq!(summary.daily_budget, 1000.0);
        assert_eq!(
            summary.by_category[&BudgetCategory::Food],
            CategorySpend { spent: 300.0, count: 2 }
        );
        assert!(!summary.by_category.contains_key(&BudgetCategory::Shopping));

        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["byCategory"]["food"], json!({ "spent": 300.0, "count": 2 }));
        assert_eq!(json["remainingDays"], 2);
    }

    #[test]
    fn test_summary_overspent_after_trip() {
        let conn = setup_db();
        let user = seed_user(&conn, "over@example.com");
        let plan = seed_plan(&conn, &user.id, 100.0);
        spend(&conn, &user.id, &plan.id, BudgetCategory::Shopping, 150.0);

        let summary = budget_summary(&conn, &user.id, &plan.id, date("2024-05-01")).unwrap();
        assert_eq!(summary.remaining_budget, 0.0);
        assert_eq!(summary.budget_utilization, 150.0);
        assert_eq!(summary.remaining_days, 0);
        assert_eq!(summary.daily_budget, 0.0);
    }

    #[test]
    fn test_breakdown_lists_every_category() {
        let conn = setup_db();
        let user = seed_user(&conn, "cat@example.com");
        let plan = seed_plan(&conn, &user.id, 3000.0);

        let empty = category_breakdown(&conn, &user.id, &plan.id).unwrap();
        assert_eq!(empty.len(), 6);
        assert!(empty.values().all(|c| c.percentage == 0 && c.count == 0));

        spend(&conn, &user.id, &plan.id, BudgetCategory::Transportation, 100.0);
        spend(&conn, &user.id, &plan.id, BudgetCategory::Food, 200.0);

        let shares = category_breakdown(&conn, &user.id, &plan.id).unwrap();
        assert_eq!(shares[&BudgetCategory::Transportation].percentage, 33);
        assert_eq!(shares[&BudgetCategory::Food].percentage, 67);
        assert_eq!(shares[&BudgetCategory::Other].spent, 0.0);
    }

    #[test]
    fn test_export_csv_quotes_text() {
        let conn = setup_db();
        let user = seed_user(&conn, "csv@example.com");
        let plan = seed_plan(&conn, &user.id, 3000.0);
        create_item(
            &conn,
            &user.id,
            &plan.id,
            &NewBudgetItem {
                category: BudgetCategory::Food,
                description: "Dinner, \"omakase\"".to_string(),
                amount: 120.5,
                date: "2024-04-02".to_string(),
                notes: "split".to_string(),
            },
        )
        .unwrap();

        let csv = export_csv(&conn, &user.id, &plan.id).unwrap();
        let lines: Vec<&str> = csv.lines().collect();
        assert_eq!(lines[0], CSV_HEADER);
        assert_eq!(
            lines[1],
            r#""food","Dinner, ""omakase""",120.5,"2024-04-02","split""#
        );
    }

    #[test]
    fn test_reports_are_owner_scoped() {
        let conn = setup_db();
        let owner = seed_user(&conn, "owner@example.com");
        let other = seed_user(&conn, "other@example.com");
        let plan = seed_plan(&conn, &owner.id, 3000.0);

        assert!(matches!(
            budget_summary(&conn, &other.id, &plan.id, date("2024-04-01")),
            Err(PlanError::NotFound(_))
        ));
        assert!(matches!(
            export_csv(&conn, &other.id, &plan.id),
            Err(PlanError::NotFound(_))
        ));
        assert_eq!(count_items(&conn).unwrap(), 0);
    }
}
