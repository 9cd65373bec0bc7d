mod common;

use axum::http::{header, Method, StatusCode};
use axum::Router;
use common::{call, json_request, register, router, send};
use serde_json::json;

async fn plan_with_budget(app: &Router, token: &str, budget: f64) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/travel/plans",
        Some(token),
        Some(json!({
            "title": "Xi'an history trip",
            "destination": "Xi'an",
            "startDate": "2026-09-01",
            "endDate": "2026-09-04",
            "budget": budget,
            "travelers": 1
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

async fn add_item(
    app: &Router,
    token: &str,
    plan_id: &str,
    category: &str,
    description: &str,
    amount: f64,
    date: &str,
) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        &format!("/api/budget/plans/{plan_id}/items"),
        Some(token),
        Some(json!({
            "category": category,
            "description": description,
            "amount": amount,
            "date": date
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "add item failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn items_can_be_added_updated_and_removed() {
    let app = router();
    let (token, _) = register(&app, "alice@example.com", "Alice").await;
    let plan_id = plan_with_budget(&app, &token, 2000.0).await;

    let hotel = add_item(&app, &token, &plan_id, "accommodation", "Hotel", 600.0, "2026-09-01").await;
    add_item(&app, &token, &plan_id, "food", "Dumplings", 80.0, "2026-09-02").await;

    let items_uri = format!("/api/budget/plans/{plan_id}/items");
    let (status, body) = call(&app, Method::GET, &items_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let items = body["data"].as_array().unwrap();
    assert_eq!(items.len(), 2);
    assert_eq!(items[0]["description"], "Dumplings");
    assert_eq!(items[1]["category"], "accommodation");

    let item_uri = format!("/api/budget/items/{hotel}");
    let (status, body) = call(
        &app,
        Method::PUT,
        &item_uri,
        Some(&token),
        Some(json!({ "amount": 650.5, "notes": "late checkout" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["amount"], 650.5);
    assert_eq!(body["data"]["notes"], "late checkout");

    let (status, _) = call(&app, Method::DELETE, &item_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let (status, _) = call(&app, Method::DELETE, &item_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, Method::GET, &items_uri, Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn invalid_items_are_rejected() {
    let app = router();
    let (token, _) = register(&app, "bob@example.com", "Bob").await;
    let plan_id = plan_with_budget(&app, &token, 1000.0).await;
    let uri = format!("/api/budget/plans/{plan_id}/items");

    let cases = [
        json!({ "category": "souvenirs", "description": "Magnet", "amount": 5.0, "date": "2026-09-01" }),
        json!({ "category": "food", "description": "Tea", "amount": 0.0, "date": "2026-09-01" }),
        json!({ "category": "food", "description": "Tea", "amount": 12.0, "date": "yesterday" }),
        json!({ "category": "food", "amount": 12.0, "date": "2026-09-01" }),
    ];
    for case in cases {
        let (status, body) = call(&app, Method::POST, &uri, Some(&token), Some(case)).await;
        assert_eq!(status, StatusCode::BAD_REQUEST, "accepted: {body}");
    }
}

#[tokio::test]
async fn budget_routes_hide_other_users_plans() {
    let app = router();
    let (owner, _) = register(&app, "owner@example.com", "Owner").await;
    let (stranger, _) = register(&app, "stranger@example.com", "Stranger").await;
    let plan_id = plan_with_budget(&app, &owner, 1000.0).await;
    let item_id = add_item(&app, &owner, &plan_id, "food", "Noodles", 30.0, "2026-09-02").await;

    for path in ["items", "summary", "categories", "export"] {
        let uri = format!("/api/budget/plans/{plan_id}/{path}");
        let (status, _) = call(&app, Method::GET, &uri, Some(&stranger), None).await;
        assert_eq!(status, StatusCode::NOT_FOUND, "{path} leaked");
    }

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/budget/plans/{plan_id}/items"),
        Some(&stranger),
        Some(json!({ "category": "food", "description": "x", "amount": 1.0, "date": "2026-09-02" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::DELETE,
        &format!("/api/budget/items/{item_id}"),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = call(
        &app,
        Method::POST,
        &format!("/api/budget/plans/{plan_id}/analyze"),
        Some(&stranger),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn summary_and_categories_aggregate_spending() {
    let app = router();
    let (token, _) = register(&app, "carol@example.com", "Carol").await;
    let plan_id = plan_with_budget(&app, &token, 1000.0).await;
    add_item(&app, &token, &plan_id, "food", "Lunch", 150.0, "2026-09-01").await;
    add_item(&app, &token, &plan_id, "food", "Dinner", 100.0, "2026-09-01").await;
    add_item(&app, &token, &plan_id, "transportation", "Train", 250.0, "2026-09-02").await;

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/budget/plans/{plan_id}/summary"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let summary = &body["data"];
    assert_eq!(summary["totalBudget"], 1000.0);
    assert_eq!(summary["totalSpent"], 500.0);
    assert_eq!(summary["remainingBudget"], 500.0);
    assert_eq!(summary["budgetUtilization"], 50.0);
    assert_eq!(summary["byCategory"]["food"]["count"], 2);
    assert!(summary["byCategory"].get("shopping").is_none());

    let (status, body) = call(
        &app,
        Method::GET,
        &format!("/api/budget/plans/{plan_id}/categories"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    let categories = body["data"].as_object().unwrap();
    assert_eq!(categories.len(), 6);
    assert_eq!(categories["food"]["percentage"], 50);
    assert_eq!(categories["transportation"]["spent"], 250.0);
    assert_eq!(categories["shopping"]["count"], 0);
}

#[tokio::test]
async fn export_returns_csv_attachment() {
    let app = router();
    let (token, _) = register(&app, "dave@example.com", "Dave").await;
    let plan_id = plan_with_budget(&app, &token, 1000.0).await;
    add_item(&app, &token, &plan_id, "activities", "Terracotta \"Army\" tour", 120.0, "2026-09-02").await;

    let response = send(
        &app,
        json_request(
            Method::GET,
            &format!("/api/budget/plans/{plan_id}/export"),
            Some(&token),
            None,
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let headers = response.headers();
    assert!(headers[header::CONTENT_TYPE]
        .to_str()
        .unwrap()
        .starts_with("text/csv"));
    assert_eq!(
        headers[header::CONTENT_DISPOSITION],
        format!("attachment; filename=\"budget-{plan_id}.csv\"").as_str()
    );

    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    let csv = String::from_utf8(bytes.to_vec()).unwrap();
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("category,description,amount,date,notes"));
    assert_eq!(
        lines.next(),
        Some("\"activities\",\"Terracotta \"\"Army\"\" tour\",120,\"2026-09-02\",\"\"")
    );
}

#[tokio::test]
async fn analyze_requires_configured_ai() {
    let app = router();
    let (token, _) = register(&app, "erin@example.com", "Erin").await;
    let plan_id = plan_with_budget(&app, &token, 1000.0).await;

    let (status, body) = call(
        &app,
        Method::POST,
        &format!("/api/budget/plans/{plan_id}/analyze"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);
}
