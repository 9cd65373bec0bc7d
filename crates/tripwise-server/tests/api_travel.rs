mod common;

use axum::extract::State;
use axum::http::{Method, StatusCode};
use axum::routing::post;
use axum::{Json, Router};
use common::{call, register, router, test_state_with};
use serde_json::{json, Value};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tripwise_ai::AiConfig;
use tripwise_map::MapConfig;
use tripwise_server::app;

fn sample_plan() -> Value {
    json!({
        "title": "Hangzhou long weekend",
        "destination": "Hangzhou",
        "startDate": "2026-05-01",
        "endDate": "2026-05-03",
        "budget": 3000.0,
        "travelers": 2,
        "preferences": ["food", "culture"],
        "notes": "window seat"
    })
}

async fn create_plan(app: &Router, token: &str) -> String {
    let (status, body) = call(
        app,
        Method::POST,
        "/api/travel/plans",
        Some(token),
        Some(sample_plan()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "create failed: {body}");
    body["data"]["id"].as_str().unwrap().to_string()
}

#[tokio::test]
async fn plan_crud_round_trip() {
    let app = router();
    let (token, user_id) = register(&app, "alice@example.com", "Alice").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/travel/plans",
        Some(&token),
        Some(sample_plan()),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    let plan = &body["data"];
    assert_eq!(plan["user_id"], user_id.as_str());
    assert_eq!(plan["days"], 3);
    assert_eq!(plan["status"], "draft");
    assert_eq!(plan["ai_generated"], false);
    assert_eq!(plan["preferences"], json!(["food", "culture"]));
    let plan_id = plan["id"].as_str().unwrap().to_string();

    let (status, body) = call(&app, Method::GET, "/api/travel/plans", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"].as_array().unwrap().len(), 1);

    let uri = format!("/api/travel/plans/{plan_id}");
    let (status, body) = call(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["title"], "Hangzhou long weekend");

    let (status, body) = call(
        &app,
        Method::PUT,
        &uri,
        Some(&token),
        Some(json!({ "endDate": "2026-05-05", "status": "active" })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["days"], 5);
    assert_eq!(body["data"]["status"], "active");

    let (status, body) = call(&app, Method::DELETE, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["success"], true);

    let (status, _) = call(&app, Method::GET, &uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn create_plan_validates_input() {
    let app = router();
    let (token, _) = register(&app, "bob@example.com", "Bob").await;

    let mut missing = sample_plan();
    missing.as_object_mut().unwrap().remove("budget");
    let (status, _) = call(&app, Method::POST, "/api/travel/plans", Some(&token), Some(missing)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let mut reversed = sample_plan();
    reversed["endDate"] = json!("2026-04-20");
    let (status, body) = call(&app, Method::POST, "/api/travel/plans", Some(&token), Some(reversed)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let mut no_travelers = sample_plan();
    no_travelers["travelers"] = json!(0);
    let (status, _) =
        call(&app, Method::POST, "/api/travel/plans", Some(&token), Some(no_travelers)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn plans_of_other_users_are_not_found() {
    let app = router();
    let (owner, _) = register(&app, "owner@example.com", "Owner").await;
    let (stranger, _) = register(&app, "stranger@example.com", "Stranger").await;
    let plan_id = create_plan(&app, &owner).await;
    let uri = format!("/api/travel/plans/{plan_id}");

    let (status, _) = call(&app, Method::GET, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(
        &app,
        Method::PUT,
        &uri,
        Some(&stranger),
        Some(json!({ "title": "mine now" })),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (status, _) = call(&app, Method::DELETE, &uri, Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (_, body) = call(&app, Method::GET, "/api/travel/plans", Some(&stranger), None).await;
    assert!(body["data"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn stats_count_plans_by_status() {
    let app = router();
    let (token, _) = register(&app, "carol@example.com", "Carol").await;
    create_plan(&app, &token).await;
    let done = create_plan(&app, &token).await;
    call(
        &app,
        Method::PUT,
        &format!("/api/travel/plans/{done}"),
        Some(&token),
        Some(json!({ "status": "completed" })),
    )
    .await;

    let (status, body) = call(&app, Method::GET, "/api/travel/stats", Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    let stats = &body["data"];
    assert_eq!(stats["totalPlans"], 2);
    assert_eq!(stats["completedPlans"], 1);
    assert_eq!(stats["totalBudget"], 6000.0);
    assert_eq!(stats["plansByStatus"]["draft"], 1);
    assert_eq!(stats["plansByStatus"]["completed"], 1);
}

#[tokio::test]
async fn ai_routes_report_unconfigured_service() {
    let app = router();
    let (token, _) = register(&app, "dave@example.com", "Dave").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/travel/plans/ai-generate",
        Some(&token),
        Some(json!({ "destination": "Chengdu", "days": 3, "budget": 2000, "travelers": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    assert_eq!(body["success"], false);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/travel/plans/ai-generate",
        Some(&token),
        Some(json!({ "destination": "Chengdu", "budget": 2000, "travelers": 1 })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = call(
        &app,
        Method::POST,
        "/api/travel/advice",
        Some(&token),
        Some(json!({ "destination": "Chengdu" })),
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);

    let (status, _) = call(
        &app,
        Method::GET,
        "/api/travel/search-destination?keyword=hotpot",
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
}

type Seen = Arc<Mutex<Vec<Value>>>;

async fn completions(State(seen): State<Seen>, Json(request): Json<Value>) -> Json<Value> {
    seen.lock().unwrap().push(request);
    let document = json!({
        "title": "Chengdu food tour",
        "summary": "Three days of Sichuan cooking",
        "dailyItinerary": [{ "day": 1, "activities": [] }],
        "budgetBreakdown": { "food": 800 },
        "travelTips": ["carry cash"],
        "emergencyContacts": [{ "name": "Police", "phone": "110" }]
    });
    Json(json!({
        "data": {
            "choices": [{
                "message": {
                    "role": "assistant",
                    "content": format!("Here you go:\n```json\n{document}\n```")
                }
            }],
            "usage": { "input_tokens": 120, "output_tokens": 480 }
        }
    }))
}

async fn spawn_llm() -> (String, Seen) {
    let seen = Seen::default();
    let mock = Router::new()
        .route("/v2/app/completions", post(completions))
        .with_state(seen.clone());
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, mock).await.unwrap();
    });
    (format!("http://{addr}"), seen)
}

#[tokio::test]
async fn ai_generate_stores_generated_plan() {
    let (endpoint, seen) = spawn_llm().await;
    let ai = AiConfig {
        endpoint,
        ..AiConfig::new("test-key", "test-secret")
    };
    let app = app(test_state_with(ai, MapConfig::default()));
    let (token, _) = register(&app, "erin@example.com", "Erin").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/travel/plans/ai-generate",
        Some(&token),
        Some(json!({
            "destination": "Chengdu",
            "days": 3,
            "budget": 2500,
            "travelers": 2,
            "preferences": ["food"]
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "generate failed: {body}");

    let data = &body["data"];
    assert_eq!(data["plan"]["title"], "Chengdu food tour");
    assert_eq!(data["plan"]["status"], "generated");
    assert_eq!(data["plan"]["ai_generated"], true);
    assert_eq!(data["plan"]["days"], 3);
    assert_eq!(data["plan"]["budget_breakdown"]["food"], 800);
    assert_eq!(data["plan"]["emergency_contacts"][0]["phone"], "110");
    assert_eq!(data["aiResponse"]["summary"], "Three days of Sichuan cooking");
    assert_eq!(data["usage"]["output_tokens"], 480);
    assert_eq!(seen.lock().unwrap().len(), 1);

    let (_, body) = call(&app, Method::GET, "/api/travel/plans", Some(&token), None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
}

#[tokio::test]
async fn lone_invalid_dates_are_rejected() {
    let (endpoint, seen) = spawn_llm().await;
    let ai = AiConfig {
        endpoint,
        ..AiConfig::new("test-key", "test-secret")
    };
    let app = app(test_state_with(ai, MapConfig::default()));
    let (token, _) = register(&app, "frank@example.com", "Frank").await;

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/travel/plans/ai-generate",
        Some(&token),
        Some(json!({
            "destination": "Chengdu",
            "days": 3,
            "budget": 2500,
            "travelers": 2,
            "endDate": "not-a-date"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST, "{body}");
    assert!(seen.lock().unwrap().is_empty());

    let (status, body) = call(
        &app,
        Method::POST,
        "/api/travel/plans/ai-generate",
        Some(&token),
        Some(json!({ "destination": "Chengdu", "days": 3, "budget": 2500, "travelers": 2 })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    let plan_id = body["data"]["plan"]["id"].as_str().unwrap().to_string();
    let plan_uri = format!("/api/travel/plans/{plan_id}");

    let (status, _) = call(
        &app,
        Method::PUT,
        &plan_uri,
        Some(&token),
        Some(json!({ "endDate": "not-a-date" })),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, body) = call(&app, Method::GET, &plan_uri, Some(&token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["data"]["end_date"].is_null());

    let (status, _) = call(
        &app,
        Method::GET,
        &format!("/api/budget/plans/{plan_id}/summary"),
        Some(&token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);
}
