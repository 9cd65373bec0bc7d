use axum::extract::{Path, Query, State};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use tripwise_map::{MapClient, MapConfig, MapError};
use tripwise_types::Coordinates;

type Seen = Arc<Mutex<Vec<(String, HashMap<String, String>)>>>;

#[derive(Clone)]
struct Mock {
    seen: Seen,
}

fn reply_for(path: &str, query: &HashMap<String, String>) -> Value {
    match path {
        "geocode/geo" if query["address"] == "nowhere" => json!({
            "status": "0",
            "info": "ENGINE_RESPONSE_DATA_ERROR",
        }),
        "geocode/geo" => json!({
            "status": "1",
            "info": "OK",
            "geocodes": [{
                "formatted_address": "Zhejiang Hangzhou West Lake",
                "province": "Zhejiang",
                "city": "Hangzhou",
                "district": "Xihu",
                "location": "120.130663,30.240018"
            }]
        }),
        "geocode/regeo" => json!({
            "status": "1",
            "regeocode": {
                "formatted_address": "Beijing Dongcheng Donghuamen",
                "addressComponent": {
                    "country": "China",
                    "province": "Beijing",
                    "city": [],
                    "district": "Dongcheng",
                    "township": "Donghuamen",
                    "neighborhood": { "name": "Forbidden City", "type": [] },
                    "streetNumber": { "street": "Jingshan Front St", "number": "4" }
                },
                "pois": [{ "name": "Palace Museum" }]
            }
        }),
        "place/text" => json!({
            "status": "1",
            "count": "42",
            "pois": [{
                "id": "B0FFFAB6J2",
                "name": "Lingyin Temple",
                "type": "Scenic spot",
                "typecode": "110205",
                "address": "1 Fayun Lane",
                "location": "120.101028,30.240919",
                "pname": "Zhejiang",
                "cityname": "Hangzhou",
                "adname": "Xihu",
                "tel": "0571-87968665",
                "distance": "350",
                "business_area": "Lingyin"
            }]
        }),
        "direction/driving" => json!({
            "status": "1",
            "route": {
                "paths": [{
                    "distance": "12500",
                    "duration": "1800",
                    "tolls": "0",
                    "toll_distance": "0",
                    "traffic_lights": "14",
                    "steps": [{
                        "instruction": "Head east on Nanshan Rd",
                        "orientation": "east",
                        "road": "Nanshan Rd",
                        "distance": "600",
                        "duration": "90",
                        "polyline": "120.1,30.2;120.2,30.2",
                        "action": []
                    }]
                }]
            }
        }),
        "direction/transit/integrated" => json!({
            "status": "1",
            "route": {
                "transits": [{
                    "cost": "4",
                    "duration": "2400",
                    "walking_distance": "800",
                    "distance": "9000",
                    "nightflag": "0",
                    "segments": [{ "walking": { "distance": "300" }, "bus": { "buslines": [] }, "railway": [], "taxi": [] }]
                }]
            }
        }),
        "weather/weatherInfo" if query["extensions"] == "base" => json!({
            "status": "1",
            "lives": [{
                "province": "Zhejiang",
                "city": "Hangzhou",
                "weather": "Cloudy",
                "temperature": "21",
                "winddirection": "NE",
                "windpower": "<=3",
                "humidity": "68",
                "reporttime": "2024-04-01 10:00:00"
            }]
        }),
        "weather/weatherInfo" => json!({
            "status": "1",
            "forecasts": [{ "city": "Hangzhou", "casts": [{ "date": "2024-04-01", "dayweather": "Cloudy" }] }]
        }),
        "ip" => json!({
            "status": "1",
            "province": "Zhejiang",
            "city": "Hangzhou",
            "rectangle": "120.0,30.0;120.4,30.4"
        }),
        _ => json!({ "status": "0", "info": "INVALID_REQUEST" }),
    }
}

async fn handler(
    State(mock): State<Mock>,
    Path(path): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Json<Value> {
    assert_eq!(query.get("key").map(String::as_str), Some("amap-test"));
    let reply = reply_for(&path, &query);
    mock.seen.lock().unwrap().push((path, query));
    Json(reply)
}

async fn spawn_mock() -> (MapClient, Seen) {
    let seen: Seen = Arc::new(Mutex::new(Vec::new()));
    let app = Router::new()
        .route("/v3/{*path}", get(handler))
        .with_state(Mock { seen: seen.clone() });

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let mut config = MapConfig::new("amap-test");
    config.base_url = format!("http://{addr}/v3");
    (MapClient::new(config).unwrap(), seen)
}

fn last_query(seen: &Seen) -> HashMap<String, String> {
    seen.lock().unwrap().last().unwrap().1.clone()
}

#[tokio::test]
async fn geocode_and_vendor_failure() {
    let (client, seen) = spawn_mock().await;

    let result = client.geocode("West Lake", Some("Hangzhou")).await.unwrap();
    assert_eq!(result.location.lat, 30.240018);
    assert_eq!(result.location.district, "Xihu");
    assert_eq!(last_query(&seen)["city"], "Hangzhou");

    let err = client.geocode("nowhere", None).await.unwrap_err();
    match err {
        MapError::Vendor(info) => assert_eq!(info, "ENGINE_RESPONSE_DATA_ERROR"),
        other => panic!("expected vendor error, got {other:?}"),
    }
    assert!(!last_query(&seen).contains_key("city"));
}

#[tokio::test]
async fn reverse_geocode_flattens_components() {
    let (client, seen) = spawn_mock().await;

    let result = client.reverse_geocode(39.9163, 116.3972).await.unwrap();
    assert_eq!(result.address.city, "");
    assert_eq!(result.address.neighborhood, "Forbidden City");
    assert_eq!(result.address.street_number, "4");
    assert_eq!(result.pois[0]["name"], "Palace Museum");

    let query = last_query(&seen);
    assert_eq!(query["location"], "116.3972,39.9163");
    assert_eq!(query["extensions"], "all");
}

#[tokio::test]
async fn poi_search_pages() {
    let (client, seen) = spawn_mock().await;

    let search = client
        .search_poi("temple", Some("Hangzhou"), Some("110000"), 2, 10)
        .await
        .unwrap();
    assert_eq!(search.total, 42);
    assert_eq!(search.page, 2);
    assert_eq!(search.pois[0].distance, Some(350.0));
    assert_eq!(search.pois[0].location, Coordinates::new(30.240919, 120.101028));

    let query = last_query(&seen);
    assert_eq!(query["offset"], "10");
    assert_eq!(query["page"], "2");
    assert_eq!(query["types"], "110000");
}

#[tokio::test]
async fn driving_route_with_waypoints() {
    let (client, seen) = spawn_mock().await;

    let route = client
        .driving_route(
            &Coordinates::new(30.24, 120.13),
            &Coordinates::new(30.27, 120.16),
            &[Coordinates::new(30.25, 120.14), Coordinates::new(30.26, 120.15)],
        )
        .await
        .unwrap();
    assert_eq!(route.distance, "12500");
    assert_eq!(route.traffic_lights, "14");
    assert_eq!(route.steps.len(), 1);
    assert_eq!(route.steps[0].action, "");

    let query = last_query(&seen);
    assert_eq!(query["strategy"], "10");
    assert_eq!(query["waypoints"], "120.14,30.25;120.15,30.26");
}

#[tokio::test]
async fn transit_route_keeps_segments() {
    let (client, seen) = spawn_mock().await;

    let routes = client
        .transit_route(
            &Coordinates::new(30.24, 120.13),
            &Coordinates::new(30.27, 120.16),
            "Hangzhou",
        )
        .await
        .unwrap();
    assert_eq!(routes.routes.len(), 1);
    assert_eq!(routes.routes[0].walking_distance, "800");
    assert_eq!(routes.routes[0].segments[0]["walking"]["distance"], "300");
    assert_eq!(last_query(&seen)["city"], "Hangzhou");
}

#[tokio::test]
async fn weather_combines_live_and_forecast() {
    let (client, seen) = spawn_mock().await;

    let weather = client.weather("330100").await.unwrap();
    assert_eq!(weather.current.temperature, "21");
    assert_eq!(weather.current.wind_power, "<=3");
    assert_eq!(weather.forecast[0]["dayweather"], "Cloudy");

    let mut extensions: Vec<String> = seen
        .lock()
        .unwrap()
        .iter()
        .map(|(_, q)| q["extensions"].clone())
        .collect();
    extensions.sort();
    assert_eq!(extensions, vec!["all", "base"]);
}

#[tokio::test]
async fn ip_location_optional_ip() {
    let (client, seen) = spawn_mock().await;

    let located = client.ip_location(Some("115.236.0.1")).await.unwrap();
    assert_eq!(located.city, "Hangzhou");
    assert!((located.location.lat - 30.2).abs() < 1e-9);
    assert!((located.location.lng - 120.2).abs() < 1e-9);
    assert_eq!(last_query(&seen)["ip"], "115.236.0.1");

    client.ip_location(None).await.unwrap();
    assert!(!last_query(&seen).contains_key("ip"));
}

#[tokio::test]
async fn unconfigured_client_refuses() {
    let client = MapClient::new(MapConfig::default()).unwrap();
    assert!(!client.is_configured());
    assert!(matches!(
        client.weather("Hangzhou").await,
        Err(MapError::NotConfigured)
    ));
}
