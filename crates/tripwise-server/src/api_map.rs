//! Map handlers proxying the AMap web service.

use crate::api::{non_blank, ok, unavailable, ApiError, ApiResult};
use crate::AppState;
use axum::{
    extract::{rejection::JsonRejection, ConnectInfo, Extension, Query},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::net::{IpAddr, SocketAddr};
use std::sync::Arc;
use tripwise_map::{
    DrivingRoute, GeocodeResult, IpLocation, PoiSearch, ReverseGeocodeResult, TransitRoutes,
    Weather,
};
use tripwise_types::{ApiResponse, Coordinates};

const SERVICE_NAME: &str = "AMap";
const MAX_PAGE_SIZE: u32 = 25;

/// A point given either as the vendor's `"lng,lat"` text or as
/// `{"lat": .., "lng": ..}`.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PointInput {
    Text(String),
    Object(Coordinates),
}

impl PointInput {
    fn resolve(&self) -> Result<Coordinates, ApiError> {
        match self {
            PointInput::Object(point) => Ok(*point),
            PointInput::Text(text) => text
                .parse()
                .map_err(|e: tripwise_types::CoordinateError| ApiError::BadRequest(e.to_string())),
        }
    }
}

#[derive(Debug, Deserialize)]
pub struct GeocodeRequest {
    pub address: Option<String>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ReverseGeocodeRequest {
    pub lat: Option<f64>,
    pub lng: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PoiQuery {
    pub keyword: Option<String>,
    pub city: Option<String>,
    pub types: Option<String>,
    pub page: Option<u32>,
    pub page_size: Option<u32>,
}

#[derive(Debug, Deserialize)]
pub struct DrivingRouteRequest {
    pub origin: Option<PointInput>,
    pub destination: Option<PointInput>,
    #[serde(default)]
    pub waypoints: Vec<PointInput>,
}

#[derive(Debug, Deserialize)]
pub struct TransitRouteRequest {
    pub origin: Option<PointInput>,
    pub destination: Option<PointInput>,
    pub city: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct WeatherQuery {
    pub city: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MapClientConfig {
    pub has_api_key: bool,
    pub service: &'static str,
    pub features: [&'static str; 4],
}

fn endpoints(
    origin: Option<PointInput>,
    destination: Option<PointInput>,
) -> Result<(Coordinates, Coordinates), ApiError> {
    match (origin, destination) {
        (Some(origin), Some(destination)) => Ok((origin.resolve()?, destination.resolve()?)),
        _ => Err(ApiError::BadRequest(
            "origin and destination are required".to_string(),
        )),
    }
}

/// Handler for `POST /api/map/geocode`.
pub async fn geocode_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<GeocodeRequest>, JsonRejection>,
) -> ApiResult<GeocodeResult> {
    let Json(payload) = payload?;
    let address = non_blank(payload.address)
        .ok_or_else(|| ApiError::BadRequest("address is required".to_string()))?;
    let city = non_blank(payload.city);

    let result = state.map.geocode(&address, city.as_deref()).await?;
    ok(result, "address geocoded")
}

/// Handler for `POST /api/map/reverse-geocode`.
pub async fn reverse_geocode_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<ReverseGeocodeRequest>, JsonRejection>,
) -> ApiResult<ReverseGeocodeResult> {
    let Json(payload) = payload?;
    let (Some(lat), Some(lng)) = (payload.lat, payload.lng) else {
        return Err(ApiError::BadRequest("lat and lng are required".to_string()));
    };
    if !(-90.0..=90.0).contains(&lat) || !(-180.0..=180.0).contains(&lng) {
        return Err(ApiError::BadRequest("coordinates out of range".to_string()));
    }

    let result = state.map.reverse_geocode(lat, lng).await?;
    ok(result, "coordinates reverse geocoded")
}

/// Handler for `GET /api/map/search-poi`.
pub async fn search_poi_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<PoiQuery>,
) -> ApiResult<PoiSearch> {
    let keyword = non_blank(query.keyword)
        .ok_or_else(|| ApiError::BadRequest("search keyword is required".to_string()))?;
    let page = query.page.unwrap_or(1);
    let page_size = query.page_size.unwrap_or(20);
    if page == 0 || page_size == 0 || page_size > MAX_PAGE_SIZE {
        return Err(ApiError::BadRequest(format!(
            "page must be at least 1 and pageSize between 1 and {MAX_PAGE_SIZE}"
        )));
    }
    let city = non_blank(query.city);
    let types = non_blank(query.types);

    let result = state
        .map
        .search_poi(&keyword, city.as_deref(), types.as_deref(), page, page_size)
        .await?;
    ok(result, "points of interest found")
}

/// Handler for `POST /api/map/driving-route`.
pub async fn driving_route_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<DrivingRouteRequest>, JsonRejection>,
) -> ApiResult<DrivingRoute> {
    let Json(payload) = payload?;
    let (origin, destination) = endpoints(payload.origin, payload.destination)?;
    let waypoints = payload
        .waypoints
        .iter()
        .map(PointInput::resolve)
        .collect::<Result<Vec<_>, _>>()?;

    let route = state
        .map
        .driving_route(&origin, &destination, &waypoints)
        .await?;
    ok(route, "driving route planned")
}

/// Handler for `POST /api/map/transit-route`.
pub async fn transit_route_handler(
    Extension(state): Extension<Arc<AppState>>,
    payload: Result<Json<TransitRouteRequest>, JsonRejection>,
) -> ApiResult<TransitRoutes> {
    let Json(payload) = payload?;
    let (origin, destination) = endpoints(payload.origin, payload.destination)?;
    let city = non_blank(payload.city)
        .ok_or_else(|| ApiError::BadRequest("city is required for transit routes".to_string()))?;

    let routes = state
        .map
        .transit_route(&origin, &destination, &city)
        .await?;
    ok(routes, "transit route planned")
}

/// Handler for `GET /api/map/weather`.
pub async fn weather_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<WeatherQuery>,
) -> ApiResult<Weather> {
    let city = non_blank(query.city)
        .ok_or_else(|| ApiError::BadRequest("city is required".to_string()))?;
    let weather = state.map.weather(&city).await?;
    ok(weather, "weather fetched")
}

/// The caller's public address: the first `X-Forwarded-For` hop, else the
/// peer address. Private and loopback addresses yield `None`, letting the
/// vendor locate the server's own egress address instead.
fn client_ip(headers: &HeaderMap, peer: SocketAddr) -> Option<IpAddr> {
    let forwarded = headers
        .get("x-forwarded-for")
        .and_then(|v| v.to_str().ok())
        .and_then(|v| v.split(',').next())
        .and_then(|v| v.trim().parse::<IpAddr>().ok());
    let ip = forwarded.unwrap_or(peer.ip());
    let routable = match ip {
        IpAddr::V4(v4) => {
            !(v4.is_private() || v4.is_loopback() || v4.is_link_local() || v4.is_unspecified())
        }
        IpAddr::V6(v6) => !(v6.is_loopback() || v6.is_unspecified()),
    };
    routable.then_some(ip)
}

/// Handler for `GET /api/map/ip-location`.
pub async fn ip_location_handler(
    Extension(state): Extension<Arc<AppState>>,
    ConnectInfo(peer): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
) -> ApiResult<IpLocation> {
    let ip = client_ip(&headers, peer).map(|ip| ip.to_string());
    let located = state.map.ip_location(ip.as_deref()).await?;
    ok(located, "IP address located")
}

/// Handler for `GET /api/map/status`.
pub async fn status_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> Json<ApiResponse<Value>> {
    match state.map.config().validate() {
        Ok(()) => Json(ApiResponse::ok(
            json!({
                "service": SERVICE_NAME,
                "status": "available",
                "features": [
                    "geocoding",
                    "reverse geocoding",
                    "POI search",
                    "route planning",
                    "weather",
                    "IP location"
                ],
            }),
            "map service is running",
        )),
        Err(e) => unavailable(
            json!({
                "service": SERVICE_NAME,
                "status": "unavailable",
                "error": e.to_string(),
            }),
            "map service is not configured",
        ),
    }
}

/// Handler for `GET /api/map/config`.
pub async fn config_handler(
    Extension(state): Extension<Arc<AppState>>,
) -> ApiResult<MapClientConfig> {
    let has_api_key = state.map.is_configured();
    let message = if has_api_key {
        "map service is configured"
    } else {
        "map service is not configured"
    };
    ok(
        MapClientConfig {
            has_api_key,
            service: SERVICE_NAME,
            features: ["map display", "markers", "route drawing", "place search"],
        },
        message,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::http::HeaderValue;

    #[test]
    fn point_input_accepts_both_shapes() {
        let text: PointInput = serde_json::from_value(json!("116.397,39.908")).unwrap();
        assert_eq!(text.resolve().unwrap(), Coordinates::new(39.908, 116.397));

        let object: PointInput = serde_json::from_value(json!({ "lat": 1.5, "lng": 2.5 })).unwrap();
        assert_eq!(object.resolve().unwrap(), Coordinates::new(1.5, 2.5));

        let bad: PointInput = serde_json::from_value(json!("east of here")).unwrap();
        assert!(matches!(bad.resolve(), Err(ApiError::BadRequest(_))));
    }

    #[test]
    fn client_ip_prefers_forwarded_public_address() {
        let peer: SocketAddr = "127.0.0.1:4000".parse().unwrap();
        let mut headers = HeaderMap::new();
        assert_eq!(client_ip(&headers, peer), None);

        headers.insert(
            "x-forwarded-for",
            HeaderValue::from_static("114.247.50.2, 10.0.0.1"),
        );
        assert_eq!(client_ip(&headers, peer), Some("114.247.50.2".parse().unwrap()));

        headers.insert("x-forwarded-for", HeaderValue::from_static("192.168.1.20"));
        assert_eq!(client_ip(&headers, peer), None);

        let public_peer: SocketAddr = "8.8.8.8:53".parse().unwrap();
        assert_eq!(
            client_ip(&HeaderMap::new(), public_peer),
            Some("8.8.8.8".parse().unwrap())
        );
    }
}
