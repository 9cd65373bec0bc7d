use crate::config::MapConfig;
use crate::error::MapError;
use crate::models::{
    DrivingRoute, GeocodeResult, IpLocation, PoiSearch, ReverseGeocodeResult, TransitRoutes,
    Weather,
};
use reqwest::Client;
use serde_json::Value;
use tripwise_types::Coordinates;

/// Keyed client for the AMap v3 web service.
#[derive(Debug, Clone)]
pub struct MapClient {
    config: MapConfig,
    http: Client,
}

impl MapClient {
    pub fn new(config: MapConfig) -> Result<Self, MapError> {
        let http = Client::builder().timeout(config.timeout()).build()?;
        Ok(Self { config, http })
    }

    pub fn config(&self) -> &MapConfig {
        &self.config
    }

    pub fn is_configured(&self) -> bool {
        self.config.has_api_key()
    }

    async fn get(&self, endpoint: &str, params: &[(&str, String)]) -> Result<Value, MapError> {
        self.config.validate()?;

        let url = format!("{}{endpoint}", self.config.base_url.trim_end_matches('/'));
        let body: Value = self
            .http
            .get(url)
            .query(&[("key", self.config.api_key.as_str())])
            .query(params)
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;

        if body["status"].as_str() != Some("1") {
            let info = body["info"].as_str().unwrap_or("unknown error").to_string();
            tracing::warn!(endpoint, %info, "map request rejected");
            return Err(MapError::Vendor(info));
        }
        Ok(body)
    }

    pub async fn geocode(&self, address: &str, city: Option<&str>) -> Result<GeocodeResult, MapError> {
        let mut params = vec![("address", address.to_string())];
        if let Some(city) = city {
            params.push(("city", city.to_string()));
        }
        let body = self.get("/geocode/geo", &params).await?;
        GeocodeResult::from_vendor(&body)
    }

    pub async fn reverse_geocode(&self, lat: f64, lng: f64) -> Result<ReverseGeocodeResult, MapError> {
        let params = [
            ("location", Coordinates::new(lat, lng).to_lng_lat()),
            ("extensions", "all".to_string()),
            ("poitype", "all".to_string()),
            ("radius", "1000".to_string()),
        ];
        let body = self.get("/geocode/regeo", &params).await?;
        ReverseGeocodeResult::from_vendor(&body)
    }

    pub async fn search_poi(
        &self,
        keyword: &str,
        city: Option<&str>,
        types: Option<&str>,
        page: u32,
        page_size: u32,
    ) -> Result<PoiSearch, MapError> {
        let mut params = vec![
            ("keywords", keyword.to_string()),
            ("offset", page_size.to_string()),
            ("page", page.to_string()),
            ("extensions", "all".to_string()),
        ];
        if let Some(city) = city {
            params.push(("city", city.to_string()));
        }
        if let Some(types) = types {
            params.push(("types", types.to_string()));
        }
        let body = self.get("/place/text", &params).await?;
        PoiSearch::from_vendor(&body, page, page_size)
    }

    /// Fastest driving route, optionally through `waypoints` in order.
    pub async fn driving_route(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
        waypoints: &[Coordinates],
    ) -> Result<DrivingRoute, MapError> {
        let mut params = vec![
            ("origin", origin.to_lng_lat()),
            ("destination", destination.to_lng_lat()),
            ("strategy", "10".to_string()),
            ("extensions", "all".to_string()),
        ];
        if !waypoints.is_empty() {
            let joined = waypoints
                .iter()
                .map(Coordinates::to_lng_lat)
                .collect::<Vec<_>>()
                .join(";");
            params.push(("waypoints", joined));
        }
        let body = self.get("/direction/driving", &params).await?;
        DrivingRoute::from_vendor(&body)
    }

    pub async fn transit_route(
        &self,
        origin: &Coordinates,
        destination: &Coordinates,
        city: &str,
    ) -> Result<TransitRoutes, MapError> {
        let params = [
            ("origin", origin.to_lng_lat()),
            ("destination", destination.to_lng_lat()),
            ("city", city.to_string()),
            ("strategy", "0".to_string()),
            ("extensions", "all".to_string()),
        ];
        let body = self.get("/direction/transit/integrated", &params).await?;
        TransitRoutes::from_vendor(&body)
    }

    /// Live conditions and the daily forecast, fetched concurrently.
    pub async fn weather(&self, city: &str) -> Result<Weather, MapError> {
        let live_params = [("city", city.to_string()), ("extensions", "base".to_string())];
        let forecast_params = [("city", city.to_string()), ("extensions", "all".to_string())];
        let (live, forecast) = tokio::try_join!(
            self.get("/weather/weatherInfo", &live_params),
            self.get("/weather/weatherInfo", &forecast_params),
        )?;
        Weather::from_vendor(&live, &forecast)
    }

    /// Locates `ip`, or the caller's own address when `None`.
    pub async fn ip_location(&self, ip: Option<&str>) -> Result<IpLocation, MapError> {
        let params: Vec<(&str, String)> = ip.map(|ip| ("ip", ip.to_string())).into_iter().collect();
        let body = self.get("/ip", &params).await?;
        IpLocation::from_vendor(&body)
    }
}
