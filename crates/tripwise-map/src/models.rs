//! Response shapes and their conversion from raw vendor JSON.
//!
//! The vendor encodes numbers as strings and empty fields as `[]`, so
//! conversion works on [`serde_json::Value`] rather than derived
//! deserializers.

use crate::error::MapError;
use serde::Serialize;
use serde_json::Value;
use tripwise_types::Coordinates;

/// String field, with the vendor's empty-array placeholder mapped to `""`.
fn text(v: &Value) -> String {
    match v {
        Value::String(s) => s.clone(),
        Value::Number(n) => n.to_string(),
        _ => String::new(),
    }
}

fn first<'a>(v: &'a Value, field: &str) -> Option<&'a Value> {
    v.get(field)?.as_array()?.first()
}

fn coordinates(v: &Value) -> Result<Coordinates, MapError> {
    Ok(text(v).parse()?)
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    pub lat: f64,
    pub lng: f64,
    pub formatted_address: String,
    pub province: String,
    pub city: String,
    pub district: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct GeocodeResult {
    pub location: Place,
}

impl GeocodeResult {
    pub(crate) fn from_vendor(body: &Value) -> Result<Self, MapError> {
        let geocode = first(body, "geocodes")
            .ok_or_else(|| MapError::Vendor("no match for address".to_string()))?;
        let point = coordinates(&geocode["location"])?;
        Ok(Self {
            location: Place {
                lat: point.lat,
                lng: point.lng,
                formatted_address: text(&geocode["formatted_address"]),
                province: text(&geocode["province"]),
                city: text(&geocode["city"]),
                district: text(&geocode["district"]),
            },
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Address {
    pub formatted_address: String,
    pub country: String,
    pub province: String,
    pub city: String,
    pub district: String,
    pub township: String,
    pub neighborhood: String,
    pub street: String,
    pub street_number: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct ReverseGeocodeResult {
    pub address: Address,
    /// Nearby points of interest, passed through as returned.
    pub pois: Value,
}

impl ReverseGeocodeResult {
    pub(crate) fn from_vendor(body: &Value) -> Result<Self, MapError> {
        let regeo = body
            .get("regeocode")
            .ok_or_else(|| MapError::MalformedResponse("missing regeocode".to_string()))?;
        let component = &regeo["addressComponent"];
        Ok(Self {
            address: Address {
                formatted_address: text(&regeo["formatted_address"]),
                country: text(&component["country"]),
                province: text(&component["province"]),
                city: text(&component["city"]),
                district: text(&component["district"]),
                township: text(&component["township"]),
                neighborhood: text(&component["neighborhood"]["name"]),
                street: text(&component["streetNumber"]["street"]),
                street_number: text(&component["streetNumber"]["number"]),
            },
            pois: regeo
                .get("pois")
                .filter(|p| p.is_array())
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Poi {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub type_code: String,
    pub address: String,
    pub location: Coordinates,
    pub pname: String,
    pub cityname: String,
    pub adname: String,
    pub tel: String,
    /// Metres from the search centre, when the vendor reports one.
    pub distance: Option<f64>,
    pub business_area: String,
}

impl Poi {
    fn from_vendor(poi: &Value) -> Result<Self, MapError> {
        Ok(Self {
            id: text(&poi["id"]),
            name: text(&poi["name"]),
            kind: text(&poi["type"]),
            type_code: text(&poi["typecode"]),
            address: text(&poi["address"]),
            location: coordinates(&poi["location"])?,
            pname: text(&poi["pname"]),
            cityname: text(&poi["cityname"]),
            adname: text(&poi["adname"]),
            tel: text(&poi["tel"]),
            distance: text(&poi["distance"]).parse().ok(),
            business_area: text(&poi["business_area"]),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PoiSearch {
    pub pois: Vec<Poi>,
    pub total: u64,
    pub page: u32,
    pub page_size: u32,
}

impl PoiSearch {
    pub(crate) fn from_vendor(body: &Value, page: u32, page_size: u32) -> Result<Self, MapError> {
        let pois = body
            .get("pois")
            .and_then(Value::as_array)
            .ok_or_else(|| MapError::MalformedResponse("missing pois".to_string()))?
            .iter()
            .map(Poi::from_vendor)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self {
            pois,
            total: text(&body["count"]).parse().unwrap_or(0),
            page,
            page_size,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DrivingStep {
    pub instruction: String,
    pub orientation: String,
    pub road: String,
    pub distance: String,
    pub duration: String,
    pub polyline: String,
    pub action: String,
}

/// Fastest driving path; distances in metres, durations in seconds.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DrivingRoute {
    pub distance: String,
    pub duration: String,
    pub tolls: String,
    pub toll_distance: String,
    pub traffic_lights: String,
    pub steps: Vec<DrivingStep>,
}

impl DrivingRoute {
    pub(crate) fn from_vendor(body: &Value) -> Result<Self, MapError> {
        let path = body
            .get("route")
            .and_then(|r| first(r, "paths"))
            .ok_or_else(|| MapError::Vendor("no driving route found".to_string()))?;
        let steps = path["steps"]
            .as_array()
            .map(|steps| {
                steps
                    .iter()
                    .map(|s| DrivingStep {
                        instruction: text(&s["instruction"]),
                        orientation: text(&s["orientation"]),
                        road: text(&s["road"]),
                        distance: text(&s["distance"]),
                        duration: text(&s["duration"]),
                        polyline: text(&s["polyline"]),
                        action: text(&s["action"]),
                    })
                    .collect()
            })
            .unwrap_or_default();
        Ok(Self {
            distance: text(&path["distance"]),
            duration: text(&path["duration"]),
            tolls: text(&path["tolls"]),
            toll_distance: text(&path["toll_distance"]),
            traffic_lights: text(&path["traffic_lights"]),
            steps,
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct TransitPlan {
    pub cost: String,
    pub duration: String,
    pub walking_distance: String,
    pub distance: String,
    pub night_flag: String,
    /// Walking, bus, railway and taxi legs, passed through as returned.
    pub segments: Vec<Value>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TransitRoutes {
    pub routes: Vec<TransitPlan>,
}

impl TransitRoutes {
    pub(crate) fn from_vendor(body: &Value) -> Result<Self, MapError> {
        let transits = body
            .get("route")
            .and_then(|r| r.get("transits"))
            .and_then(Value::as_array)
            .ok_or_else(|| MapError::MalformedResponse("missing transits".to_string()))?;
        let routes = transits
            .iter()
            .map(|t| TransitPlan {
                cost: text(&t["cost"]),
                duration: text(&t["duration"]),
                walking_distance: text(&t["walking_distance"]),
                distance: text(&t["distance"]),
                night_flag: text(&t["nightflag"]),
                segments: t["segments"]
                    .as_array()
                    .map(|segments| {
                        segments
                            .iter()
                            .map(|s| {
                                serde_json::json!({
                                    "walking": s["walking"],
                                    "bus": s["bus"],
                                    "railway": s["railway"],
                                    "taxi": s["taxi"],
                                })
                            })
                            .collect()
                    })
                    .unwrap_or_default(),
            })
            .collect();
        Ok(Self { routes })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct WeatherNow {
    pub province: String,
    pub city: String,
    pub weather: String,
    pub temperature: String,
    pub wind_direction: String,
    pub wind_power: String,
    pub humidity: String,
    pub report_time: String,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct Weather {
    pub current: WeatherNow,
    /// Daily forecast casts, passed through as returned.
    pub forecast: Value,
}

impl Weather {
    /// Combines a live (`extensions=base`) and a forecast
    /// (`extensions=all`) response.
    pub(crate) fn from_vendor(live: &Value, forecast: &Value) -> Result<Self, MapError> {
        let now = first(live, "lives")
            .ok_or_else(|| MapError::Vendor("no weather for city".to_string()))?;
        Ok(Self {
            current: WeatherNow {
                province: text(&now["province"]),
                city: text(&now["city"]),
                weather: text(&now["weather"]),
                temperature: text(&now["temperature"]),
                wind_direction: text(&now["winddirection"]),
                wind_power: text(&now["windpower"]),
                humidity: text(&now["humidity"]),
                report_time: text(&now["reporttime"]),
            },
            forecast: first(forecast, "forecasts")
                .and_then(|f| f.get("casts"))
                .cloned()
                .unwrap_or_else(|| Value::Array(Vec::new())),
        })
    }
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct IpLocation {
    pub location: Coordinates,
    pub country: String,
    pub province: String,
    pub city: String,
    pub district: String,
    pub isp: String,
}

impl IpLocation {
    /// Locates the IP at the centre of the first bounding rectangle.
    pub(crate) fn from_vendor(body: &Value) -> Result<Self, MapError> {
        let rectangle = text(&body["rectangle"]);
        let (south_west, north_east) = rectangle
            .split_once(';')
            .ok_or_else(|| MapError::Vendor("IP address could not be located".to_string()))?;
        let a: Coordinates = south_west.parse()?;
        let b: Coordinates = north_east.parse()?;

        Ok(Self {
            location: Coordinates::new((a.lat + b.lat) / 2.0, (a.lng + b.lng) / 2.0),
            country: text(&body["country"]),
            province: text(&body["province"]),
            city: text(&body["city"]),
            district: text(&body["district"]),
            isp: text(&body["isp"]),
        })
    }
}
