use crate::config::Config;
use crate::server::AppState;
use axum::extract::{Query, State};
use axum::http::StatusCode;
use axum::Json;
use serde::Deserialize;
use serde_json::{json, Value};
use tracing::{error, warn};
use url::Url;

/// Query parameters for `GET /api/geocode`
#[derive(Debug, Deserialize)]
pub struct GeocodeParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub address: Option<String>,
    pub longitude: Option<String>,
    pub latitude: Option<String>,
}

/// Query parameters for `GET /api/route`
#[derive(Debug, Deserialize)]
pub struct RouteParams {
    #[serde(rename = "type")]
    pub kind: Option<String>,
    pub origin: Option<String>,
    pub destination: Option<String>,
}

/// Single forward-and-return relay to the AMap REST API. No retry.
pub struct MapProxy {
    client: reqwest::Client,
    base_url: String,
    api_key: Option<String>,
    city: String,
}

impl MapProxy {
    pub fn new(config: &Config, client: reqwest::Client) -> Self {
        MapProxy {
            client,
            base_url: config.amap_base_url.clone(),
            api_key: config.amap_api_key.clone(),
            city: config.amap_city.clone(),
        }
    }

    /// Forward/reverse geocode. Parameter validation happens before any
    /// outbound call; an AMap application-level failure maps to 400.
    pub async fn geocode(&self, params: &GeocodeParams) -> (StatusCode, Value) {
        let Some(api_key) = &self.api_key else {
            return missing_key_response();
        };

        let url = match params.kind.as_deref() {
            Some("geo") => {
                let Some(address) = params.address.as_deref().filter(|a| !a.is_empty()) else {
                    return missing_params_response();
                };
                let mut url = match Url::parse(&format!("{}/geocode/geo", self.base_url)) {
                    Ok(url) => url,
                    Err(e) => return bad_base_url(e),
                };
                url.query_pairs_mut()
                    .append_pair("address", address)
                    .append_pair("city", &self.city)
                    .append_pair("key", api_key)
                    .append_pair("output", "JSON");
                url
            }
            Some("regeo") => {
                let (Some(longitude), Some(latitude)) = (
                    params.longitude.as_deref().filter(|v| !v.is_empty()),
                    params.latitude.as_deref().filter(|v| !v.is_empty()),
                ) else {
                    return missing_params_response();
                };
                let mut url = match Url::parse(&format!("{}/geocode/regeo", self.base_url)) {
                    Ok(url) => url,
                    Err(e) => return bad_base_url(e),
                };
                url.query_pairs_mut()
                    .append_pair("location", &format!("{},{}", longitude, latitude))
                    .append_pair("key", api_key);
                url
            }
            Some(_) => {
                return (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": t!("map.invalid_type") }),
                );
            }
            None => return missing_params_response(),
        };

        let data = match self.fetch(url).await {
            Ok(data) => data,
            Err(response) => return response,
        };

        // AMap reports application-level failures with status != "1"
        if data.get("status").and_then(|v| v.as_str()) != Some("1") {
            let info = data
                .get("info")
                .and_then(|v| v.as_str())
                .map(|s| s.to_string())
                .unwrap_or_else(|| t!("map.unknown_error").into_owned());
            warn!("AMap geocode request failed: {}", info);
            return (
                StatusCode::BAD_REQUEST,
                json!({
                    "error": t!("map.geocode_failed"),
                    "message": info,
                }),
            );
        }

        (StatusCode::OK, data)
    }

    /// Route planning by mode. Response passed through unchanged.
    pub async fn route(&self, params: &RouteParams) -> (StatusCode, Value) {
        let Some(api_key) = &self.api_key else {
            return missing_key_response();
        };

        let (Some(kind), Some(origin), Some(destination)) = (
            params.kind.as_deref(),
            params.origin.as_deref().filter(|v| !v.is_empty()),
            params.destination.as_deref().filter(|v| !v.is_empty()),
        ) else {
            return missing_params_response();
        };

        let path = match kind {
            "walking" => "direction/walking",
            "driving" => "direction/driving",
            "transit" => "direction/transit/integrated",
            _ => {
                return (
                    StatusCode::BAD_REQUEST,
                    json!({ "error": t!("map.invalid_route_type") }),
                );
            }
        };

        let mut url = match Url::parse(&format!("{}/{}", self.base_url, path)) {
            Ok(url) => url,
            Err(e) => return bad_base_url(e),
        };
        url.query_pairs_mut()
            .append_pair("origin", origin)
            .append_pair("destination", destination)
            .append_pair("key", api_key);
        match kind {
            "driving" => {
                url.query_pairs_mut()
                    .append_pair("strategy", "0")
                    .append_pair("extensions", "base");
            }
            "transit" => {
                url.query_pairs_mut()
                    .append_pair("city", &self.city)
                    .append_pair("strategy", "0")
                    .append_pair("extensions", "base");
            }
            _ => {}
        }

        match self.fetch(url).await {
            Ok(data) => (StatusCode::OK, data),
            Err(response) => response,
        }
    }

    async fn fetch(&self, url: Url) -> Result<Value, (StatusCode, Value)> {
        let response = self.client.get(url).send().await.map_err(|e| {
            error!("AMap request failed: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": t!("proxy.internal_error"),
                    "message": e.to_string(),
                }),
            )
        })?;

        response.json::<Value>().await.map_err(|e| {
            error!("Failed to parse AMap response: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                json!({
                    "error": t!("proxy.internal_error"),
                    "message": e.to_string(),
                }),
            )
        })
    }
}

fn missing_key_response() -> (StatusCode, Value) {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({
            "error": t!("map.missing_key"),
            "code": "missing_api_key",
        }),
    )
}

fn missing_params_response() -> (StatusCode, Value) {
    (
        StatusCode::BAD_REQUEST,
        json!({ "error": t!("map.missing_params") }),
    )
}

fn bad_base_url(e: url::ParseError) -> (StatusCode, Value) {
    error!("Invalid AMap base URL: {}", e);
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        json!({ "error": t!("proxy.internal_error") }),
    )
}

/// `GET /api/geocode`
pub async fn geocode_handler(
    State(state): State<AppState>,
    Query(params): Query<GeocodeParams>,
) -> (StatusCode, Json<Value>) {
    let (status, body) = state.map_proxy.geocode(&params).await;
    (status, Json(body))
}

/// `GET /api/route`
pub async fn route_handler(
    State(state): State<AppState>,
    Query(params): Query<RouteParams>,
) -> (StatusCode, Json<Value>) {
    let (status, body) = state.map_proxy.route(&params).await;
    (status, Json(body))
}
