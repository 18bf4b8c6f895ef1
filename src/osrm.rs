//! OSRM routing client.
//!
//! Fetches driving routes from an OSRM `route/v1` endpoint and converts them
//! into [`Route`] values: polyline5 geometry decoded into ordered points,
//! legs flattened into turn-by-turn steps, and the provider's total
//! distance/duration carried along for display and speed estimation.
//!
//! The service is consumed as a black box; failures surface as
//! [`TrackError::ProviderFailure`] with no automatic retry.

use std::time::Duration;

use log::{info, warn};
use reqwest::Client;
use serde::Deserialize;

use crate::error::{Result, TrackError};
use crate::{GeoPoint, Route, RouteStep};

/// Public OSRM demo server, driving profile.
pub const DEFAULT_OSRM_URL: &str = "https://router.project-osrm.org/route/v1/driving";

const REQUEST_TIMEOUT_SECS: u64 = 30;

/// Precision of OSRM polyline geometry.
const POLYLINE_PRECISION: u32 = 5;

/// How much of an error body to keep in a [`TrackError::ProviderFailure`].
const ERROR_BODY_LIMIT: usize = 200;

#[derive(Debug, Deserialize)]
struct OsrmResponse {
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: String,
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    #[serde(default)]
    legs: Vec<OsrmLeg>,
}

#[derive(Debug, Deserialize)]
struct OsrmLeg {
    #[serde(default)]
    steps: Vec<OsrmStep>,
}

#[derive(Debug, Deserialize)]
struct OsrmStep {
    #[serde(default)]
    distance: f64,
    #[serde(default)]
    duration: f64,
    maneuver: Option<OsrmManeuver>,
}

#[derive(Debug, Deserialize)]
struct OsrmManeuver {
    instruction: Option<String>,
}

/// Client for an OSRM routing service.
pub struct OsrmClient {
    client: Client,
    base_url: String,
}

impl OsrmClient {
    /// Client against the public OSRM demo server.
    pub fn new() -> Result<Self> {
        Self::with_base_url(DEFAULT_OSRM_URL)
    }

    /// Client against a custom OSRM endpoint (profile included in the URL).
    pub fn with_base_url(base_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Fetch a route through the given waypoints, in order.
    ///
    /// Requires at least an origin and a destination. Returns
    /// [`TrackError::RouteMissing`] for fewer than 2 waypoints and
    /// [`TrackError::ProviderFailure`] when the service errs or returns no
    /// route.
    pub async fn fetch_route(&self, waypoints: &[GeoPoint]) -> Result<Route> {
        if waypoints.len() < 2 {
            return Err(TrackError::RouteMissing);
        }

        let url = format!(
            "{}/{}?overview=full&geometries=polyline&steps=true",
            self.base_url,
            waypoint_string(waypoints)
        );

        let response = self.client.get(&url).send().await?;
        let status = response.status();

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!("osrm request failed: HTTP {status}");
            return Err(TrackError::ProviderFailure {
                message: body.chars().take(ERROR_BODY_LIMIT).collect(),
                status_code: Some(status.as_u16()),
            });
        }

        let data: OsrmResponse = response
            .json()
            .await
            .map_err(|e| TrackError::provider(format!("invalid JSON from OSRM: {e}")))?;

        let route = route_from_response(data)?;
        info!(
            "fetched route: {} points, {:.0} m, {:.0} s",
            route.points.len(),
            route.distance,
            route.duration
        );
        Ok(route)
    }
}

/// Format waypoints the way OSRM expects: `lon,lat` pairs joined by `;`.
fn waypoint_string(points: &[GeoPoint]) -> String {
    points
        .iter()
        .map(|p| format!("{},{}", p.longitude, p.latitude))
        .collect::<Vec<_>>()
        .join(";")
}

/// Convert a parsed OSRM response into a [`Route`].
fn route_from_response(data: OsrmResponse) -> Result<Route> {
    let osrm_route = data
        .routes
        .into_iter()
        .next()
        .ok_or_else(|| TrackError::provider("no route returned"))?;

    let line = polyline::decode_polyline(&osrm_route.geometry, POLYLINE_PRECISION)
        .map_err(|e| TrackError::provider(format!("polyline decode failed: {e}")))?;

    let points: Vec<GeoPoint> = line.0.iter().map(|c| GeoPoint::new(c.y, c.x)).collect();

    let steps: Vec<RouteStep> = osrm_route
        .legs
        .into_iter()
        .flat_map(|leg| leg.steps)
        .map(|step| RouteStep {
            instruction: step
                .maneuver
                .and_then(|m| m.instruction)
                .unwrap_or_else(|| "Continue".to_string()),
            distance: step.distance,
            duration: step.duration,
        })
        .collect();

    let mut route = Route::from_points(&points, osrm_route.duration)
        .ok_or_else(|| TrackError::provider("degenerate route geometry"))?;
    route.distance = osrm_route.distance;
    route.steps = steps;
    Ok(route)
}

#[cfg(test)]
mod tests {
    use super::*;

    // Decodes to (38.5, -120.2), (40.7, -120.95), (43.252, -126.453)
    const GEOMETRY: &str = "_p~iF~ps|U_ulLnnqC_mqNvxq`@";

    fn canned_response() -> OsrmResponse {
        let json = format!(
            r#"{{
                "code": "Ok",
                "routes": [{{
                    "geometry": "{GEOMETRY}",
                    "distance": 1234.5,
                    "duration": 678.9,
                    "legs": [{{
                        "steps": [
                            {{"distance": 100.0, "duration": 10.0,
                              "maneuver": {{"type": "depart", "instruction": "Head north"}}}},
                            {{"distance": 200.0, "duration": 20.0, "maneuver": {{"type": "turn"}}}}
                        ]
                    }}]
                }}]
            }}"#
        );
        serde_json::from_str(&json).unwrap()
    }

    #[test]
    fn test_waypoint_string_is_lon_lat_ordered() {
        let points = vec![GeoPoint::new(17.385, 78.4867), GeoPoint::new(17.4, 78.5)];
        assert_eq!(waypoint_string(&points), "78.4867,17.385;78.5,17.4");
    }

    #[test]
    fn test_route_from_response() {
        let route = route_from_response(canned_response()).unwrap();

        assert_eq!(route.points.len(), 3);
        assert!((route.points[0].latitude - 38.5).abs() < 1e-9);
        assert!((route.points[0].longitude - -120.2).abs() < 1e-9);
        assert!((route.points[2].latitude - 43.252).abs() < 1e-9);

        assert_eq!(route.distance, 1234.5);
        assert_eq!(route.duration, 678.9);
        assert!(route.length > 0.0);
    }

    #[test]
    fn test_steps_flatten_with_default_instruction() {
        let route = route_from_response(canned_response()).unwrap();

        assert_eq!(route.steps.len(), 2);
        assert_eq!(route.steps[0].instruction, "Head north");
        assert_eq!(route.steps[1].instruction, "Continue");
        assert_eq!(route.steps[1].distance, 200.0);
    }

    #[test]
    fn test_empty_routes_is_provider_failure() {
        let data: OsrmResponse = serde_json::from_str(r#"{"code": "NoRoute"}"#).unwrap();
        assert!(matches!(
            route_from_response(data),
            Err(TrackError::ProviderFailure { .. })
        ));
    }

    #[tokio::test]
    async fn test_fetch_route_requires_two_waypoints() {
        let client = OsrmClient::new().unwrap();
        let result = client.fetch_route(&[GeoPoint::new(0.0, 0.0)]).await;
        assert!(matches!(result, Err(TrackError::RouteMissing)));
    }
}
