//! Geocoding client with provider fallback and rate limiting.
//!
//! Place search goes to Nominatim first; on any failure the query falls back
//! to Photon and its GeoJSON features are converted into the same [`Place`]
//! shape. A sliding-window rate limiter keeps the client inside Nominatim's
//! usage policy, and every request carries a User-Agent with contact info as
//! that policy requires.

use std::collections::VecDeque;
use std::time::{Duration, Instant};

use log::{debug, info, warn};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::error::{Result, TrackError};
use crate::GeoPoint;

/// Public Nominatim search endpoint.
pub const DEFAULT_NOMINATIM_URL: &str = "https://nominatim.openstreetmap.org/search";

/// Public Photon search endpoint (OSM-based fallback).
pub const DEFAULT_PHOTON_URL: &str = "https://photon.komoot.io/api/";

/// Queries shorter than this return no results without a network call.
const MIN_QUERY_CHARS: usize = 3;

/// Maximum results requested from either provider.
const RESULT_LIMIT: u32 = 6;

// Nominatim usage policy allows ~1 req/s; 60 per minute keeps a debounced
// search box comfortably inside it.
const RATE_LIMIT_MAX_REQUESTS: usize = 60;
const RATE_LIMIT_WINDOW_MS: u64 = 60_000;

const REQUEST_TIMEOUT_SECS: u64 = 30;
const ERROR_BODY_LIMIT: usize = 200;

/// A single geocoding hit.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Place {
    /// Provider's place/OSM identifier, when it supplied one.
    pub place_id: Option<i64>,
    /// Human-readable label for the search result list.
    pub display_name: String,
    /// Result coordinates.
    pub point: GeoPoint,
}

#[derive(Debug, Deserialize)]
struct NominatimPlace {
    place_id: Option<i64>,
    display_name: String,
    lat: String,
    lon: String,
}

#[derive(Debug, Deserialize)]
struct PhotonResponse {
    #[serde(default)]
    features: Vec<PhotonFeature>,
}

#[derive(Debug, Deserialize)]
struct PhotonFeature {
    properties: PhotonProperties,
    geometry: PhotonGeometry,
}

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct PhotonProperties {
    osm_id: Option<i64>,
    label: Option<String>,
    name: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PhotonGeometry {
    /// `[lon, lat]`
    #[serde(default)]
    coordinates: Vec<f64>,
}

/// Sliding-window rate limiter.
struct RateLimiter {
    request_times: Mutex<VecDeque<Instant>>,
    max_requests: usize,
    window: Duration,
}

impl RateLimiter {
    fn new(max_requests: usize, window: Duration) -> Self {
        Self {
            request_times: Mutex::new(VecDeque::with_capacity(max_requests + 1)),
            max_requests,
            window,
        }
    }

    /// Sleep until a request slot is free, then record the request.
    async fn acquire(&self) {
        loop {
            let wait_time = {
                let mut times = self.request_times.lock().await;
                let now = Instant::now();

                // Prune requests that left the window
                while times.front().is_some_and(|&t| now - t > self.window) {
                    times.pop_front();
                }

                if times.len() < self.max_requests {
                    times.push_back(now);
                    None
                } else {
                    times.front().map(|&oldest| (oldest + self.window) - now)
                }
            };

            match wait_time {
                Some(duration) => {
                    debug!("geocode rate limit: waiting {duration:?}");
                    tokio::time::sleep(duration).await;
                }
                None => break,
            }
        }
    }
}

/// Geocoding client over Nominatim with Photon fallback.
pub struct GeocodeClient {
    client: Client,
    nominatim_url: String,
    photon_url: String,
    user_agent: String,
    limiter: RateLimiter,
}

impl GeocodeClient {
    /// Create a client against the public endpoints.
    ///
    /// `contact` identifies the application to Nominatim (an email address
    /// or URL, per its usage policy).
    pub fn new(contact: &str) -> Result<Self> {
        Self::with_endpoints(contact, DEFAULT_NOMINATIM_URL, DEFAULT_PHOTON_URL)
    }

    /// Create a client against custom endpoints.
    pub fn with_endpoints(contact: &str, nominatim_url: &str, photon_url: &str) -> Result<Self> {
        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            nominatim_url: nominatim_url.trim_end_matches('/').to_string(),
            photon_url: photon_url.trim_end_matches('/').to_string(),
            user_agent: format!(
                "route-tracker/{} (contact: {contact})",
                env!("CARGO_PKG_VERSION")
            ),
            limiter: RateLimiter::new(
                RATE_LIMIT_MAX_REQUESTS,
                Duration::from_millis(RATE_LIMIT_WINDOW_MS),
            ),
        })
    }

    /// Search for places matching `query`.
    ///
    /// Queries shorter than 3 characters return an empty list without a
    /// network call. Nominatim is tried first; on failure the query falls
    /// back to Photon. Both failing surfaces the Photon error.
    pub async fn search(&self, query: &str) -> Result<Vec<Place>> {
        let query = query.trim();
        if query.chars().count() < MIN_QUERY_CHARS {
            return Ok(Vec::new());
        }

        self.limiter.acquire().await;

        match self.search_nominatim(query).await {
            Ok(places) => {
                info!("geocode '{query}': {} results from nominatim", places.len());
                Ok(places)
            }
            Err(err) => {
                warn!("nominatim failed ({err}), falling back to photon");
                let places = self.search_photon(query).await?;
                info!("geocode '{query}': {} results from photon", places.len());
                Ok(places)
            }
        }
    }

    async fn search_nominatim(&self, query: &str) -> Result<Vec<Place>> {
        let url = format!(
            "{}?format=jsonv2&addressdetails=1&limit={RESULT_LIMIT}&q={}",
            self.nominatim_url,
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(&url)
            .header("User-Agent", &self.user_agent)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackError::ProviderFailure {
                message: body.chars().take(ERROR_BODY_LIMIT).collect(),
                status_code: Some(status.as_u16()),
            });
        }

        let raw: Vec<NominatimPlace> = response
            .json()
            .await
            .map_err(|e| TrackError::provider(format!("invalid JSON from nominatim: {e}")))?;

        Ok(convert_nominatim(raw))
    }

    async fn search_photon(&self, query: &str) -> Result<Vec<Place>> {
        let url = format!(
            "{}?q={}&limit={RESULT_LIMIT}",
            self.photon_url,
            urlencoding::encode(query)
        );

        let response = self
            .client
            .get(&url)
            .header("Accept", "application/json")
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TrackError::ProviderFailure {
                message: body.chars().take(ERROR_BODY_LIMIT).collect(),
                status_code: Some(status.as_u16()),
            });
        }

        let raw: PhotonResponse = response
            .json()
            .await
            .map_err(|e| TrackError::provider(format!("invalid JSON from photon: {e}")))?;

        Ok(convert_photon(raw))
    }
}

fn convert_nominatim(raw: Vec<NominatimPlace>) -> Vec<Place> {
    raw.into_iter()
        .filter_map(|p| {
            // Nominatim serializes coordinates as strings
            let lat: f64 = p.lat.parse().ok()?;
            let lon: f64 = p.lon.parse().ok()?;
            Some(Place {
                place_id: p.place_id,
                display_name: p.display_name,
                point: GeoPoint::new(lat, lon),
            })
        })
        .collect()
}

fn convert_photon(raw: PhotonResponse) -> Vec<Place> {
    raw.features
        .into_iter()
        .filter_map(|f| {
            if f.geometry.coordinates.len() < 2 {
                return None;
            }
            let lon = f.geometry.coordinates[0];
            let lat = f.geometry.coordinates[1];
            let display_name = f
                .properties
                .label
                .or(f.properties.name)
                .unwrap_or_else(|| "Result".to_string());
            Some(Place {
                place_id: f.properties.osm_id,
                display_name,
                point: GeoPoint::new(lat, lon),
            })
        })
        .collect()
}
