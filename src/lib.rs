//! # Route Tracker
//!
//! Navigation progress tracking and open mapping-service clients for route
//! planning apps.
//!
//! This library provides:
//! - In-app navigation progress: nearest-vertex projection, off-route
//!   detection, remaining distance/time
//! - A callback-driven position-source contract with explicit subscription
//!   lifetimes
//! - Clients for OSRM routing and Nominatim/Photon geocoding
//! - Deep links into Google/Apple Maps for native turn-by-turn hand-off
//!
//! ## Features
//!
//! - **`http`** - Enable the OSRM and geocoding HTTP clients
//! - **`synthetic`** - Deterministic scripted position sources for testing
//! - **`full`** - Enable all features
//!
//! ## Quick Start
//!
//! ```rust
//! use route_tracker::progress::{average_speed, compute_progress};
//! use route_tracker::{GeoPoint, Route, TrackerConfig};
//!
//! // Route polyline as a routing provider would return it
//! let route = Route::from_points(
//!     &[
//!         GeoPoint::new(0.0, 0.0),
//!         GeoPoint::new(0.0, 0.001),
//!         GeoPoint::new(0.0, 0.002),
//!     ],
//!     222.0, // provider's duration estimate in seconds
//! )
//! .unwrap();
//!
//! let config = TrackerConfig::default();
//! let speed = average_speed(&route, config.fallback_speed_mps);
//!
//! // One position fix, halfway along the route
//! let progress = compute_progress(&route, &GeoPoint::new(0.0, 0.001), speed, &config).unwrap();
//! assert_eq!(progress.nearest_index, 1);
//! assert!(!progress.off_route);
//! ```

use serde::{Deserialize, Serialize};

// Unified error handling
pub mod error;
pub use error::{Result, TrackError};

// Geographic utilities (haversine distance, polyline length, bounds)
pub mod geo_utils;

// Route-relative progress computation (projection, remaining distance/time)
pub mod progress;
pub use progress::{
    average_speed, compute_progress, nearest_vertex, remaining_distance_from, NearestVertex,
    RouteProgress,
};

// Position source contract (permission, one-shot query, subscription)
pub mod position;
pub use position::{PermissionStatus, PositionCallback, PositionSource, Subscription};

// Navigation tracker (session state, start/stop, observer publishing)
pub mod tracker;
pub use tracker::{NavigationTracker, SessionCallback, TrackingSession};

// Deep links into native map applications
pub mod deeplink;
pub use deeplink::{apple_directions_url, directions_urls, google_directions_url, Platform};

// Banner text formatting
pub mod format;
pub use format::{format_km, format_minutes};

// OSRM routing client
#[cfg(feature = "http")]
pub mod osrm;
#[cfg(feature = "http")]
pub use osrm::{OsrmClient, DEFAULT_OSRM_URL};

// Geocoding client (Nominatim with Photon fallback)
#[cfg(feature = "http")]
pub mod geocode;
#[cfg(feature = "http")]
pub use geocode::{GeocodeClient, Place, DEFAULT_NOMINATIM_URL, DEFAULT_PHOTON_URL};

// Scripted position sources for deterministic testing
#[cfg(any(test, feature = "synthetic"))]
pub mod synthetic;
#[cfg(any(test, feature = "synthetic"))]
pub use synthetic::ScriptedPositionSource;

// ============================================================================
// Core Types
// ============================================================================

/// A geographic coordinate in degrees (WGS-84 implied).
///
/// # Example
/// ```
/// use route_tracker::GeoPoint;
/// let point = GeoPoint::new(17.385, 78.4867); // Hyderabad
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    /// Create a new geographic point.
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }

    /// Check if the point has valid coordinates.
    pub fn is_valid(&self) -> bool {
        self.latitude.is_finite()
            && self.longitude.is_finite()
            && self.latitude >= -90.0
            && self.latitude <= 90.0
            && self.longitude >= -180.0
            && self.longitude <= 180.0
    }
}

/// Bounding box for a set of points.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounds {
    pub min_lat: f64,
    pub max_lat: f64,
    pub min_lng: f64,
    pub max_lng: f64,
}

impl Bounds {
    /// Create bounds from geographic points.
    pub fn from_points(points: &[GeoPoint]) -> Option<Self> {
        if points.is_empty() {
            return None;
        }
        let mut min_lat = f64::MAX;
        let mut max_lat = f64::MIN;
        let mut min_lng = f64::MAX;
        let mut max_lng = f64::MIN;

        for p in points {
            min_lat = min_lat.min(p.latitude);
            max_lat = max_lat.max(p.latitude);
            min_lng = min_lng.min(p.longitude);
            max_lng = max_lng.max(p.longitude);
        }

        Some(Self {
            min_lat,
            max_lat,
            min_lng,
            max_lng,
        })
    }

    /// Get the center point of the bounds.
    pub fn center(&self) -> GeoPoint {
        GeoPoint::new(
            (self.min_lat + self.max_lat) / 2.0,
            (self.min_lng + self.max_lng) / 2.0,
        )
    }
}

/// One turn-by-turn maneuver from the routing provider.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteStep {
    /// Human-readable instruction text.
    pub instruction: String,
    /// Step distance in meters.
    pub distance: f64,
    /// Step duration in seconds.
    pub duration: f64,
}

/// A planned route: the polyline, the provider's estimates, and the steps.
///
/// Created once per successful route computation and replaced wholesale on
/// re-route; never mutated in place while a session tracks it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Route {
    /// Ordered polyline from origin to destination (always ≥2 points).
    pub points: Vec<GeoPoint>,
    /// Provider-reported total distance in meters.
    pub distance: f64,
    /// Provider-predicted traversal time in seconds.
    pub duration: f64,
    /// Polyline length in meters (sum of consecutive-point distances).
    pub length: f64,
    /// Turn-by-turn steps, when the provider supplied them.
    pub steps: Vec<RouteStep>,
    /// Pre-computed bounding box (for map viewport fitting).
    pub bounds: Bounds,
    /// Pre-computed center point.
    pub center: GeoPoint,
}

impl Route {
    /// Build a route from raw polyline points and a duration estimate.
    ///
    /// Invalid coordinates are filtered out; returns `None` if fewer than
    /// 2 valid points remain. The provider-reported distance defaults to the
    /// computed polyline length until the caller overwrites it.
    ///
    /// # Example
    /// ```
    /// use route_tracker::{GeoPoint, Route};
    ///
    /// let route = Route::from_points(
    ///     &[GeoPoint::new(17.385, 78.4867), GeoPoint::new(17.4, 78.5)],
    ///     120.0,
    /// );
    /// assert!(route.is_some());
    /// ```
    pub fn from_points(points: &[GeoPoint], duration: f64) -> Option<Self> {
        let valid: Vec<GeoPoint> = points.iter().copied().filter(GeoPoint::is_valid).collect();
        if valid.len() < 2 {
            return None;
        }

        let length = geo_utils::polyline_length(&valid);
        let bounds = Bounds::from_points(&valid)?;
        let center = bounds.center();

        Some(Self {
            points: valid,
            distance: length,
            duration,
            length,
            steps: Vec::new(),
            bounds,
            center,
        })
    }
}

/// Configuration for navigation tracking.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackerConfig {
    /// Distance from the nearest route vertex beyond which the user is
    /// flagged off-route. Default: 60.0 meters.
    pub off_route_threshold_meters: f64,

    /// Average speed assumed when the route carries no usable duration
    /// estimate. Default: 10.0 m/s (~36 km/h).
    pub fallback_speed_mps: f64,
}

impl Default for TrackerConfig {
    fn default() -> Self {
        Self {
            off_route_threshold_meters: 60.0,
            fallback_speed_mps: 10.0,
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
