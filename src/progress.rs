//! Route-relative progress computation.
//!
//! This module provides the geometric core of navigation tracking:
//! - Nearest-vertex projection of a position onto a route polyline
//! - Remaining distance from the projected vertex to the destination
//! - Off-route detection and remaining-time estimation
//!
//! The projection is vertex-nearest, not segment-nearest: it snaps to the
//! closest sampled point of the polyline rather than interpolating between
//! vertices. Routing providers return densely sampled geometry, so the
//! overestimate near long straight segments stays below GPS noise.

use serde::{Deserialize, Serialize};

use crate::geo_utils::haversine_distance;
use crate::{GeoPoint, Route, TrackerConfig};

/// Result of projecting a position onto a route polyline.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct NearestVertex {
    /// Index of the closest polyline vertex.
    pub index: usize,
    /// Distance from the position to that vertex in meters.
    pub distance_meters: f64,
}

/// Route-relative progress derived from a single position fix.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RouteProgress {
    /// Index of the nearest polyline vertex.
    pub nearest_index: usize,
    /// Distance from the position to the nearest vertex in meters.
    pub distance_to_route: f64,
    /// Whether the position exceeds the configured off-route threshold.
    pub off_route: bool,
    /// Distance left along the polyline in meters.
    pub remaining_meters: f64,
    /// Estimated time left in seconds.
    pub remaining_seconds: f64,
}

/// Find the polyline vertex closest to `position`.
///
/// Linear scan, no spatial index — route polylines are tens to low hundreds
/// of points. Only strictly smaller candidates replace the current best, so
/// ties break to the lowest index.
///
/// Returns `None` for an empty polyline.
pub fn nearest_vertex(position: &GeoPoint, polyline: &[GeoPoint]) -> Option<NearestVertex> {
    let mut best: Option<NearestVertex> = None;

    for (index, vertex) in polyline.iter().enumerate() {
        let distance_meters = haversine_distance(position, vertex);
        if best.map_or(true, |b| distance_meters < b.distance_meters) {
            best = Some(NearestVertex {
                index,
                distance_meters,
            });
        }
    }

    best
}

/// Distance left along the polyline from `from_index` to the last vertex,
/// in meters.
///
/// Measured vertex-to-vertex; the partial distance from the user's exact
/// position to the snap vertex is not included. Returns 0 at the last vertex
/// and for out-of-range indices.
pub fn remaining_distance_from(polyline: &[GeoPoint], from_index: usize) -> f64 {
    if from_index >= polyline.len() {
        return 0.0;
    }

    polyline[from_index..]
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Average traversal speed for a route in m/s.
///
/// Derived once per route as `polyline length / provider duration` when both
/// are positive; otherwise `fallback_mps`. Never recomputed from observed
/// GPS speed.
pub fn average_speed(route: &Route, fallback_mps: f64) -> f64 {
    if route.length > 0.0 && route.duration > 0.0 {
        route.length / route.duration
    } else {
        fallback_mps
    }
}

/// Compute route-relative progress for one position fix.
///
/// Returns `None` if the route polyline is empty (a constructed [`Route`]
/// always has at least 2 points).
///
/// # Example
/// ```
/// use route_tracker::{GeoPoint, Route, TrackerConfig};
/// use route_tracker::progress::{average_speed, compute_progress};
///
/// let route = Route::from_points(
///     &[
///         GeoPoint::new(0.0, 0.0),
///         GeoPoint::new(0.0, 0.001),
///         GeoPoint::new(0.0, 0.002),
///     ],
///     222.0,
/// )
/// .unwrap();
///
/// let config = TrackerConfig::default();
/// let speed = average_speed(&route, config.fallback_speed_mps);
/// let progress = compute_progress(&route, &GeoPoint::new(0.0, 0.001), speed, &config).unwrap();
///
/// assert_eq!(progress.nearest_index, 1);
/// assert!(!progress.off_route);
/// ```
pub fn compute_progress(
    route: &Route,
    position: &GeoPoint,
    avg_speed_mps: f64,
    config: &TrackerConfig,
) -> Option<RouteProgress> {
    let nearest = nearest_vertex(position, &route.points)?;

    let off_route = nearest.distance_meters > config.off_route_threshold_meters;
    let remaining_meters = remaining_distance_from(&route.points, nearest.index);
    let remaining_seconds = if avg_speed_mps > 0.0 {
        (remaining_meters / avg_speed_mps).max(0.0)
    } else {
        0.0
    };

    Some(RouteProgress {
        nearest_index: nearest.index,
        distance_to_route: nearest.distance_meters,
        off_route,
        remaining_meters,
        remaining_seconds,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// ~111 m between consecutive vertices at the equator.
    fn equator_route() -> Route {
        let points = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.001),
            GeoPoint::new(0.0, 0.002),
        ];
        let length = crate::geo_utils::polyline_length(&points);
        // Duration chosen so the derived average speed is exactly 1 m/s
        Route::from_points(&points, length).unwrap()
    }

    #[test]
    fn test_nearest_vertex_exact_hit() {
        let route = equator_route();
        let nearest = nearest_vertex(&GeoPoint::new(0.0, 0.001), &route.points).unwrap();
        assert_eq!(nearest.index, 1);
        assert!(nearest.distance_meters < 1e-6);
    }

    #[test]
    fn test_nearest_vertex_empty_polyline() {
        assert!(nearest_vertex(&GeoPoint::new(0.0, 0.0), &[]).is_none());
    }

    #[test]
    fn test_nearest_vertex_tie_breaks_to_lowest_index() {
        let route = equator_route();
        // Exactly halfway between vertex 0 and vertex 1, all on the equator:
        // both distances evaluate to the same float, so the scan keeps index 0
        let midpoint = GeoPoint::new(0.0, 0.0005);
        let nearest = nearest_vertex(&midpoint, &route.points).unwrap();
        assert_eq!(nearest.index, 0);
    }

    #[test]
    fn test_remaining_distance_at_last_vertex_is_zero() {
        let route = equator_route();
        assert_eq!(remaining_distance_from(&route.points, 2), 0.0);
        assert_eq!(remaining_distance_from(&route.points, 99), 0.0);
    }

    #[test]
    fn test_remaining_distance_from_middle() {
        let route = equator_route();
        let rem = remaining_distance_from(&route.points, 1);
        assert!((rem - 111.2).abs() < 0.5, "got {rem}");
    }

    #[test]
    fn test_average_speed_from_route() {
        let route = equator_route();
        let speed = average_speed(&route, 10.0);
        assert!((speed - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_average_speed_fallback_on_zero_duration() {
        let points = vec![GeoPoint::new(0.0, 0.0), GeoPoint::new(0.0, 0.001)];
        let route = Route::from_points(&points, 0.0).unwrap();
        assert_eq!(average_speed(&route, 10.0), 10.0);
    }

    #[test]
    fn test_progress_at_middle_vertex() {
        let route = equator_route();
        let config = TrackerConfig::default();
        let speed = average_speed(&route, config.fallback_speed_mps);

        let progress =
            compute_progress(&route, &GeoPoint::new(0.0, 0.001), speed, &config).unwrap();

        assert_eq!(progress.nearest_index, 1);
        assert!(!progress.off_route);
        assert!((progress.remaining_meters - 111.2).abs() < 0.5);
        assert!((progress.remaining_seconds - 111.2).abs() < 0.5);
    }

    #[test]
    fn test_progress_far_away_is_off_route() {
        let route = equator_route();
        let config = TrackerConfig::default();

        let progress = compute_progress(&route, &GeoPoint::new(1.0, 1.0), 1.0, &config).unwrap();

        assert!(progress.off_route);
        assert!(progress.distance_to_route > 100_000.0);
    }

    #[test]
    fn test_off_route_boundary_is_inclusive() {
        let route = equator_route();
        let position = GeoPoint::new(0.0005, 0.001); // ~55 m north of vertex 1
        let nearest = nearest_vertex(&position, &route.points).unwrap();

        // Threshold exactly at the measured distance: still on-route
        let config = TrackerConfig {
            off_route_threshold_meters: nearest.distance_meters,
            ..TrackerConfig::default()
        };
        let progress = compute_progress(&route, &position, 1.0, &config).unwrap();
        assert!(!progress.off_route);

        // Any smaller threshold flips it
        let config = TrackerConfig {
            off_route_threshold_meters: nearest.distance_meters - 0.001,
            ..TrackerConfig::default()
        };
        let progress = compute_progress(&route, &position, 1.0, &config).unwrap();
        assert!(progress.off_route);
    }

    #[test]
    fn test_off_route_with_default_threshold() {
        let route = equator_route();
        let config = TrackerConfig::default();

        // ~55 m off the route: inside the 60 m default
        let near = compute_progress(&route, &GeoPoint::new(0.0005, 0.001), 1.0, &config).unwrap();
        assert!(!near.off_route);

        // ~72 m off the route: outside it
        let far = compute_progress(&route, &GeoPoint::new(0.00065, 0.001), 1.0, &config).unwrap();
        assert!(far.off_route);
    }
}
