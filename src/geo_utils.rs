//! Geographic utilities: great-circle distance, polyline length, bounds.
//!
//! All distances in this crate go through [`haversine_distance`]. The sphere
//! approximation is within GPS noise for consumer hardware, so no ellipsoid
//! correction is applied.

use crate::{Bounds, GeoPoint};

/// Mean Earth radius in meters.
pub const EARTH_RADIUS_METERS: f64 = 6_371_000.0;

/// Great-circle distance between two points in meters (haversine formula).
///
/// # Example
/// ```
/// use route_tracker::GeoPoint;
/// use route_tracker::geo_utils::haversine_distance;
///
/// let a = GeoPoint::new(0.0, 0.0);
/// let b = GeoPoint::new(0.0, 0.001);
/// let d = haversine_distance(&a, &b);
/// assert!((d - 111.2).abs() < 0.5); // ~111 m per 0.001 deg at the equator
/// ```
pub fn haversine_distance(a: &GeoPoint, b: &GeoPoint) -> f64 {
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();

    let s = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);

    2.0 * EARTH_RADIUS_METERS * s.sqrt().asin()
}

/// Total length of a polyline in meters (sum of consecutive-point distances).
///
/// Returns 0 for polylines with fewer than 2 points.
pub fn polyline_length(points: &[GeoPoint]) -> f64 {
    points
        .windows(2)
        .map(|w| haversine_distance(&w[0], &w[1]))
        .sum()
}

/// Compute the bounding box of a set of points.
///
/// Returns `None` for an empty slice.
pub fn compute_bounds(points: &[GeoPoint]) -> Option<Bounds> {
    Bounds::from_points(points)
}

/// Compute the center of a set of points (center of the bounding box).
pub fn compute_center(points: &[GeoPoint]) -> Option<GeoPoint> {
    Bounds::from_points(points).map(|b| b.center())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identical_points_zero_distance() {
        let p = GeoPoint::new(17.385, 78.4867);
        assert_eq!(haversine_distance(&p, &p), 0.0);
    }

    #[test]
    fn test_distance_is_symmetric() {
        let a = GeoPoint::new(17.385, 78.4867);
        let b = GeoPoint::new(17.4065, 78.4772);
        assert!((haversine_distance(&a, &b) - haversine_distance(&b, &a)).abs() < 1e-9);
    }

    #[test]
    fn test_one_degree_of_latitude() {
        // 1 degree of latitude is ~111.2 km everywhere on the sphere
        let a = GeoPoint::new(0.0, 0.0);
        let b = GeoPoint::new(1.0, 0.0);
        let d = haversine_distance(&a, &b);
        assert!((d - 111_195.0).abs() < 100.0, "got {d}");
    }

    #[test]
    fn test_polyline_length_sums_segments() {
        let points = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(0.0, 0.001),
            GeoPoint::new(0.0, 0.002),
        ];
        let total = polyline_length(&points);
        let seg = haversine_distance(&points[0], &points[1]);
        assert!((total - 2.0 * seg).abs() < 1e-9);
    }

    #[test]
    fn test_polyline_length_degenerate() {
        assert_eq!(polyline_length(&[]), 0.0);
        assert_eq!(polyline_length(&[GeoPoint::new(1.0, 1.0)]), 0.0);
    }

    #[test]
    fn test_compute_bounds_and_center() {
        let points = vec![
            GeoPoint::new(0.0, 0.0),
            GeoPoint::new(2.0, 4.0),
            GeoPoint::new(1.0, 2.0),
        ];
        let bounds = compute_bounds(&points).unwrap();
        assert_eq!(bounds.min_lat, 0.0);
        assert_eq!(bounds.max_lat, 2.0);
        assert_eq!(bounds.min_lng, 0.0);
        assert_eq!(bounds.max_lng, 4.0);

        let center = compute_center(&points).unwrap();
        assert_eq!(center.latitude, 1.0);
        assert_eq!(center.longitude, 2.0);
    }

    #[test]
    fn test_compute_bounds_empty() {
        assert!(compute_bounds(&[]).is_none());
    }
}
