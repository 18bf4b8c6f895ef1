//! Display formatting for the navigation banner.

/// Meters as kilometers with one decimal, e.g. `"12.3 km"`.
pub fn format_km(meters: f64) -> String {
    format!("{:.1} km", meters / 1000.0)
}

/// Seconds as whole minutes, rounded, never below one, e.g. `"5 min"`.
pub fn format_minutes(seconds: f64) -> String {
    let minutes = (seconds / 60.0).round() as i64;
    format!("{} min", minutes.max(1))
}
