//! Deep links into native map applications.
//!
//! Once a user wants live turn-by-turn guidance, the app hands off to the
//! platform's maps application. These builders produce the Google and Apple
//! Maps directions URLs (HTTPS forms, so they resolve in a browser when the
//! app is absent) with origin/destination free text percent-encoded.

use urlencoding::encode;

/// Platform the app is running on, used to order primary/fallback links.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Platform {
    Ios,
    Android,
}

/// Google Maps driving-directions URL.
///
/// `origin` and `destination` are free text: an address, a place name, or a
/// `"lat,lng"` pair.
pub fn google_directions_url(origin: &str, destination: &str) -> String {
    format!(
        "https://www.google.com/maps/dir/?api=1&origin={}&destination={}&travelmode=driving",
        encode(origin),
        encode(destination)
    )
}

/// Apple Maps driving-directions URL (HTTPS, not the `maps:` scheme).
pub fn apple_directions_url(origin: &str, destination: &str) -> String {
    format!(
        "https://maps.apple.com/?saddr={}&daddr={}&dirflg=d",
        encode(origin),
        encode(destination)
    )
}

/// Directions URLs ordered `[primary, fallback]` for the platform.
///
/// Apple Maps first on iOS, Google Maps first elsewhere; the caller opens
/// the first URL the platform accepts.
pub fn directions_urls(platform: Platform, origin: &str, destination: &str) -> [String; 2] {
    let google = google_directions_url(origin, destination);
    let apple = apple_directions_url(origin, destination);

    match platform {
        Platform::Ios => [apple, google],
        Platform::Android => [google, apple],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_google_url_encodes_free_text() {
        let url = google_directions_url("Charminar, Hyderabad", "17.44,78.35");
        assert_eq!(
            url,
            "https://www.google.com/maps/dir/?api=1&origin=Charminar%2C%20Hyderabad\
             &destination=17.44%2C78.35&travelmode=driving"
        );
    }

    #[test]
    fn test_apple_url_uses_https_form() {
        let url = apple_directions_url("A & B", "C");
        assert!(url.starts_with("https://maps.apple.com/?saddr="));
        assert!(url.contains("saddr=A%20%26%20B"));
        assert!(url.ends_with("&daddr=C&dirflg=d"));
    }

    #[test]
    fn test_platform_ordering() {
        let [primary, fallback] = directions_urls(Platform::Ios, "a", "b");
        assert!(primary.contains("maps.apple.com"));
        assert!(fallback.contains("google.com"));

        let [primary, fallback] = directions_urls(Platform::Android, "a", "b");
        assert!(primary.contains("google.com"));
        assert!(fallback.contains("maps.apple.com"));
    }
}
