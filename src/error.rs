//! Unified error handling for the route-tracker library.
//!
//! One error type covers the whole surface: session start failures, the
//! optional service clients, and transport problems. No failure leaves a
//! partially started session behind.

use thiserror::Error;

/// Unified error type for route-tracker operations.
#[derive(Debug, Clone, Error)]
pub enum TrackError {
    /// Location access was refused; the session never starts.
    #[error("location permission not granted")]
    PermissionDenied,

    /// Navigation was started with no route, or a degenerate one.
    #[error("no route with at least 2 points is available")]
    RouteMissing,

    /// The one-shot position query produced no fix.
    #[error("current position unavailable: {message}")]
    PositionUnavailable { message: String },

    /// An external routing/geocoding service failed.
    ///
    /// Surfaced to the caller without automatic retry; the user may retry
    /// the action manually.
    #[error("provider error{}: {message}", .status_code.map(|c| format!(" (HTTP {c})")).unwrap_or_default())]
    ProviderFailure {
        message: String,
        status_code: Option<u16>,
    },

    /// Transport-level HTTP failure in one of the service clients.
    #[error("http error: {message}")]
    Http { message: String },
}

impl TrackError {
    /// Provider failure without an HTTP status.
    pub fn provider(message: impl Into<String>) -> Self {
        TrackError::ProviderFailure {
            message: message.into(),
            status_code: None,
        }
    }
}

#[cfg(feature = "http")]
impl From<reqwest::Error> for TrackError {
    fn from(err: reqwest::Error) -> Self {
        TrackError::Http {
            message: err.to_string(),
        }
    }
}

/// Result type alias for route-tracker operations.
pub type Result<T> = std::result::Result<T, TrackError>;
