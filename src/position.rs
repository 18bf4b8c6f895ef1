//! Position source contract.
//!
//! The tracker consumes device location through this trait so that the
//! platform bridge (mobile FFI, simulator, test harness) stays swappable.
//! Delivery is callback-driven with an explicit cancellable handle rather
//! than an implicit listener list, keeping ownership and lifetime visible.

use std::sync::Arc;

use log::debug;

use crate::error::Result;
use crate::GeoPoint;

/// Outcome of a location permission request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PermissionStatus {
    Granted,
    Denied,
}

/// Callback invoked for every reported position fix.
pub type PositionCallback = Arc<dyn Fn(GeoPoint) + Send + Sync>;

/// A source of device positions.
///
/// Implementations wrap the platform location API. Both queries are
/// externally driven and may suspend until the platform answers; no
/// caller-imposed timeout is applied here.
pub trait PositionSource {
    /// Ask the user for location access.
    fn request_permission(&self) -> Result<PermissionStatus>;

    /// One-shot current position query.
    ///
    /// Fails with [`crate::TrackError::PositionUnavailable`] when no fix can
    /// be produced, or [`crate::TrackError::PermissionDenied`] if access was
    /// revoked in the meantime.
    fn current_position(&self) -> Result<GeoPoint>;

    /// Begin delivering position fixes to `on_update`.
    ///
    /// Fixes arrive in delivery order, one at a time, until the returned
    /// [`Subscription`] is released.
    fn subscribe(&self, on_update: PositionCallback) -> Result<Subscription>;
}

/// Handle to an active position subscription.
///
/// Releasing is synchronous: after `release()` returns, the source delivers
/// no further fixes through this subscription. Dropping the handle releases
/// it as well.
pub struct Subscription {
    cancel: Option<Box<dyn FnOnce() + Send>>,
}

impl Subscription {
    /// Wrap a cancellation closure supplied by the position source.
    pub fn new(cancel: impl FnOnce() + Send + 'static) -> Self {
        Self {
            cancel: Some(Box::new(cancel)),
        }
    }

    /// Stop delivery. Idempotent.
    pub fn release(&mut self) {
        if let Some(cancel) = self.cancel.take() {
            cancel();
            debug!("position subscription released");
        }
    }

    /// Whether the subscription has already been released.
    pub fn is_released(&self) -> bool {
        self.cancel.is_none()
    }
}

impl Drop for Subscription {
    fn drop(&mut self) {
        self.release();
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("released", &self.is_released())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_release_runs_cancel_once() {
        let count = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::clone(&count);

        let mut sub = Subscription::new(move || {
            cancelled.fetch_add(1, Ordering::SeqCst);
        });
        assert!(!sub.is_released());

        sub.release();
        sub.release();

        assert!(sub.is_released());
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_drop_releases() {
        let count = Arc::new(AtomicUsize::new(0));
        let cancelled = Arc::clone(&count);

        {
            let _sub = Subscription::new(move || {
                cancelled.fetch_add(1, Ordering::SeqCst);
            });
        }

        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
