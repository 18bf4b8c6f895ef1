//! Scripted position sources for deterministic testing.
//!
//! [`ScriptedPositionSource`] replays caller-supplied fixes instead of
//! talking to a platform location API. Tests drive it directly: push fixes
//! through the live subscription, or replay one "in-flight" fix after the
//! subscription was released to exercise the tracker's stop guard.

use std::sync::{Arc, Mutex};

use crate::error::{Result, TrackError};
use crate::position::{PermissionStatus, PositionCallback, PositionSource, Subscription};
use crate::GeoPoint;

struct ScriptedInner {
    permission: PermissionStatus,
    initial_fix: Option<GeoPoint>,
    /// Live delivery slot, cleared when the subscription is released.
    live: Mutex<Option<PositionCallback>>,
    /// Kept past release so tests can simulate a fix that was already in
    /// flight when the subscription was torn down.
    retained: Mutex<Option<PositionCallback>>,
}

/// A position source that delivers exactly the fixes a test pushes into it.
#[derive(Clone)]
pub struct ScriptedPositionSource {
    inner: Arc<ScriptedInner>,
}

impl ScriptedPositionSource {
    /// Source with granted permission and `initial` as the one-shot fix.
    pub fn granted_at(initial: GeoPoint) -> Self {
        Self {
            inner: Arc::new(ScriptedInner {
                permission: PermissionStatus::Granted,
                initial_fix: Some(initial),
                live: Mutex::new(None),
                retained: Mutex::new(None),
            }),
        }
    }

    /// Source that refuses the permission request.
    pub fn denied() -> Self {
        Self {
            inner: Arc::new(ScriptedInner {
                permission: PermissionStatus::Denied,
                initial_fix: None,
                live: Mutex::new(None),
                retained: Mutex::new(None),
            }),
        }
    }

    /// Source with granted permission but no fix available yet.
    pub fn granted_without_fix() -> Self {
        Self {
            inner: Arc::new(ScriptedInner {
                permission: PermissionStatus::Granted,
                initial_fix: None,
                live: Mutex::new(None),
                retained: Mutex::new(None),
            }),
        }
    }

    /// Deliver a fix through the live subscription.
    ///
    /// Returns `false` if there is no active subscription (never subscribed,
    /// or already released).
    pub fn push_fix(&self, point: GeoPoint) -> bool {
        let callback = self.inner.live.lock().unwrap().clone();
        match callback {
            Some(cb) => {
                cb(point);
                true
            }
            None => false,
        }
    }

    /// Deliver a fix through the retained callback, bypassing release.
    ///
    /// Simulates a delivery that was already in flight when the subscription
    /// was released; the tracker is expected to ignore it.
    pub fn deliver_late(&self, point: GeoPoint) -> bool {
        let callback = self.inner.retained.lock().unwrap().clone();
        match callback {
            Some(cb) => {
                cb(point);
                true
            }
            None => false,
        }
    }

    /// Whether a live subscription is currently attached.
    pub fn is_subscribed(&self) -> bool {
        self.inner.live.lock().unwrap().is_some()
    }
}

impl PositionSource for ScriptedPositionSource {
    fn request_permission(&self) -> Result<PermissionStatus> {
        Ok(self.inner.permission)
    }

    fn current_position(&self) -> Result<GeoPoint> {
        if self.inner.permission == PermissionStatus::Denied {
            return Err(TrackError::PermissionDenied);
        }
        self.inner
            .initial_fix
            .ok_or_else(|| TrackError::PositionUnavailable {
                message: "no fix scripted".to_string(),
            })
    }

    fn subscribe(&self, on_update: PositionCallback) -> Result<Subscription> {
        *self.inner.live.lock().unwrap() = Some(Arc::clone(&on_update));
        *self.inner.retained.lock().unwrap() = Some(on_update);

        let inner = Arc::clone(&self.inner);
        Ok(Subscription::new(move || {
            *inner.live.lock().unwrap() = None;
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[test]
    fn test_push_fix_requires_subscription() {
        let source = ScriptedPositionSource::granted_at(GeoPoint::new(0.0, 0.0));
        assert!(!source.push_fix(GeoPoint::new(0.0, 0.001)));
    }

    #[test]
    fn test_release_stops_delivery_but_retains_inflight_path() {
        let source = ScriptedPositionSource::granted_at(GeoPoint::new(0.0, 0.0));
        let delivered = Arc::new(AtomicUsize::new(0));
        let seen = Arc::clone(&delivered);

        let mut sub = source
            .subscribe(Arc::new(move |_point| {
                seen.fetch_add(1, Ordering::SeqCst);
            }))
            .unwrap();

        assert!(source.push_fix(GeoPoint::new(0.0, 0.001)));
        sub.release();
        assert!(!source.push_fix(GeoPoint::new(0.0, 0.002)));
        assert!(source.deliver_late(GeoPoint::new(0.0, 0.003)));

        assert_eq!(delivered.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_denied_source() {
        let source = ScriptedPositionSource::denied();
        assert_eq!(
            source.request_permission().unwrap(),
            PermissionStatus::Denied
        );
        assert!(matches!(
            source.current_position(),
            Err(TrackError::PermissionDenied)
        ));
    }
}
