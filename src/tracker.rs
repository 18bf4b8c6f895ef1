//! Navigation progress tracker.
//!
//! [`NavigationTracker`] turns a raw position stream into route-relative
//! progress: on every fix it recomputes the nearest polyline vertex, the
//! off-route flag, and the remaining distance/time, then publishes a session
//! snapshot to the registered observer.
//!
//! ## Ownership
//!
//! The tracker exclusively owns its [`TrackingSession`]; only the tracker
//! mutates it, and only in response to its own callbacks. The route is
//! read-only shared data (`Arc<Route>`) replaced wholesale on re-route.
//! Exactly one session is active at a time, and the session never outlives
//! the route it tracks: installing, replacing, or clearing the route
//! force-stops any active session first.

use std::sync::{Arc, Mutex};

use log::{debug, info, warn};
use serde::{Deserialize, Serialize};

use crate::error::{Result, TrackError};
use crate::position::{PermissionStatus, PositionSource, Subscription};
use crate::progress::{average_speed, compute_progress};
use crate::{GeoPoint, Route, TrackerConfig};

/// Callback receiving a session snapshot after every processed fix.
pub type SessionCallback = Arc<dyn Fn(TrackingSession) + Send + Sync>;

/// Mutable state of one navigation attempt.
///
/// Published to observers by value; the tracker keeps the single writable
/// instance behind its session lock.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackingSession {
    /// Whether navigation is currently running.
    pub active: bool,
    /// Most recent position fix, if any.
    pub last_known_position: Option<GeoPoint>,
    /// Whether the last fix exceeded the off-route threshold.
    pub off_route: bool,
    /// Distance left along the route in meters.
    pub remaining_meters: Option<f64>,
    /// Estimated time left in seconds.
    pub remaining_seconds: Option<f64>,
}

/// Tracks live progress along an installed route.
pub struct NavigationTracker<S: PositionSource> {
    source: S,
    config: TrackerConfig,
    route: Option<Arc<Route>>,
    session: Arc<Mutex<TrackingSession>>,
    subscription: Option<Subscription>,
    observer: Option<SessionCallback>,
}

impl<S: PositionSource> NavigationTracker<S> {
    /// Create a tracker over the given position source.
    pub fn new(source: S) -> Self {
        Self::with_config(source, TrackerConfig::default())
    }

    /// Create a tracker with custom thresholds.
    pub fn with_config(source: S, config: TrackerConfig) -> Self {
        Self {
            source,
            config,
            route: None,
            session: Arc::new(Mutex::new(TrackingSession::default())),
            subscription: None,
            observer: None,
        }
    }

    /// Register the observer that receives session snapshots.
    ///
    /// The presentation layer issues `start()`/`stop()` and reads snapshots;
    /// it has no other input into the tracker.
    pub fn on_session_update(&mut self, callback: SessionCallback) {
        self.observer = Some(callback);
    }

    /// Install a route, force-stopping any active session.
    pub fn set_route(&mut self, route: Route) {
        self.stop();
        debug!(
            "route installed: {} points, {:.0} m, {:.0} s estimated",
            route.points.len(),
            route.length,
            route.duration
        );
        self.route = Some(Arc::new(route));
    }

    /// Clear the installed route, force-stopping any active session.
    pub fn clear_route(&mut self) {
        self.stop();
        self.route = None;
    }

    /// The currently installed route, if any.
    pub fn route(&self) -> Option<&Arc<Route>> {
        self.route.as_ref()
    }

    /// Snapshot of the current session state.
    pub fn session(&self) -> TrackingSession {
        lock_session(&self.session).clone()
    }

    /// Whether a session is currently active.
    pub fn is_active(&self) -> bool {
        lock_session(&self.session).active
    }

    /// Start navigating the installed route.
    ///
    /// Acquires location permission, seeds the session from the one-shot
    /// position query, and subscribes to live fixes. Fails with
    /// [`TrackError::RouteMissing`] when no route is installed and
    /// [`TrackError::PermissionDenied`] when access is refused; any failure
    /// leaves the session fully inactive.
    pub fn start(&mut self) -> Result<()> {
        let route = self.route.clone().ok_or(TrackError::RouteMissing)?;

        if self.is_active() {
            debug!("start() on an active session, ignoring");
            return Ok(());
        }

        match self.source.request_permission()? {
            PermissionStatus::Granted => {}
            PermissionStatus::Denied => return Err(TrackError::PermissionDenied),
        }

        let initial = self.source.current_position()?;
        let avg_speed_mps = average_speed(&route, self.config.fallback_speed_mps);

        {
            let mut session = lock_session(&self.session);
            session.active = true;
            apply_fix(&mut session, &route, avg_speed_mps, &self.config, initial);
        }

        let on_update = self.make_update_callback(Arc::clone(&route), avg_speed_mps);
        match self.source.subscribe(on_update) {
            Ok(subscription) => {
                self.subscription = Some(subscription);
            }
            Err(err) => {
                *lock_session(&self.session) = TrackingSession::default();
                return Err(err);
            }
        }

        info!(
            "navigation started: {:.0} m route, avg speed {:.1} m/s",
            route.length, avg_speed_mps
        );
        self.publish();
        Ok(())
    }

    /// Stop navigating.
    ///
    /// Synchronously releases the position subscription so no further fixes
    /// are delivered, deactivates the session, and clears the off-route flag
    /// and remaining-distance/time fields. Idempotent.
    pub fn stop(&mut self) {
        if let Some(mut subscription) = self.subscription.take() {
            subscription.release();
        }

        let mut session = lock_session(&self.session);
        if !session.active {
            return;
        }
        session.active = false;
        session.off_route = false;
        session.remaining_meters = None;
        session.remaining_seconds = None;
        drop(session);

        info!("navigation stopped");
        self.publish();
    }

    fn make_update_callback(
        &self,
        route: Arc<Route>,
        avg_speed_mps: f64,
    ) -> crate::position::PositionCallback {
        let session = Arc::clone(&self.session);
        let config = self.config;
        let observer = self.observer.clone();

        Arc::new(move |point: GeoPoint| {
            let mut guard = lock_session(&session);
            // A fix can already be in flight when the subscription is
            // released; the session owns the truth about liveness.
            if !guard.active {
                debug!("position update after stop, ignoring");
                return;
            }

            apply_fix(&mut guard, &route, avg_speed_mps, &config, point);
            let snapshot = guard.clone();
            drop(guard);

            if let Some(callback) = &observer {
                callback(snapshot);
            }
        })
    }

    fn publish(&self) {
        if let Some(callback) = &self.observer {
            callback(self.session());
        }
    }
}

impl<S: PositionSource> Drop for NavigationTracker<S> {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Recompute session fields from one fix. Runs under the session lock.
fn apply_fix(
    session: &mut TrackingSession,
    route: &Route,
    avg_speed_mps: f64,
    config: &TrackerConfig,
    point: GeoPoint,
) {
    session.last_known_position = Some(point);

    match compute_progress(route, &point, avg_speed_mps, config) {
        Some(progress) => {
            if progress.off_route != session.off_route {
                if progress.off_route {
                    warn!(
                        "off route: {:.0} m from nearest vertex {}",
                        progress.distance_to_route, progress.nearest_index
                    );
                } else {
                    info!("back on route at vertex {}", progress.nearest_index);
                }
            }
            session.off_route = progress.off_route;
            session.remaining_meters = Some(progress.remaining_meters);
            session.remaining_seconds = Some(progress.remaining_seconds);
        }
        None => {
            // Empty polyline cannot occur for a constructed Route; keep the
            // previous metrics (stale-but-valid) rather than erroring.
            debug!("progress unavailable for fix, keeping previous metrics");
        }
    }
}

fn lock_session(session: &Mutex<TrackingSession>) -> std::sync::MutexGuard<'_, TrackingSession> {
    match session.lock() {
        Ok(guard) => guard,
        Err(poisoned) => poisoned.into_inner(),
    }
}
