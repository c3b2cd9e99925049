use super::{AuthorizationStatus, LocationProvider, LocationSink};
use crate::config::MonitoringConfig;
use crate::error::SensingError;
use geo::{HaversineDistance, HaversineIntermediate, Point};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration, MissedTickBehavior};

struct SimState {
    authorization: AuthorizationStatus,
    grant_on_request: bool,
    replay: Option<JoinHandle<()>>,
}

/// Location provider that replays a fixed route.
///
/// Stands in for the platform capability in the demo binary and in
/// tests. One waypoint is considered per `step`; waypoints closer than the
/// subscription's distance filter to the last delivered one are skipped,
/// the way the platform suppresses small movements. Nothing is delivered
/// while authorization is missing, and the final waypoint is held once
/// the route is exhausted.
pub struct SimulatedLocationProvider {
    route: Vec<Point<f64>>,
    step: Duration,
    runtime: Handle,
    state: Arc<Mutex<SimState>>,
}

impl SimulatedLocationProvider {
    /// `route` is a list of `(latitude, longitude)` waypoints
    pub fn new(route: &[(f64, f64)], step: Duration, runtime: Handle) -> Self {
        Self {
            route: route
                .iter()
                .map(|&(lat, lng)| Point::new(lng, lat))
                .collect(),
            step,
            runtime,
            state: Arc::new(Mutex::new(SimState {
                authorization: AuthorizationStatus::NotDetermined,
                grant_on_request: true,
                replay: None,
            })),
        }
    }

    /// Answer to give when authorization is requested
    pub fn with_grant_on_request(self, grant: bool) -> Self {
        lock(&self.state).grant_on_request = grant;
        self
    }

    pub fn set_authorization(&self, status: AuthorizationStatus) {
        lock(&self.state).authorization = status;
    }

    pub fn is_replaying(&self) -> bool {
        lock(&self.state)
            .replay
            .as_ref()
            .map(|task| !task.is_finished())
            .unwrap_or(false)
    }
}

impl LocationProvider for SimulatedLocationProvider {
    fn authorization_status(&self) -> AuthorizationStatus {
        lock(&self.state).authorization
    }

    fn request_authorization(&self) {
        let mut state = lock(&self.state);
        if state.authorization != AuthorizationStatus::NotDetermined {
            return;
        }
        state.authorization = if state.grant_on_request {
            AuthorizationStatus::AuthorizedAlways
        } else {
            AuthorizationStatus::Denied
        };
        log::info!("[simulated] authorization answered: {:?}", state.authorization);
    }

    fn start_monitoring(
        &self,
        config: &MonitoringConfig,
        sink: LocationSink,
    ) -> Result<(), SensingError> {
        let mut state = lock(&self.state);
        if state.authorization == AuthorizationStatus::Denied {
            return Err(SensingError::NotAuthorized);
        }
        if self.route.is_empty() {
            return Err(SensingError::Unavailable("route has no waypoints".to_string()));
        }

        if let Some(previous) = state.replay.take() {
            previous.abort();
        }
        state.replay = Some(self.runtime.spawn(replay_route(
            self.route.clone(),
            self.step,
            config.distance_filter_m,
            sink,
            Arc::clone(&self.state),
        )));
        Ok(())
    }

    fn stop_monitoring(&self) {
        if let Some(task) = lock(&self.state).replay.take() {
            task.abort();
        }
    }
}

async fn replay_route(
    route: Vec<Point<f64>>,
    step: Duration,
    min_displacement_m: f64,
    sink: LocationSink,
    state: Arc<Mutex<SimState>>,
) {
    let mut ticker = interval(step);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
    let mut last_delivered: Option<Point<f64>> = None;
    let mut next = 0;

    while next < route.len() {
        ticker.tick().await;
        let authorized = lock(&state).authorization.is_authorized();
        if !authorized {
            continue;
        }

        let point = route[next];
        next += 1;

        if let Some(prev) = last_delivered {
            if prev.haversine_distance(&point) < min_displacement_m {
                continue;
            }
        }
        if !sink.update(point.y(), point.x()) {
            break;
        }
        last_delivered = Some(point);
    }
}

/// Insert intermediate great-circle points so that consecutive waypoints
/// are at most `spacing_m` apart.
pub fn densify_route(waypoints: &[(f64, f64)], spacing_m: f64) -> Vec<(f64, f64)> {
    let Some(&first) = waypoints.first() else {
        return Vec::new();
    };
    if spacing_m.is_nan() || spacing_m <= 0.0 {
        return waypoints.to_vec();
    }

    let mut route = vec![first];
    for pair in waypoints.windows(2) {
        let from = Point::new(pair[0].1, pair[0].0);
        let to = Point::new(pair[1].1, pair[1].0);
        let segments = (from.haversine_distance(&to) / spacing_m).ceil().max(1.0) as usize;

        for i in 1..=segments {
            let p = from.haversine_intermediate(&to, i as f64 / segments as f64);
            route.push((p.y(), p.x()));
        }
    }
    route
}

fn lock(state: &Mutex<SimState>) -> MutexGuard<'_, SimState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}
