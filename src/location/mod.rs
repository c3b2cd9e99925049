// Location capability boundary: the platform pushes samples through a
// LocationSink, the adapter pumps them into the position cache.

pub mod adapter;
pub mod simulated;

pub use adapter::PositionSourceAdapter;
pub use simulated::{densify_route, SimulatedLocationProvider};

use crate::config::MonitoringConfig;
use crate::error::SensingError;
use crate::types::PositionSample;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use tokio::sync::mpsc::UnboundedSender;

/// Platform authorization state for background location access
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorizationStatus {
    /// User has not been asked yet
    NotDetermined,
    /// Prompt shown, no answer yet
    Requested,
    Denied,
    AuthorizedWhenInUse,
    AuthorizedAlways,
}

impl AuthorizationStatus {
    pub fn is_authorized(self) -> bool {
        matches!(
            self,
            AuthorizationStatus::AuthorizedWhenInUse | AuthorizationStatus::AuthorizedAlways
        )
    }
}

/// Event delivered from the platform callback context
#[derive(Debug, Clone, PartialEq)]
pub enum LocationEvent {
    Update(PositionSample),
    Failed(SensingError),
}

/// Handle given to the platform for delivering location events.
///
/// Cheap to clone and safe to call from any thread. Every method returns
/// `false` once the subscription that created the sink has ended.
#[derive(Debug, Clone)]
pub struct LocationSink {
    tx: UnboundedSender<LocationEvent>,
}

impl LocationSink {
    pub(crate) fn new(tx: UnboundedSender<LocationEvent>) -> Self {
        Self { tx }
    }

    pub fn update(&self, latitude: f64, longitude: f64) -> bool {
        self.send(LocationEvent::Update(PositionSample::now(latitude, longitude)))
    }

    pub fn update_at(&self, latitude: f64, longitude: f64, captured_at: DateTime<Utc>) -> bool {
        self.send(LocationEvent::Update(PositionSample::new(
            latitude,
            longitude,
            captured_at,
        )))
    }

    /// Deliver a platform batch; only the newest sample is kept
    pub fn update_batch(&self, samples: &[PositionSample]) -> bool {
        match samples.last() {
            Some(last) => self.send(LocationEvent::Update(last.clone())),
            None => !self.is_closed(),
        }
    }

    pub fn fail(&self, error: SensingError) -> bool {
        self.send(LocationEvent::Failed(error))
    }

    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }

    fn send(&self, event: LocationEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Platform location capability.
///
/// `start_monitoring` may be called while authorization is still pending;
/// implementations deliver samples once access is granted. It fails only
/// when sensing cannot start at all (denied, hardware unavailable).
pub trait LocationProvider: Send + Sync {
    fn authorization_status(&self) -> AuthorizationStatus;

    /// Ask the user for background ("always") access
    fn request_authorization(&self);

    fn start_monitoring(
        &self,
        config: &MonitoringConfig,
        sink: LocationSink,
    ) -> Result<(), SensingError>;

    fn stop_monitoring(&self);
}
