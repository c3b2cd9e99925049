use super::{LocationEvent, LocationProvider, LocationSink};
use crate::config::MonitoringConfig;
use crate::error::SensingError;
use crate::position_cache::PositionCache;
use crate::status::EngineCounters;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::sync::mpsc::{self, UnboundedReceiver};
use tokio::task::JoinHandle;

struct Subscription {
    active: Arc<AtomicBool>,
    pump: JoinHandle<()>,
}

/// Owns the location subscription and moves samples into the cache.
///
/// The platform callback writes into an mpsc channel; a pump task on the
/// runtime drains it. Sensing failures are logged and counted, never fatal.
pub struct PositionSourceAdapter {
    provider: Arc<dyn LocationProvider>,
    cache: Arc<PositionCache>,
    counters: Arc<EngineCounters>,
    config: MonitoringConfig,
    subscription: Option<Subscription>,
}

impl PositionSourceAdapter {
    pub fn new(
        provider: Arc<dyn LocationProvider>,
        cache: Arc<PositionCache>,
        counters: Arc<EngineCounters>,
        config: MonitoringConfig,
    ) -> Self {
        Self {
            provider,
            cache,
            counters,
            config,
            subscription: None,
        }
    }

    /// Subscribe to location updates. No-op while already subscribed.
    pub fn begin(&mut self, runtime: &Handle) -> Result<(), SensingError> {
        if self.subscription.is_some() {
            return Ok(());
        }

        let (tx, rx) = mpsc::unbounded_channel();
        let active = Arc::new(AtomicBool::new(true));
        let pump = runtime.spawn(pump_events(
            rx,
            Arc::clone(&self.cache),
            Arc::clone(&self.counters),
            Arc::clone(&active),
        ));

        if let Err(e) = self
            .provider
            .start_monitoring(&self.config, LocationSink::new(tx))
        {
            active.store(false, Ordering::SeqCst);
            pump.abort();
            return Err(e);
        }

        log::info!(
            "[location] monitoring started (accuracy {:?} ~{}m, filter {}m, significant changes only: {})",
            self.config.accuracy,
            self.config.accuracy.meters(),
            self.config.distance_filter_m,
            self.config.significant_changes_only
        );
        self.subscription = Some(Subscription { active, pump });
        Ok(())
    }

    /// Unsubscribe. After this returns the pump writes nothing more.
    pub fn end(&mut self) {
        if let Some(sub) = self.subscription.take() {
            sub.active.store(false, Ordering::SeqCst);
            self.provider.stop_monitoring();
            sub.pump.abort();
            log::info!("[location] monitoring stopped");
        }
    }

    pub fn is_active(&self) -> bool {
        self.subscription.is_some()
    }
}

impl Drop for PositionSourceAdapter {
    fn drop(&mut self) {
        self.end();
    }
}

async fn pump_events(
    mut rx: UnboundedReceiver<LocationEvent>,
    cache: Arc<PositionCache>,
    counters: Arc<EngineCounters>,
    active: Arc<AtomicBool>,
) {
    while let Some(event) = rx.recv().await {
        match event {
            LocationEvent::Update(sample) => {
                let (lat, lng) = (sample.latitude, sample.longitude);
                if !cache.store_if(sample, &active) {
                    break;
                }
                counters.sample_received();
                log::debug!("[location] didUpdateLocations lat={}, lng={}", lat, lng);
            }
            LocationEvent::Failed(err) => {
                counters.sensing_error();
                log::warn!("[location] didFailWithError: {}", err);
            }
        }
    }
}
