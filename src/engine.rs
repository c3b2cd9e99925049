use crate::audio::{AudioNotifier, AudioOutput};
use crate::classifier::classify;
use crate::config::EngineConfig;
use crate::error::{EngineError, EngineResult};
use crate::escalation::EscalationController;
use crate::location::{AuthorizationStatus, LocationProvider, PositionSourceAdapter};
use crate::position_cache::PositionCache;
use crate::scheduler::PingScheduler;
use crate::status::{EngineCounters, EngineStatus};
use crate::status_client::{HttpStatusEndpoint, RemoteStatusClient, StatusEndpoint};
use std::str::FromStr;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tokio::runtime::Handle;

/// Control operations exposed to the application shell
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ControlCommand {
    Start,
    Stop,
}

impl FromStr for ControlCommand {
    type Err = EngineError;

    /// Accepts the shell's method-channel names (`startService`,
    /// `stopService`) as well as plain `start`/`stop`.
    fn from_str(method: &str) -> Result<Self, Self::Err> {
        match method {
            "startService" | "start" => Ok(ControlCommand::Start),
            "stopService" | "stop" => Ok(ControlCommand::Stop),
            other => Err(EngineError::UnknownCommand(other.to_string())),
        }
    }
}

struct Control {
    adapter: PositionSourceAdapter,
    scheduler: PingScheduler,
}

/// Work done on every timer fire
struct TickPipeline {
    cache: Arc<PositionCache>,
    client: RemoteStatusClient,
    escalation: EscalationController,
    running: Arc<AtomicBool>,
    /// Bumped by every `stop()`; a tick only acts for the session it began in
    session: AtomicU64,
    counters: Arc<EngineCounters>,
}

impl TickPipeline {
    fn is_current(&self, session: u64) -> bool {
        self.running.load(Ordering::SeqCst) && self.session.load(Ordering::SeqCst) == session
    }

    async fn run(&self) {
        if !self.running.load(Ordering::SeqCst) {
            return;
        }
        let session = self.session.load(Ordering::SeqCst);
        self.counters.tick_fired();

        let Some(sample) = self.cache.latest() else {
            self.counters.empty_tick();
            log::debug!("[engine] tick() but no position yet");
            return;
        };
        log::debug!(
            "[engine] tick() lat={}, lng={}",
            sample.latitude,
            sample.longitude
        );

        let result = match self.client.ping(&sample).await {
            Ok(result) => result,
            Err(e) => {
                self.counters.ping_failed();
                log::warn!("[status] ping abandoned: {}", e);
                return;
            }
        };
        self.counters.ping_ok();

        if !self.is_current(session) {
            self.counters.late_response();
            log::debug!("[engine] response arrived after stop(), ignored");
            return;
        }

        log::info!(
            "[status] distance={} level={} within150={} within200={} within500={}",
            result.distance_or_sentinel(),
            classify(result.distance),
            result.within150,
            result.within200,
            result.within500
        );

        match self.escalation.escalate(&result, || self.is_current(session)) {
            Some(announcement) if announcement.played => self.counters.cue_played(),
            Some(_) => self.counters.cue_failed(),
            None if !self.is_current(session) => self.counters.late_response(),
            None => {}
        }
    }
}

/// Background proximity-alert engine.
///
/// Construct once per process and drive it with [`start`](Self::start) and
/// [`stop`](Self::stop); both are idempotent and never fail. Ticks and
/// location updates run on the supplied tokio runtime.
///
/// ```no_run
/// use proximity_alert::audio::AssetAudioOutput;
/// use proximity_alert::config::EngineConfig;
/// use proximity_alert::engine::ProximityEngine;
/// use proximity_alert::location::SimulatedLocationProvider;
/// use std::sync::Arc;
/// use std::time::Duration;
///
/// # async fn run() -> Result<(), Box<dyn std::error::Error>> {
/// let runtime = tokio::runtime::Handle::current();
/// let config = EngineConfig::new("https://example.com/civil_safety_ping.php", "device-1234");
/// let location = Arc::new(SimulatedLocationProvider::new(
///     &[(36.0, 127.0), (36.001, 127.0)],
///     Duration::from_secs(5),
///     runtime.clone(),
/// ));
/// let audio = Arc::new(AssetAudioOutput::new("assets/sounds", "mp3"));
///
/// let engine = ProximityEngine::with_http(config, location, audio, runtime)?;
/// engine.start();
/// // ...
/// engine.stop();
/// # Ok(())
/// # }
/// ```
pub struct ProximityEngine {
    running: Arc<AtomicBool>,
    control: Mutex<Control>,
    provider: Arc<dyn LocationProvider>,
    cache: Arc<PositionCache>,
    pipeline: Arc<TickPipeline>,
    notifier: Arc<AudioNotifier>,
    counters: Arc<EngineCounters>,
    runtime: Handle,
}

impl ProximityEngine {
    pub fn new(
        config: EngineConfig,
        provider: Arc<dyn LocationProvider>,
        endpoint: Arc<dyn StatusEndpoint>,
        audio: Arc<dyn AudioOutput>,
        runtime: Handle,
    ) -> EngineResult<Self> {
        config.validate()?;

        let running = Arc::new(AtomicBool::new(false));
        let cache = Arc::new(PositionCache::new());
        let counters = Arc::new(EngineCounters::new());
        let notifier = Arc::new(AudioNotifier::new(audio));

        let pipeline = Arc::new(TickPipeline {
            cache: Arc::clone(&cache),
            client: RemoteStatusClient::new(endpoint, config.device_id.clone()),
            escalation: EscalationController::new(Arc::clone(&notifier)),
            running: Arc::clone(&running),
            session: AtomicU64::new(0),
            counters: Arc::clone(&counters),
        });

        let control = Control {
            adapter: PositionSourceAdapter::new(
                Arc::clone(&provider),
                Arc::clone(&cache),
                Arc::clone(&counters),
                config.monitoring.clone(),
            ),
            scheduler: PingScheduler::new(config.ping_interval, config.ping_leeway),
        };

        Ok(Self {
            running,
            control: Mutex::new(control),
            provider,
            cache,
            pipeline,
            notifier,
            counters,
            runtime,
        })
    }

    /// Engine that reports to `config.endpoint_url` over HTTP
    pub fn with_http(
        config: EngineConfig,
        provider: Arc<dyn LocationProvider>,
        audio: Arc<dyn AudioOutput>,
        runtime: Handle,
    ) -> EngineResult<Self> {
        config.validate()?;
        let endpoint = Arc::new(HttpStatusEndpoint::new(
            config.endpoint_url.clone(),
            config.request_timeout,
        ));
        Self::new(config, provider, endpoint, audio, runtime)
    }

    pub fn start(&self) {
        let mut control = self.lock_control();
        if self.running.load(Ordering::SeqCst) {
            log::debug!("[engine] start() ignored, already running");
            return;
        }
        log::info!("[engine] start() called");
        self.running.store(true, Ordering::SeqCst);

        if self.provider.authorization_status() == AuthorizationStatus::NotDetermined {
            log::info!("[engine] requesting location authorization");
            self.provider.request_authorization();
        }

        if let Err(e) = control.adapter.begin(&self.runtime) {
            self.counters.sensing_error();
            log::warn!("[location] could not begin sensing: {}", e);
        }

        let pipeline = Arc::clone(&self.pipeline);
        let runtime = self.runtime.clone();
        control.scheduler.start(&self.runtime, move || {
            let pipeline = Arc::clone(&pipeline);
            runtime.spawn(async move { pipeline.run().await });
        });
    }

    pub fn stop(&self) {
        let mut control = self.lock_control();
        if !self.running.swap(false, Ordering::SeqCst) {
            log::debug!("[engine] stop() ignored, not running");
            return;
        }
        log::info!("[engine] stop() called");
        self.pipeline.session.fetch_add(1, Ordering::SeqCst);

        control.scheduler.stop();
        control.adapter.end();
        self.cache.clear();
        self.pipeline.escalation.reset();
        self.notifier.stop();
    }

    /// Dispatch a control method by name
    pub fn handle_command(&self, method: &str) -> EngineResult<()> {
        match method.parse::<ControlCommand>()? {
            ControlCommand::Start => self.start(),
            ControlCommand::Stop => self.stop(),
        }
        Ok(())
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    /// Run one tick right away, outside the timer cadence
    pub async fn tick(&self) {
        self.pipeline.run().await;
    }

    pub fn status(&self) -> EngineStatus {
        let control = self.lock_control();
        EngineStatus {
            running: self.is_running(),
            timer_active: control.scheduler.is_active(),
            sensing_active: control.adapter.is_active(),
            authorization: self.provider.authorization_status(),
            last_sample: self.cache.latest(),
            escalation: self.pipeline.escalation.state(),
            current_cue: self.notifier.current(),
            counters: self.counters.snapshot(),
        }
    }

    fn lock_control(&self) -> MutexGuard<'_, Control> {
        self.control.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Drop for ProximityEngine {
    fn drop(&mut self) {
        self.stop();
    }
}
