use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Duration, Instant, MissedTickBehavior};

struct Timer {
    armed: Arc<AtomicBool>,
    task: JoinHandle<()>,
}

/// Recurring ping timer, independent of any UI lifecycle.
///
/// First fire is one full period after `start`. A fire that lands later
/// than the period plus leeway is logged; missed fires are not replayed
/// in a burst.
pub struct PingScheduler {
    period: Duration,
    leeway: Duration,
    timer: Option<Timer>,
}

impl PingScheduler {
    pub fn new(period: Duration, leeway: Duration) -> Self {
        Self {
            period,
            leeway,
            timer: None,
        }
    }

    /// Start firing `on_tick` every period.
    ///
    /// Returns `false` (and does nothing) if the timer is already running.
    pub fn start<F>(&mut self, runtime: &Handle, on_tick: F) -> bool
    where
        F: Fn() + Send + Sync + 'static,
    {
        if self.timer.is_some() {
            return false;
        }

        let armed = Arc::new(AtomicBool::new(true));
        let task = runtime.spawn(run_timer(
            self.period,
            self.leeway,
            Arc::clone(&armed),
            on_tick,
        ));
        self.timer = Some(Timer { armed, task });

        log::info!("[scheduler] timer started (interval {:?})", self.period);
        true
    }

    /// Cancel the timer. Once this returns no further tick body runs, even
    /// for a fire that was already due.
    pub fn stop(&mut self) -> bool {
        match self.timer.take() {
            Some(timer) => {
                timer.armed.store(false, Ordering::SeqCst);
                timer.task.abort();
                log::info!("[scheduler] timer stopped");
                true
            }
            None => false,
        }
    }

    pub fn is_active(&self) -> bool {
        self.timer.is_some()
    }
}

impl Drop for PingScheduler {
    fn drop(&mut self) {
        self.stop();
    }
}

async fn run_timer<F>(period: Duration, leeway: Duration, armed: Arc<AtomicBool>, on_tick: F)
where
    F: Fn() + Send + Sync + 'static,
{
    let mut ticker = interval_at(Instant::now() + period, period);
    ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        let due = ticker.tick().await;
        if !armed.load(Ordering::SeqCst) {
            break;
        }

        let lateness = Instant::now().saturating_duration_since(due);
        if lateness > leeway {
            log::debug!(
                "[scheduler] tick fired {:?} late (leeway {:?})",
                lateness,
                leeway
            );
        }
        on_tick();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::AtomicUsize;
    use tokio::time::sleep;

    fn counting() -> (Arc<AtomicUsize>, impl Fn() + Send + Sync + 'static) {
        let count = Arc::new(AtomicUsize::new(0));
        let inner = Arc::clone(&count);
        (count, move || {
            inner.fetch_add(1, Ordering::SeqCst);
        })
    }

    #[tokio::test(start_paused = true)]
    async fn test_fires_once_per_period() {
        let (count, on_tick) = counting();
        let mut scheduler = PingScheduler::new(Duration::from_secs(30), Duration::from_secs(1));
        assert!(scheduler.start(&Handle::current(), on_tick));

        sleep(Duration::from_secs(29)).await;
        assert_eq!(count.load(Ordering::SeqCst), 0);

        sleep(Duration::from_secs(2)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);

        sleep(Duration::from_secs(30)).await;
        assert_eq!(count.load(Ordering::SeqCst), 2);
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_start_is_ignored() {
        let (count, on_tick) = counting();
        let (other, other_tick) = counting();
        let mut scheduler = PingScheduler::new(Duration::from_secs(30), Duration::from_secs(1));

        assert!(scheduler.start(&Handle::current(), on_tick));
        assert!(!scheduler.start(&Handle::current(), other_tick));

        sleep(Duration::from_secs(31)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert_eq!(other.load(Ordering::SeqCst), 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_no_ticks_after_stop() {
        let (count, on_tick) = counting();
        let mut scheduler = PingScheduler::new(Duration::from_secs(30), Duration::from_secs(1));
        scheduler.start(&Handle::current(), on_tick);

        sleep(Duration::from_secs(31)).await;
        assert!(scheduler.stop());
        assert!(!scheduler.is_active());

        sleep(Duration::from_secs(300)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
        assert!(!scheduler.stop());
    }

    #[tokio::test(start_paused = true)]
    async fn test_restart_after_stop() {
        let (count, on_tick) = counting();
        let on_tick = Arc::new(on_tick);
        let mut scheduler = PingScheduler::new(Duration::from_secs(10), Duration::ZERO);

        let first = Arc::clone(&on_tick);
        scheduler.start(&Handle::current(), move || first());
        scheduler.stop();

        let second = Arc::clone(&on_tick);
        assert!(scheduler.start(&Handle::current(), move || second()));
        sleep(Duration::from_secs(11)).await;
        assert_eq!(count.load(Ordering::SeqCst), 1);
    }
}
