use crate::audio::Cue;
use crate::escalation::EscalationState;
use crate::location::AuthorizationStatus;
use crate::types::PositionSample;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};

/// Running totals shared by the location pump and the tick pipeline
#[derive(Debug, Default)]
pub struct EngineCounters {
    samples_received: AtomicU64,
    sensing_errors: AtomicU64,
    ticks_fired: AtomicU64,
    empty_ticks: AtomicU64,
    pings_ok: AtomicU64,
    pings_failed: AtomicU64,
    late_responses: AtomicU64,
    cues_played: AtomicU64,
    cue_failures: AtomicU64,
}

impl EngineCounters {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sample_received(&self) {
        self.samples_received.fetch_add(1, Ordering::Relaxed);
    }

    pub fn sensing_error(&self) {
        self.sensing_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub fn tick_fired(&self) {
        self.ticks_fired.fetch_add(1, Ordering::Relaxed);
    }

    pub fn empty_tick(&self) {
        self.empty_ticks.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ping_ok(&self) {
        self.pings_ok.fetch_add(1, Ordering::Relaxed);
    }

    pub fn ping_failed(&self) {
        self.pings_failed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn late_response(&self) {
        self.late_responses.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cue_played(&self) {
        self.cues_played.fetch_add(1, Ordering::Relaxed);
    }

    pub fn cue_failed(&self) {
        self.cue_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn snapshot(&self) -> CounterSnapshot {
        CounterSnapshot {
            samples_received: self.samples_received.load(Ordering::Relaxed),
            sensing_errors: self.sensing_errors.load(Ordering::Relaxed),
            ticks_fired: self.ticks_fired.load(Ordering::Relaxed),
            empty_ticks: self.empty_ticks.load(Ordering::Relaxed),
            pings_ok: self.pings_ok.load(Ordering::Relaxed),
            pings_failed: self.pings_failed.load(Ordering::Relaxed),
            late_responses: self.late_responses.load(Ordering::Relaxed),
            cues_played: self.cues_played.load(Ordering::Relaxed),
            cue_failures: self.cue_failures.load(Ordering::Relaxed),
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct CounterSnapshot {
    pub samples_received: u64,
    pub sensing_errors: u64,
    pub ticks_fired: u64,
    pub empty_ticks: u64,
    pub pings_ok: u64,
    pub pings_failed: u64,
    pub late_responses: u64,
    pub cues_played: u64,
    pub cue_failures: u64,
}

/// Point-in-time view of the engine, for logging and the shell
#[derive(Debug, Clone, Serialize)]
pub struct EngineStatus {
    pub running: bool,
    pub timer_active: bool,
    pub sensing_active: bool,
    pub authorization: AuthorizationStatus,
    pub last_sample: Option<PositionSample>,
    pub escalation: EscalationState,
    pub current_cue: Option<Cue>,
    pub counters: CounterSnapshot,
}

impl EngineStatus {
    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::classifier::{AnnouncementBucket, DangerLevel};

    #[test]
    fn test_counters_accumulate() {
        let counters = EngineCounters::new();
        counters.tick_fired();
        counters.tick_fired();
        counters.empty_tick();
        counters.ping_failed();

        let snap = counters.snapshot();
        assert_eq!(snap.ticks_fired, 2);
        assert_eq!(snap.empty_ticks, 1);
        assert_eq!(snap.pings_failed, 1);
        assert_eq!(snap.pings_ok, 0);
    }

    #[test]
    fn test_status_json_uses_wire_names() {
        let status = EngineStatus {
            running: true,
            timer_active: true,
            sensing_active: true,
            authorization: AuthorizationStatus::AuthorizedAlways,
            last_sample: Some(PositionSample::now(36.0, 127.0)),
            escalation: EscalationState {
                last_level: Some(DangerLevel::Alert),
                last_bucket: Some(AnnouncementBucket::Le150),
            },
            current_cue: Some(Cue::Danger150m),
            counters: CounterSnapshot::default(),
        };

        let json = status.to_json().unwrap();
        assert!(json.contains("\"ALERT\""));
        assert!(json.contains("\"LE150\""));
        assert!(json.contains("danger_150m"));
        assert!(json.contains("authorized_always"));
    }
}
