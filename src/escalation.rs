use crate::audio::{AudioNotifier, Cue};
use crate::classifier::{bucket, classify, AnnouncementBucket, DangerLevel};
use crate::types::PingResult;
use serde::Serialize;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// What was last announced
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct EscalationState {
    pub last_level: Option<DangerLevel>,
    pub last_bucket: Option<AnnouncementBucket>,
}

/// One announcement decision
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Announcement {
    pub distance: u32,
    pub level: DangerLevel,
    pub bucket: AnnouncementBucket,
    pub cue: Cue,
    /// Whether the audio capability accepted the cue
    pub played: bool,
}

/// Turns classified ping results into audio cues.
///
/// Every tick with a distance replays its bucket's cue, including the safe
/// area cue; repeats are not suppressed. `last_bucket` is recorded but not
/// consulted.
pub struct EscalationController {
    state: Mutex<EscalationState>,
    notifier: Arc<AudioNotifier>,
}

impl EscalationController {
    pub fn new(notifier: Arc<AudioNotifier>) -> Self {
        Self {
            state: Mutex::new(EscalationState::default()),
            notifier,
        }
    }

    /// Announce `ping` if `is_current()` still holds.
    ///
    /// The predicate is evaluated under the state lock, so once it turns
    /// false and `reset()` has run, a stale response can neither play audio
    /// nor touch the state.
    pub fn escalate<F>(&self, ping: &PingResult, is_current: F) -> Option<Announcement>
    where
        F: Fn() -> bool,
    {
        let mut state = self.lock();
        if !is_current() {
            log::debug!("[escalation] result from a stopped session, dropping {:?}", ping);
            return None;
        }

        let Some(distance) = ping.distance else {
            log::debug!("[escalation] no distance in response, nothing to announce");
            return None;
        };

        let level = classify(Some(distance));
        let bucket = bucket(Some(distance));
        let cue = bucket.cue();
        log::info!(
            "[escalation] distance={}m level={} bucket={} -> {}",
            distance,
            level,
            bucket,
            cue
        );

        let played = self.notifier.play(cue).is_ok();
        state.last_level = Some(level);
        state.last_bucket = Some(bucket);

        Some(Announcement {
            distance,
            level,
            bucket,
            cue,
            played,
        })
    }

    pub fn reset(&self) {
        *self.lock() = EscalationState::default();
    }

    pub fn state(&self) -> EscalationState {
        *self.lock()
    }

    fn lock(&self) -> MutexGuard<'_, EscalationState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}
