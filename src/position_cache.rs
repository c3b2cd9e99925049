use crate::types::PositionSample;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Mutex, MutexGuard, PoisonError};

/// Lock-guarded cell holding the newest position sample.
///
/// Written by the location pump, read once per tick. Samples are replaced
/// wholesale, never edited in place.
#[derive(Debug, Default)]
pub struct PositionCache {
    slot: Mutex<Option<PositionSample>>,
}

impl PositionCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the cached sample (last write wins)
    pub fn store(&self, sample: PositionSample) {
        *self.lock() = Some(sample);
    }

    /// Store only while `gate` is still set.
    ///
    /// The gate is read under the cache lock, so a writer racing with
    /// `clear()` after the gate drops can never resurrect a sample.
    pub fn store_if(&self, sample: PositionSample, gate: &AtomicBool) -> bool {
        let mut slot = self.lock();
        if !gate.load(Ordering::SeqCst) {
            return false;
        }
        *slot = Some(sample);
        true
    }

    /// Snapshot of the newest sample, if any
    pub fn latest(&self) -> Option<PositionSample> {
        self.lock().clone()
    }

    pub fn clear(&self) {
        self.lock().take();
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_none()
    }

    fn lock(&self) -> MutexGuard<'_, Option<PositionSample>> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::thread;

    #[test]
    fn test_last_write_wins() {
        let cache = PositionCache::new();
        assert!(cache.is_empty());

        cache.store(PositionSample::now(36.0, 127.0));
        cache.store(PositionSample::now(36.5, 127.5));

        let latest = cache.latest().unwrap();
        assert_eq!(latest.latitude, 36.5);
        assert_eq!(latest.longitude, 127.5);
    }

    #[test]
    fn test_clear_empties_cache() {
        let cache = PositionCache::new();
        cache.store(PositionSample::now(1.0, 2.0));
        cache.clear();
        assert!(cache.latest().is_none());
    }

    #[test]
    fn test_closed_gate_rejects_store() {
        let cache = PositionCache::new();
        let gate = AtomicBool::new(false);

        assert!(!cache.store_if(PositionSample::now(1.0, 2.0), &gate));
        assert!(cache.is_empty());

        gate.store(true, Ordering::SeqCst);
        assert!(cache.store_if(PositionSample::now(1.0, 2.0), &gate));
        assert!(!cache.is_empty());
    }

    #[test]
    fn test_concurrent_writers_never_tear() {
        let cache = Arc::new(PositionCache::new());

        let writers: Vec<_> = (0..4)
            .map(|i| {
                let cache = Arc::clone(&cache);
                thread::spawn(move || {
                    for j in 0..500 {
                        let v = (i * 1000 + j) as f64;
                        cache.store(PositionSample::now(v, v));
                    }
                })
            })
            .collect();

        for _ in 0..500 {
            if let Some(sample) = cache.latest() {
                assert_eq!(sample.latitude, sample.longitude);
            }
        }

        for writer in writers {
            writer.join().unwrap();
        }
    }
}
