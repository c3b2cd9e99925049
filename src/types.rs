use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Most recent device position, as delivered by the location capability
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    pub captured_at: DateTime<Utc>,
}

impl PositionSample {
    pub fn new(latitude: f64, longitude: f64, captured_at: DateTime<Utc>) -> Self {
        Self {
            latitude,
            longitude,
            captured_at,
        }
    }

    /// Sample stamped with the current wall-clock time
    pub fn now(latitude: f64, longitude: f64) -> Self {
        Self::new(latitude, longitude, Utc::now())
    }
}

/// Fields of interest extracted from one status response.
///
/// `distance` is `None` when the server sent no usable distance (the
/// "-1" case); the `within*` counts default to 0.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PingResult {
    pub distance: Option<u32>,
    pub within150: u32,
    pub within200: u32,
    pub within500: u32,
}

impl PingResult {
    /// Distance in meters, or -1 when absent
    pub fn distance_or_sentinel(&self) -> i64 {
        self.distance.map(i64::from).unwrap_or(-1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sentinel_distance() {
        let absent = PingResult::default();
        assert_eq!(absent.distance_or_sentinel(), -1);

        let present = PingResult {
            distance: Some(120),
            ..PingResult::default()
        };
        assert_eq!(present.distance_or_sentinel(), 120);
    }

    #[test]
    fn test_sample_json_roundtrip_keeps_timestamp() {
        let sample = PositionSample::now(36.0, 127.0);
        let json = serde_json::to_string(&sample).unwrap();
        let back: PositionSample = serde_json::from_str(&json).unwrap();
        assert_eq!(back, sample);
    }
}
