use crate::error::{EngineError, EngineResult};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Poll period for status pings
pub const DEFAULT_PING_INTERVAL_SECS: u64 = 30;
/// Firing tolerance granted to the ping timer
pub const DEFAULT_PING_LEEWAY_SECS: u64 = 1;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 10;
/// Minimum displacement before the platform reports a new position
pub const DEFAULT_DISTANCE_FILTER_M: f64 = 20.0;

/// Requested positional accuracy, from most precise to most power-efficient
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AccuracyTier {
    Best,
    NearestTenMeters,
    HundredMeters,
    Kilometer,
    ThreeKilometers,
}

impl AccuracyTier {
    /// Nominal accuracy in meters (0 for best available)
    pub fn meters(self) -> f64 {
        match self {
            AccuracyTier::Best => 0.0,
            AccuracyTier::NearestTenMeters => 10.0,
            AccuracyTier::HundredMeters => 100.0,
            AccuracyTier::Kilometer => 1_000.0,
            AccuracyTier::ThreeKilometers => 3_000.0,
        }
    }
}

/// How the location capability should be asked to sense
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MonitoringConfig {
    pub accuracy: AccuracyTier,
    pub distance_filter_m: f64,
    /// Low-power "significant change" mode instead of continuous updates
    pub significant_changes_only: bool,
    pub allows_background_updates: bool,
    /// Let the platform pause updates while the device is stationary
    pub pauses_automatically: bool,
}

impl Default for MonitoringConfig {
    fn default() -> Self {
        Self {
            accuracy: AccuracyTier::HundredMeters,
            distance_filter_m: DEFAULT_DISTANCE_FILTER_M,
            significant_changes_only: true,
            allows_background_updates: true,
            pauses_automatically: true,
        }
    }
}

/// Engine configuration.
///
/// Durations are written as whole or fractional seconds in JSON:
///
/// ```json
/// {
///   "endpoint_url": "https://example.com/civil_safety_ping.php",
///   "device_id": "device-1234",
///   "ping_interval_secs": 30,
///   "monitoring": { "accuracy": "hundred_meters", "distance_filter_m": 20.0 }
/// }
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub endpoint_url: String,
    pub device_id: String,
    #[serde(rename = "ping_interval_secs", with = "duration_secs")]
    pub ping_interval: Duration,
    #[serde(rename = "ping_leeway_secs", with = "duration_secs")]
    pub ping_leeway: Duration,
    #[serde(rename = "request_timeout_secs", with = "duration_secs")]
    pub request_timeout: Duration,
    pub monitoring: MonitoringConfig,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            endpoint_url: String::new(),
            device_id: String::new(),
            ping_interval: Duration::from_secs(DEFAULT_PING_INTERVAL_SECS),
            ping_leeway: Duration::from_secs(DEFAULT_PING_LEEWAY_SECS),
            request_timeout: Duration::from_secs(DEFAULT_REQUEST_TIMEOUT_SECS),
            monitoring: MonitoringConfig::default(),
        }
    }
}

impl EngineConfig {
    pub fn new(endpoint_url: impl Into<String>, device_id: impl Into<String>) -> Self {
        Self {
            endpoint_url: endpoint_url.into(),
            device_id: device_id.into(),
            ..Self::default()
        }
    }

    /// Load a JSON config file; missing keys keep their defaults
    pub fn from_json_file(path: impl AsRef<Path>) -> EngineResult<Self> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path)
            .map_err(|e| EngineError::ConfigLoad(format!("{}: {}", path.display(), e)))?;
        Self::from_json_str(&json)
    }

    pub fn from_json_str(json: &str) -> EngineResult<Self> {
        serde_json::from_str(json).map_err(|e| EngineError::ConfigLoad(e.to_string()))
    }

    pub fn validate(&self) -> EngineResult<()> {
        if self.endpoint_url.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "endpoint_url must not be empty".to_string(),
            ));
        }
        if self.device_id.trim().is_empty() {
            return Err(EngineError::InvalidConfig(
                "device_id must not be empty".to_string(),
            ));
        }
        if self.ping_interval.is_zero() {
            return Err(EngineError::InvalidConfig(
                "ping interval must be greater than zero".to_string(),
            ));
        }
        let filter = self.monitoring.distance_filter_m;
        if !filter.is_finite() || filter < 0.0 {
            return Err(EngineError::InvalidConfig(format!(
                "distance filter must be a non-negative number of meters, got {}",
                filter
            )));
        }
        Ok(())
    }
}

mod duration_secs {
    use serde::{Deserialize, Deserializer, Serializer};
    use std::time::Duration;

    pub fn serialize<S: Serializer>(value: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_f64(value.as_secs_f64())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        let secs = f64::deserialize(deserializer)?;
        Duration::try_from_secs_f64(secs).map_err(serde::de::Error::custom)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_match_low_power_profile() {
        let config = EngineConfig::default();
        assert_eq!(config.ping_interval, Duration::from_secs(30));
        assert_eq!(config.ping_leeway, Duration::from_secs(1));
        assert_eq!(config.monitoring.accuracy, AccuracyTier::HundredMeters);
        assert_eq!(config.monitoring.distance_filter_m, 20.0);
        assert!(config.monitoring.significant_changes_only);
    }

    #[test]
    fn test_partial_json_keeps_defaults() {
        let config = EngineConfig::from_json_str(
            r#"{"endpoint_url": "http://localhost/ping", "device_id": "abc", "ping_interval_secs": 5}"#,
        )
        .unwrap();

        assert_eq!(config.endpoint_url, "http://localhost/ping");
        assert_eq!(config.ping_interval, Duration::from_secs(5));
        assert_eq!(config.request_timeout, Duration::from_secs(10));
        assert_eq!(config.monitoring, MonitoringConfig::default());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_accuracy_tiers_coarsen_in_order() {
        let tiers = [
            AccuracyTier::Best,
            AccuracyTier::NearestTenMeters,
            AccuracyTier::HundredMeters,
            AccuracyTier::Kilometer,
            AccuracyTier::ThreeKilometers,
        ];
        for pair in tiers.windows(2) {
            assert!(pair[0].meters() < pair[1].meters(), "{:?} vs {:?}", pair[0], pair[1]);
        }
    }

    #[test]
    fn test_monitoring_section_parses() {
        let config = EngineConfig::from_json_str(
            r#"{"monitoring": {"accuracy": "nearest_ten_meters", "distance_filter_m": 5.5}}"#,
        )
        .unwrap();
        assert_eq!(config.monitoring.accuracy, AccuracyTier::NearestTenMeters);
        assert_eq!(config.monitoring.accuracy.meters(), 10.0);
        assert_eq!(config.monitoring.distance_filter_m, 5.5);
        assert!(config.monitoring.allows_background_updates);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        assert!(EngineConfig::default().validate().is_err());

        let mut config = EngineConfig::new("http://localhost/ping", "abc");
        assert!(config.validate().is_ok());

        config.ping_interval = Duration::ZERO;
        assert!(matches!(config.validate(), Err(EngineError::InvalidConfig(_))));

        let mut config = EngineConfig::new("http://localhost/ping", "abc");
        config.monitoring.distance_filter_m = f64::NAN;
        assert!(config.validate().is_err());

        let config = EngineConfig::new("http://localhost/ping", "  ");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_negative_duration_rejected() {
        let result = EngineConfig::from_json_str(r#"{"ping_interval_secs": -3}"#);
        assert!(matches!(result, Err(EngineError::ConfigLoad(_))));
    }

    #[test]
    fn test_missing_file_is_load_error() {
        let result = EngineConfig::from_json_file("/nonexistent/proximity_alert.json");
        assert!(matches!(result, Err(EngineError::ConfigLoad(_))));
    }
}
