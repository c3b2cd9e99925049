//! Background proximity alerts.
//!
//! Keeps a device's latest position fresh from the platform location
//! capability, reports it to a remote status endpoint on a fixed cadence and
//! plays an audio cue matching the distance band the endpoint answers with.
//!
//! [`engine::ProximityEngine`] owns the whole lifecycle. Platform capabilities
//! come in through three traits: [`location::LocationProvider`],
//! [`status_client::StatusEndpoint`] and [`audio::AudioOutput`].

pub mod audio;
pub mod classifier;
pub mod config;
pub mod engine;
pub mod error;
pub mod escalation;
pub mod location;
pub mod position_cache;
pub mod scheduler;
pub mod status;
pub mod status_client;
pub mod types;

pub use config::EngineConfig;
pub use engine::{ControlCommand, ProximityEngine};
pub use error::{EngineError, EngineResult};
pub use types::{PingResult, PositionSample};
