use thiserror::Error;

/// Location sensing failures reported by the platform
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SensingError {
    #[error("Location access not authorized")]
    NotAuthorized,

    #[error("Location services unavailable: {0}")]
    Unavailable(String),

    #[error("Location update failed: {0}")]
    UpdateFailed(String),
}

/// Network/HTTP failures while reporting a position
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("Network timeout")]
    Timeout,

    #[error("HTTP error: {0}")]
    HttpStatus(u16),

    #[error("Request failed: {0}")]
    Request(String),

    #[error("Failed to read response: {0}")]
    Body(String),
}

/// Status response could not be interpreted
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    #[error("No JSON object found in response")]
    NoJsonSpan,

    #[error("Malformed JSON: {0}")]
    Malformed(String),
}

/// Audio cue could not be played
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum AudioError {
    #[error("Audio asset not found: {0}")]
    MissingAsset(String),

    #[error("Audio asset unreadable: {0}")]
    CorruptAsset(String),
}

/// Reason a single tick's status ping was abandoned
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PingError {
    #[error("transport: {0}")]
    Transport(#[from] TransportError),

    #[error("parse: {0}")]
    Parse(#[from] ParseError),
}

/// Engine construction and control errors
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    #[error("Failed to load config: {0}")]
    ConfigLoad(String),

    #[error("Unknown control command: {0}")]
    UnknownCommand(String),
}

/// Result type for engine configuration and control
pub type EngineResult<T> = Result<T, EngineError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let errors: Vec<String> = vec![
            SensingError::NotAuthorized.to_string(),
            SensingError::UpdateFailed("kCLErrorLocationUnknown".to_string()).to_string(),
            TransportError::HttpStatus(503).to_string(),
            ParseError::NoJsonSpan.to_string(),
            AudioError::MissingAsset("danger_150m".to_string()).to_string(),
            EngineError::UnknownCommand("pauseService".to_string()).to_string(),
        ];

        for display in errors {
            assert!(!display.is_empty());
        }
    }

    #[test]
    fn test_ping_error_wraps_sources() {
        let err: PingError = TransportError::HttpStatus(404).into();
        assert_eq!(err.to_string(), "transport: HTTP error: 404");

        let err: PingError = ParseError::NoJsonSpan.into();
        assert!(matches!(err, PingError::Parse(ParseError::NoJsonSpan)));
    }
}
