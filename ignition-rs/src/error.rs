//! # Error Types
//!
//! Errors raised while wiring the integration or delivering reports.
//! Matching and recording never produce errors; see `solutions` and
//! `recorders` for how their failures are absorbed.

/// A type alias for Result with the error type defaulting to [`IgnitionError`]
pub type Result<T, E = IgnitionError> = std::result::Result<T, E>;

/// Errors produced by configuration, wiring and report submission
#[derive(Debug, thiserror::Error)]
pub enum IgnitionError {
    /// A configuration value is out of range or inconsistent
    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    /// The configured report level is not a known log level
    #[error("Invalid log level `{0}`, expected one of debug, info, notice, warning, error, critical, alert, emergency")]
    InvalidLogLevel(String),

    /// A solution provider identifier in the configuration has no implementation
    #[error("Unknown solution provider: {0}")]
    UnknownSolutionProvider(String),

    /// A recorder name in the configuration has no implementation
    #[error("Unknown recorder: {0}")]
    UnknownRecorder(String),

    /// The configuration sources could not be read or deserialized
    #[error("Failed to load configuration: {0}")]
    Config(#[from] config::ConfigError),

    /// The report could not reach the collection service
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// The collection service answered with a non-success status
    #[error("Report submission failed: HTTP {status} - {body}")]
    Rejected { status: u16, body: String },

    /// A report could not be serialized
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// The global tracing subscriber could not be installed
    #[error("Failed to initialize logging: {0}")]
    Logging(String),
}

impl IgnitionError {
    /// Returns true if retrying the same submission later might succeed
    pub fn is_transient(&self) -> bool {
        match self {
            IgnitionError::Http(err) => {
                err.is_timeout() || err.is_connect() || err.status().map_or(false, |s| s.is_server_error())
            }
            IgnitionError::Rejected { status, .. } => *status >= 500 || *status == 429,
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = IgnitionError::UnknownSolutionProvider("missing_everything".to_string());
        assert_eq!(err.to_string(), "Unknown solution provider: missing_everything");

        let err = IgnitionError::Rejected { status: 422, body: "invalid".to_string() };
        assert_eq!(err.to_string(), "Report submission failed: HTTP 422 - invalid");
    }

    #[test]
    fn test_transient_classification() {
        assert!(IgnitionError::Rejected { status: 503, body: String::new() }.is_transient());
        assert!(IgnitionError::Rejected { status: 429, body: String::new() }.is_transient());
        assert!(!IgnitionError::Rejected { status: 401, body: String::new() }.is_transient());
        assert!(!IgnitionError::InvalidLogLevel("loud".to_string()).is_transient());
    }
}
