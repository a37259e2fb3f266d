//! Error types for the load-test harness
//!
//! Two classes of failure exist at the run level: configuration errors, which
//! surface before any request is dispatched, and dispatch errors, which
//! indicate a defect in the dispatcher itself. Per-request failures never
//! appear here; they are recorded as [`Outcome`](crate::core::Outcome) values
//! and reported through the run summary.

use thiserror::Error;

/// Result type for configuration loading and validation
pub type ConfigResult<T> = Result<T, ConfigError>;

/// Configuration errors, raised before any unit of work is scheduled
#[derive(Error, Debug)]
pub enum ConfigError {
    /// A provided value is out of range or inconsistent with the run mode
    #[error("Invalid configuration: {0}")]
    Invalid(String),

    /// A required setting is absent from CLI, YAML, and environment
    #[error("Missing required configuration: {0}")]
    Missing(String),

    /// Audio input file could not be used as-is
    #[error("Invalid audio input: {0}")]
    InvalidAudio(String),

    /// Configuration file could not be read
    #[error("Failed to read configuration file {path}: {error}")]
    Io { path: String, error: String },

    /// Configuration file could not be parsed
    #[error("Failed to parse configuration file {path}: {error}")]
    Parse { path: String, error: String },

    /// Google Cloud credentials could not be resolved
    #[error("Google Cloud credentials error: {0}")]
    Credentials(String),

    /// Remote endpoint could not be reached during setup
    #[error("Failed to connect to {endpoint}: {error}")]
    Connection { endpoint: String, error: String },
}

impl ConfigError {
    /// Create an invalid-configuration error
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::Invalid(message.into())
    }

    /// Create a connection error for an endpoint
    pub fn connection(endpoint: impl Into<String>, error: impl std::fmt::Display) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            error: error.to_string(),
        }
    }
}

/// Run-level dispatcher defects
///
/// Any of these aborts the run with an error exit status. They are invariant
/// violations, not load-test results: a correct dispatcher never produces
/// them no matter how the remote service behaves.
#[derive(Error, Debug)]
pub enum DispatchError {
    /// An outcome was recorded twice for the same request index
    #[error("Duplicate outcome recorded for request #{index}")]
    DuplicateOutcome { index: usize },

    /// A request index reached run completion without a recorded outcome
    #[error("Missing outcome for request #{index}")]
    MissingOutcome { index: usize },

    /// A spawned unit of work panicked or was aborted by the runtime
    #[error("Dispatcher task failed: {0}")]
    Join(String),
}
