//! Error types for the Paasport harness

use thiserror::Error;

/// Result type alias using the harness Error
pub type Result<T> = std::result::Result<T, Error>;

/// Harness error types
///
/// `Prerequisite`, `Spawn`, `StartupTimeout` and `EarlyExit` are fatal to a
/// run. Probe and phase failures are not errors at all: they are recorded as
/// data in [`crate::types::ProbeOutcome`] and [`crate::types::PhaseResult`].
#[derive(Error, Debug)]
pub enum Error {
    #[error("Prerequisite check failed: {0}")]
    Prerequisite(String),

    #[error("Failed to spawn {service}: {message}")]
    Spawn { service: String, message: String },

    #[error("{service} did not signal readiness within {seconds}s")]
    StartupTimeout { service: String, seconds: u64 },

    #[error("{service} exited before signaling readiness")]
    EarlyExit { service: String },

    #[error("Timed out after {seconds}s waiting for {target}")]
    ReadinessTimeout { target: String, seconds: u64 },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Whether this error aborts the remaining run
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            Error::Prerequisite(_)
                | Error::Spawn { .. }
                | Error::StartupTimeout { .. }
                | Error::EarlyExit { .. }
        )
    }
}
