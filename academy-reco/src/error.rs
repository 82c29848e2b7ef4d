//! Error types for the `academy-reco` crate.

use thiserror::Error;

/// Errors that can occur in recommendation operations.
///
/// Most of these never reach the caller of the engine: index and encoder
/// failures are absorbed per sub-query and logged. The variants that do
/// surface are request validation, timeouts, user store failures and
/// builder misconfiguration.
#[derive(Debug, Error)]
pub enum RecoError {
    /// An error occurred while encoding content into an embedding.
    #[error("Encoder error ({provider}): {message}")]
    EncoderError {
        /// The encoder that produced the error.
        provider: String,
        /// A description of the failure.
        message: String,
    },

    /// An error occurred in the vector index backend.
    #[error("Vector index error ({backend}): {message}")]
    IndexError {
        /// The vector index backend that produced the error.
        backend: String,
        /// A description of the failure.
        message: String,
    },

    /// A point payload did not match the content schema.
    #[error("Invalid payload: {0}")]
    InvalidPayload(String),

    /// The user state backend failed.
    #[error("User store error: {0}")]
    UserStoreError(String),

    /// A configuration validation error.
    #[error("Configuration error: {0}")]
    ConfigError(String),

    /// A request parameter is out of range.
    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// A request did not complete within the configured timeout.
    #[error("{operation} timed out after {timeout_ms} ms")]
    Timeout {
        /// The operation that timed out.
        operation: String,
        /// The configured timeout.
        timeout_ms: u64,
    },
}

impl RecoError {
    /// Shorthand for an [`RecoError::IndexError`].
    pub fn index(backend: impl Into<String>, message: impl Into<String>) -> Self {
        Self::IndexError { backend: backend.into(), message: message.into() }
    }

    /// Shorthand for an [`RecoError::EncoderError`].
    pub fn encoder(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::EncoderError { provider: provider.into(), message: message.into() }
    }
}

/// A convenience result type for recommendation operations.
pub type Result<T> = std::result::Result<T, RecoError>;
