//! Sync engine error types.

use merx_connector::ConnectorError;
use thiserror::Error;

/// Errors that can occur while running a sync job.
#[derive(Debug, Error)]
pub enum SyncError {
    /// The job itself is malformed (e.g. webhook mode without webhook
    /// data). Fails the job before any side effect.
    #[error("invalid sync job: {message}")]
    Validation { message: String },

    /// Another job holds the bulk sync lock for this tenant and source.
    #[error("sync already running for {key}")]
    Locked { key: String },

    /// Catalog repository failure.
    #[error("repository error: {message}")]
    Repository { message: String },

    /// Idempotency, lock, or config store failure.
    #[error("store error: {message}")]
    Store { message: String },

    /// Failure while talking to the external platform.
    #[error("connector error: {0}")]
    Connector(#[from] ConnectorError),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Internal error.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl SyncError {
    /// Create a validation error.
    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation {
            message: message.into(),
        }
    }

    /// Create a lock contention error.
    pub fn locked(key: impl Into<String>) -> Self {
        Self::Locked { key: key.into() }
    }

    /// Create a repository error.
    pub fn repository(message: impl Into<String>) -> Self {
        Self::Repository {
            message: message.into(),
        }
    }

    /// Create a store error.
    pub fn store(message: impl Into<String>) -> Self {
        Self::Store {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Whether a later pass may reasonably re-attempt the failed work.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            SyncError::Locked { .. }
            | SyncError::Repository { .. }
            | SyncError::Store { .. } => true,
            SyncError::Connector(e) => e.is_transient(),
            SyncError::Validation { .. }
            | SyncError::Serialization(_)
            | SyncError::Internal { .. } => false,
        }
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            SyncError::Validation { .. } => "VALIDATION_ERROR",
            SyncError::Locked { .. } => "SYNC_LOCKED",
            SyncError::Repository { .. } => "REPOSITORY_ERROR",
            SyncError::Store { .. } => "STORE_ERROR",
            SyncError::Connector(e) => e.error_code(),
            SyncError::Serialization(_) => "SERIALIZATION_ERROR",
            SyncError::Internal { .. } => "INTERNAL_ERROR",
        }
    }
}

/// Result type for sync operations.
pub type SyncResult<T> = Result<T, SyncError>;
