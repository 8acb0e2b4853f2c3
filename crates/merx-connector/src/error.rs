//! Connector error types.
//!
//! Error definitions with transient/permanent classification for retry logic.

use thiserror::Error;

/// Error that can occur while talking to an external commerce platform.
#[derive(Debug, Error)]
pub enum ConnectorError {
    // Connection errors (usually transient)
    /// Network error during communication.
    #[error("network error: {message}")]
    Network {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// Platform is temporarily unavailable.
    #[error("platform unavailable: {message}")]
    PlatformUnavailable { message: String },

    /// Request was rate limited by the platform.
    #[error("rate limited: {message}")]
    RateLimited { message: String },

    // Permanent errors
    /// Invalid credentials for the platform.
    #[error("authentication failed: invalid credentials")]
    AuthenticationFailed,

    /// Platform returned data that cannot be interpreted.
    #[error("invalid data: {message}")]
    InvalidData { message: String },

    /// The requested operation is not supported by this platform.
    #[error("unsupported operation for source '{src}': {operation}")]
    Unsupported { src: String, operation: String },

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl ConnectorError {
    /// Create a network error.
    pub fn network(message: impl Into<String>) -> Self {
        ConnectorError::Network {
            message: message.into(),
            source: None,
        }
    }

    /// Create a network error with an underlying source.
    pub fn network_with_source(
        message: impl Into<String>,
        source: impl std::error::Error + Send + Sync + 'static,
    ) -> Self {
        ConnectorError::Network {
            message: message.into(),
            source: Some(Box::new(source)),
        }
    }

    /// Create a platform unavailable error.
    pub fn unavailable(message: impl Into<String>) -> Self {
        ConnectorError::PlatformUnavailable {
            message: message.into(),
        }
    }

    /// Create a rate limited error.
    pub fn rate_limited(message: impl Into<String>) -> Self {
        ConnectorError::RateLimited {
            message: message.into(),
        }
    }

    /// Create an invalid data error.
    pub fn invalid_data(message: impl Into<String>) -> Self {
        ConnectorError::InvalidData {
            message: message.into(),
        }
    }

    /// Create an unsupported operation error.
    pub fn unsupported(source: impl Into<String>, operation: impl Into<String>) -> Self {
        ConnectorError::Unsupported {
            src: source.into(),
            operation: operation.into(),
        }
    }

    /// Check if this error is transient and the operation may be retried.
    #[must_use]
    pub fn is_transient(&self) -> bool {
        matches!(
            self,
            ConnectorError::Network { .. }
                | ConnectorError::PlatformUnavailable { .. }
                | ConnectorError::RateLimited { .. }
        )
    }

    /// Get an error code for classification.
    #[must_use]
    pub fn error_code(&self) -> &'static str {
        match self {
            ConnectorError::Network { .. } => "NETWORK_ERROR",
            ConnectorError::PlatformUnavailable { .. } => "PLATFORM_UNAVAILABLE",
            ConnectorError::RateLimited { .. } => "RATE_LIMITED",
            ConnectorError::AuthenticationFailed => "AUTH_FAILED",
            ConnectorError::InvalidData { .. } => "INVALID_DATA",
            ConnectorError::Unsupported { .. } => "UNSUPPORTED",
            ConnectorError::Serialization(_) => "SERIALIZATION_ERROR",
        }
    }
}

/// Result type for connector operations.
pub type ConnectorResult<T> = Result<T, ConnectorError>;
