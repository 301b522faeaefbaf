//! Error types for record forwarding.
//!
//! None of these errors stop the relay. Forward failures are logged with
//! their category and the record is dropped; pool lifecycle errors are
//! reported to the caller that owns the pool.

use std::{fmt, time::Duration};

use thiserror::Error;
use txrelay_core::RecordError;

/// Result type alias for forwarding operations.
pub type Result<T> = std::result::Result<T, ForwardError>;

/// Errors that can occur while forwarding a record.
#[derive(Debug, Clone, Error)]
pub enum ForwardError {
    /// Connection to the destination failed.
    #[error("network connection failed: {message}")]
    NetworkError {
        /// Error message describing the network failure
        message: String,
    },

    /// Outbound request exceeded the configured timeout.
    #[error("request timeout after {timeout_seconds}s")]
    Timeout {
        /// Number of seconds before the request timed out
        timeout_seconds: u64,
    },

    /// Record could not be encoded for the request body.
    #[error("failed to serialize record: {message}")]
    SerializationError {
        /// Serializer error message
        message: String,
    },

    /// Client could not be built from its configuration.
    #[error("invalid forwarder configuration: {message}")]
    ConfigurationError {
        /// Configuration error message
        message: String,
    },

    /// Forward queue no longer accepts records.
    #[error("forward queue closed")]
    QueueClosed,

    /// Workers did not finish draining within the shutdown timeout.
    #[error("forward workers did not stop within {timeout:?}")]
    ShutdownTimeout {
        /// Time allowed for the drain
        timeout: Duration,
    },

    /// A worker task panicked.
    #[error("forward worker {worker_id} panicked: {error}")]
    WorkerPanic {
        /// Index of the worker that panicked
        worker_id: usize,
        /// Join error message
        error: String,
    },
}

impl ForwardError {
    /// Creates a network error from a message.
    pub fn network(message: impl Into<String>) -> Self {
        Self::NetworkError { message: message.into() }
    }

    /// Creates a timeout error.
    pub fn timeout(timeout_seconds: u64) -> Self {
        Self::Timeout { timeout_seconds }
    }

    /// Creates a serialization error.
    pub fn serialization(message: impl Into<String>) -> Self {
        Self::SerializationError { message: message.into() }
    }

    /// Creates a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::ConfigurationError { message: message.into() }
    }

    /// Returns the category used in log fields.
    pub fn category(&self) -> ErrorCategory {
        ErrorCategory::from(self)
    }
}

impl From<RecordError> for ForwardError {
    fn from(err: RecordError) -> Self {
        Self::serialization(err.to_string())
    }
}

/// Category of forward error for logging.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    /// Connectivity or timeout.
    Network,
    /// Request body encoding.
    Encoding,
    /// Client configuration.
    Configuration,
    /// Pool lifecycle.
    Lifecycle,
}

impl From<&ForwardError> for ErrorCategory {
    fn from(error: &ForwardError) -> Self {
        match error {
            ForwardError::NetworkError { .. } | ForwardError::Timeout { .. } => Self::Network,
            ForwardError::SerializationError { .. } => Self::Encoding,
            ForwardError::ConfigurationError { .. } => Self::Configuration,
            ForwardError::QueueClosed
            | ForwardError::ShutdownTimeout { .. }
            | ForwardError::WorkerPanic { .. } => Self::Lifecycle,
        }
    }
}

impl fmt::Display for ErrorCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Network => write!(f, "network"),
            Self::Encoding => write!(f, "encoding"),
            Self::Configuration => write!(f, "configuration"),
            Self::Lifecycle => write!(f, "lifecycle"),
        }
    }
}
