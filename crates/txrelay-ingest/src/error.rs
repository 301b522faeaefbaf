//! Error types for record ingestion.

use std::{io, path::PathBuf};

use thiserror::Error;

/// Result type for ingestion operations.
pub type Result<T> = std::result::Result<T, IngestError>;

/// Ingestion failures. Per-record problems are not errors here; they are
/// logged and counted by the dispatcher.
#[derive(Debug, Error)]
pub enum IngestError {
    /// Input could not be opened or read.
    #[error("failed to read {}: {source}", path.display())]
    Io {
        /// Input that failed
        path: PathBuf,
        /// Underlying I/O error
        #[source]
        source: io::Error,
    },
}

impl IngestError {
    /// Creates an I/O error for the given input path.
    pub fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Self::Io { path: path.into(), source }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_error_names_the_path() {
        let err = IngestError::io(
            "missing.json",
            io::Error::new(io::ErrorKind::NotFound, "No such file or directory"),
        );

        assert_eq!(err.to_string(), "failed to read missing.json: No such file or directory");
        assert!(std::error::Error::source(&err).is_some());
    }
}
