//! Storage error types

use thiserror::Error;

/// Step of the health probe that failed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProbeStep {
    Write,
    Read,
    Delete,
}

impl std::fmt::Display for ProbeStep {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ProbeStep::Write => f.write_str("write"),
            ProbeStep::Read => f.write_str("read"),
            ProbeStep::Delete => f.write_str("delete"),
        }
    }
}

#[derive(Error, Debug)]
pub enum HealthCheckError {
    #[error("probe {step} failed: {source}")]
    Step {
        step: ProbeStep,
        #[source]
        source: Box<StorageError>,
    },

    /// The backend accepted the write but the probe could not be read back.
    #[error("probe object {location} was not readable after write")]
    Inconsistent { location: String },
}

#[derive(Error, Debug)]
pub enum StorageError {
    #[error("IO error during {op} on {path}: {source}")]
    Io {
        op: &'static str,
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Remote storage error during {op} on {key}: {source}")]
    Remote {
        op: &'static str,
        key: String,
        #[source]
        source: object_store::Error,
    },

    #[error("Unsupported storage backend: {0}")]
    UnsupportedBackend(String),

    #[error("Health check failed: {0}")]
    HealthCheck(#[from] HealthCheckError),

    #[error("{op} cancelled")]
    Cancelled { op: &'static str },

    #[error("{op} exceeded its deadline")]
    DeadlineExceeded { op: &'static str },

    #[error("Invalid path: {0}")]
    InvalidPath(String),

    #[error("Configuration error: {0}")]
    Configuration(String),
}

impl StorageError {
    /// True when the caller's context stopped the operation, either by
    /// explicit cancellation or by its deadline passing.
    pub fn is_cancelled(&self) -> bool {
        matches!(
            self,
            StorageError::Cancelled { .. } | StorageError::DeadlineExceeded { .. }
        )
    }

    pub(crate) fn io(op: &'static str, path: &std::path::Path, source: std::io::Error) -> Self {
        StorageError::Io {
            op,
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn remote(op: &'static str, key: impl ToString, source: object_store::Error) -> Self {
        StorageError::Remote {
            op,
            key: key.to_string(),
            source,
        }
    }
}
