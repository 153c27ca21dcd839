//! Error types

use std::path::PathBuf;
use thiserror::Error;

/// Error returned by [`ComputeQueue::submit`](crate::ComputeQueue::submit)
///
/// `E` is the backend's own error type; anything the runtime reports outside
/// of program builds is passed through as [`QueueError::Backend`].
#[derive(Debug, Error)]
pub enum QueueError<E: std::error::Error + 'static> {
    /// The program source could not be read
    #[error("failed to read program source {path:?}: {source}")]
    Source {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    /// The program failed to build; carries the device build log
    #[error("failed to build program {path:?}:\n{log}")]
    Build { path: PathBuf, log: String },
    /// A submission needs at least one kernel argument
    #[error("a task needs at least one kernel argument")]
    NoArguments,
    /// Error reported by the compute runtime
    #[error(transparent)]
    Backend(E),
}

impl<E: std::error::Error + 'static> QueueError<E> {
    /// Build log of a failed program build
    pub fn build_log(&self) -> Option<&str> {
        match self {
            QueueError::Build { log, .. } => Some(log),
            _ => None,
        }
    }

    pub fn is_build_error(&self) -> bool {
        matches!(self, QueueError::Build { .. })
    }
}

/// Invalid queue configuration
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}: {reason}")]
    InvalidValue {
        key: &'static str,
        value: String,
        reason: String,
    },
}
