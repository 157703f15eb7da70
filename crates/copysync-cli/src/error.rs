//! Run-level errors and their process exit codes.

use crate::sync::SyncError;
use copysync_core::{ConfigError, ManifestError, UriError};
use copysync_storage::StorageError;
use thiserror::Error;

pub const EXIT_RUNTIME_FAILURE: u8 = 3;
pub const EXIT_SYNC_FAILURE: u8 = 4;
pub const EXIT_CONFIG_FAILURE: u8 = 5;

#[derive(Debug, Error)]
pub enum ReplicateError {
    #[error("invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("failed to initialise storage client: {0}")]
    StorageInit(#[source] StorageError),

    #[error("failed to fetch manifest {uri}: {source}")]
    ManifestFetch {
        uri: String,
        #[source]
        source: StorageError,
    },

    #[error("failed to read manifest {uri}: {source}")]
    Manifest {
        uri: String,
        #[source]
        source: ManifestError,
    },

    #[error("line {line}: {source}")]
    InvalidUri {
        line: u64,
        #[source]
        source: UriError,
    },

    #[error("line {line}: {operation} failed: {source}")]
    Storage {
        line: u64,
        operation: &'static str,
        #[source]
        source: StorageError,
    },

    #[error("line {line}: sync failed: {source}")]
    Sync {
        line: u64,
        #[source]
        source: SyncError,
    },
}

impl ReplicateError {
    /// Process exit code for this failure.
    pub fn exit_code(&self) -> u8 {
        match self {
            ReplicateError::Config(_) => EXIT_CONFIG_FAILURE,
            ReplicateError::Sync { .. } => EXIT_SYNC_FAILURE,
            ReplicateError::StorageInit(_)
            | ReplicateError::ManifestFetch { .. }
            | ReplicateError::Manifest { .. }
            | ReplicateError::InvalidUri { .. }
            | ReplicateError::Storage { .. } => EXIT_RUNTIME_FAILURE,
        }
    }

    /// Manifest line of the failing row, when the failure belongs to one.
    pub fn line(&self) -> Option<u64> {
        match self {
            ReplicateError::InvalidUri { line, .. }
            | ReplicateError::Storage { line, .. }
            | ReplicateError::Sync { line, .. } => Some(*line),
            ReplicateError::Manifest {
                source: ManifestError::MalformedRow { line, .. },
                ..
            } => Some(*line),
            _ => None,
        }
    }
}
