//! Storage abstraction trait
//!
//! This module defines the ObjectStore trait that storage backends implement.

use async_trait::async_trait;
use copysync_core::S3Uri;
use std::fmt::{Display, Formatter, Result as FmtResult};
use thiserror::Error;

/// Storage operation errors
#[derive(Debug, Error)]
pub enum StorageError {
    #[error("Object not found: {0}")]
    NotFound(S3Uri),

    #[error("Access denied: {0}")]
    AccessDenied(S3Uri),

    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Copy failed: {0}")]
    CopyFailed(String),

    #[error("Invalid storage key: {0}")]
    InvalidKey(String),

    #[error("Storage backend error: {0}")]
    BackendError(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),
}

/// Result type for storage operations
pub type StorageResult<T> = Result<T, StorageError>;

/// Object metadata returned by a head request.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ObjectMetadata {
    pub content_type: Option<String>,
    pub content_length: Option<u64>,
}

/// Canned ACLs applied to copied objects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CannedAcl {
    /// The destination bucket owner gets full control regardless of who wrote the object.
    BucketOwnerFullControl,
}

impl CannedAcl {
    pub fn as_str(&self) -> &'static str {
        match self {
            CannedAcl::BucketOwnerFullControl => "bucket-owner-full-control",
        }
    }
}

impl Display for CannedAcl {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        f.write_str(self.as_str())
    }
}

/// Object storage operations used by the manifest reader and replicator.
///
/// Implementations must be safe to share across rows; the replicator holds one
/// instance for the whole run.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Fetch the full body of an object.
    async fn get_object(&self, location: &S3Uri) -> StorageResult<Vec<u8>>;

    /// Read an object's metadata without its body.
    async fn head_object(&self, location: &S3Uri) -> StorageResult<ObjectMetadata>;

    /// Server-side copy, overwriting any existing destination object.
    ///
    /// `source_metadata` is the result of a prior `head_object` on `source`;
    /// backends use it to pick a copy strategy for large objects.
    async fn copy_object(
        &self,
        source: &S3Uri,
        source_metadata: &ObjectMetadata,
        destination: &S3Uri,
        acl: CannedAcl,
    ) -> StorageResult<()>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canned_acl_wire_value() {
        assert_eq!(
            CannedAcl::BucketOwnerFullControl.as_str(),
            "bucket-owner-full-control"
        );
        assert_eq!(
            CannedAcl::BucketOwnerFullControl.to_string(),
            "bucket-owner-full-control"
        );
    }

    #[test]
    fn errors_name_the_location() {
        let err = StorageError::NotFound(S3Uri::new("b1", "a.txt"));
        assert_eq!(err.to_string(), "Object not found: s3://b1/a.txt");
    }
}
