//! copysync storage library
//!
//! This crate provides the object storage abstraction used by the replicator
//! and its S3 implementation.
//!
//! Only the operations the replicator needs are exposed. Locations are always
//! full [`S3Uri`] values so a single client can address any bucket.

#[cfg(feature = "storage-s3")]
pub mod s3;
pub mod traits;

// Re-export commonly used types
pub use copysync_core::S3Uri;
#[cfg(feature = "storage-s3")]
pub use s3::S3Storage;
pub use traits::{CannedAcl, ObjectMetadata, ObjectStore, StorageError, StorageResult};
