//! Path replicator.
//!
//! Each manifest row is classified by the source object's content-type and
//! then either copied server-side or handed to the sync tool. Rows run one at
//! a time in manifest order and the first failure ends the run.

use crate::error::ReplicateError;
use crate::sync::{SyncRequest, SyncTool};
use copysync_core::{Manifest, ManifestRow, S3Uri};
use copysync_storage::{CannedAcl, ObjectMetadata, ObjectStore, StorageError};
use std::sync::Arc;
use std::time::Instant;

/// Content-type prefix marking a zero-byte "folder" object.
pub const DIRECTORY_CONTENT_TYPE_PREFIX: &str = "application/x-directory";

/// ACL applied to every copied or synced object.
pub const TRANSFER_ACL: CannedAcl = CannedAcl::BucketOwnerFullControl;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceKind {
    /// A single object, copied server-side.
    Object,
    /// A directory marker; everything under it is synced.
    Prefix,
}

impl SourceKind {
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        match content_type {
            Some(ct) if ct.starts_with(DIRECTORY_CONTENT_TYPE_PREFIX) => SourceKind::Prefix,
            _ => SourceKind::Object,
        }
    }
}

/// A classified manifest row, ready to transfer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TransferDescriptor {
    pub line: u64,
    /// Source URI as written in the manifest.
    pub source_uri: String,
    /// Destination URI as written in the manifest.
    pub destination_uri: String,
    pub source: S3Uri,
    pub destination: S3Uri,
    pub kind: SourceKind,
    pub source_metadata: ObjectMetadata,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransferOutcome {
    Copied,
    Synced,
}

/// Totals for a completed run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunSummary {
    pub rows: usize,
    pub copied: usize,
    pub synced: usize,
}

impl RunSummary {
    fn record(&mut self, outcome: TransferOutcome) {
        self.rows += 1;
        match outcome {
            TransferOutcome::Copied => self.copied += 1,
            TransferOutcome::Synced => self.synced += 1,
        }
    }
}

pub struct Replicator {
    store: Arc<dyn ObjectStore>,
    sync_tool: Arc<dyn SyncTool>,
    delete_destination: bool,
}

impl Replicator {
    pub fn new(
        store: Arc<dyn ObjectStore>,
        sync_tool: Arc<dyn SyncTool>,
        delete_destination: bool,
    ) -> Self {
        Self {
            store,
            sync_tool,
            delete_destination,
        }
    }

    /// Replicate every row of `manifest` in order.
    ///
    /// `manifest_uri` only labels errors raised while reading rows.
    pub async fn run(
        &self,
        manifest_uri: &str,
        manifest: &Manifest,
    ) -> Result<RunSummary, ReplicateError> {
        let start = Instant::now();
        let mut summary = RunSummary::default();

        for row in manifest.rows() {
            let row = row.map_err(|source| ReplicateError::Manifest {
                uri: manifest_uri.to_string(),
                source,
            })?;
            let outcome = self.replicate(&row).await?;
            summary.record(outcome);
        }

        tracing::info!(
            rows = summary.rows,
            copied = summary.copied,
            synced = summary.synced,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Manifest replicated"
        );

        Ok(summary)
    }

    /// Classify and transfer one row.
    pub async fn replicate(&self, row: &ManifestRow) -> Result<TransferOutcome, ReplicateError> {
        tracing::info!(
            line = row.line,
            source = %row.source,
            destination = %row.destination,
            "Processing row"
        );

        let descriptor = self.describe(row).await?;
        self.transfer(&descriptor).await
    }

    /// Parse both URIs of `row` and classify the source with a head request.
    pub async fn describe(&self, row: &ManifestRow) -> Result<TransferDescriptor, ReplicateError> {
        let source: S3Uri = row.source.parse().map_err(|e| ReplicateError::InvalidUri {
            line: row.line,
            source: e,
        })?;
        let destination: S3Uri = row.destination.parse().map_err(|e| ReplicateError::InvalidUri {
            line: row.line,
            source: e,
        })?;

        let source_metadata = self.store.head_object(&source).await.map_err(|e| {
            ReplicateError::Storage {
                line: row.line,
                operation: "head",
                source: e,
            }
        })?;

        let kind = SourceKind::from_content_type(source_metadata.content_type.as_deref());

        Ok(TransferDescriptor {
            line: row.line,
            source_uri: row.source.clone(),
            destination_uri: row.destination.clone(),
            source,
            destination,
            kind,
            source_metadata,
        })
    }

    /// Copy or sync an already classified row.
    pub async fn transfer(
        &self,
        descriptor: &TransferDescriptor,
    ) -> Result<TransferOutcome, ReplicateError> {
        match descriptor.kind {
            SourceKind::Prefix => {
                tracing::info!(
                    line = descriptor.line,
                    source = %descriptor.source,
                    "Source is a directory, syncing entire prefix"
                );
                self.sync_prefix(descriptor).await?;
                Ok(TransferOutcome::Synced)
            }
            SourceKind::Object => {
                tracing::info!(
                    line = descriptor.line,
                    source = %descriptor.source,
                    "Source is an object, overwriting destination"
                );
                self.copy_object(descriptor).await?;
                Ok(TransferOutcome::Copied)
            }
        }
    }

    async fn copy_object(&self, descriptor: &TransferDescriptor) -> Result<(), ReplicateError> {
        let storage_error = |source: StorageError| ReplicateError::Storage {
            line: descriptor.line,
            operation: "copy",
            source,
        };

        if descriptor.destination.key().is_empty() {
            return Err(storage_error(StorageError::InvalidKey(
                descriptor.destination.to_string(),
            )));
        }

        self.store
            .copy_object(
                &descriptor.source,
                &descriptor.source_metadata,
                &descriptor.destination,
                TRANSFER_ACL,
            )
            .await
            .map_err(storage_error)
    }

    async fn sync_prefix(&self, descriptor: &TransferDescriptor) -> Result<(), ReplicateError> {
        let request = SyncRequest {
            source: descriptor.source_uri.clone(),
            destination: descriptor.destination_uri.clone(),
            acl: TRANSFER_ACL,
            delete_extraneous: self.delete_destination,
        };

        self.sync_tool
            .sync(&request)
            .await
            .map(|_| ())
            .map_err(|source| ReplicateError::Sync {
                line: descriptor.line,
                source,
            })
    }
}
