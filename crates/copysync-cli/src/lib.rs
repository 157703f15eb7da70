//! copysync command-line runner
//!
//! Reads a manifest of `source,destination` pairs from S3 and replicates each
//! source: single objects are copied server-side, directory markers are
//! mirrored with `aws s3 sync`.

pub mod args;
pub mod error;
pub mod reader;
pub mod replicate;
pub mod sync;

pub use args::{parse_args, UsageError};
pub use error::ReplicateError;
pub use reader::fetch_manifest;
pub use replicate::{Replicator, RunSummary, SourceKind, TransferDescriptor, TransferOutcome};
pub use sync::{AwsCliSync, SyncError, SyncReport, SyncRequest, SyncTool};

use copysync_core::RunConfig;
use copysync_storage::ObjectStore;
use std::sync::Arc;

/// Initialize tracing for CLI binaries.
pub fn init_tracing() {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .init();
}

/// Fetch the manifest and replicate every row with the given collaborators.
pub async fn run(
    config: &RunConfig,
    store: Arc<dyn ObjectStore>,
    sync_tool: Arc<dyn SyncTool>,
) -> Result<RunSummary, ReplicateError> {
    let manifest = fetch_manifest(store.as_ref(), config).await?;
    let replicator = Replicator::new(store, sync_tool, config.delete_destination);
    replicator.run(&config.manifest_uri(), &manifest).await
}
