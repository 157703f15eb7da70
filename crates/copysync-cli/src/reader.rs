//! Manifest reader: fetches the manifest object and decodes it.

use crate::error::ReplicateError;
use copysync_core::{Manifest, RunConfig, S3Uri};
use copysync_storage::ObjectStore;

/// Fetch the manifest named by `config` and decode it.
///
/// Rows are parsed lazily by [`Manifest::rows`]; only fetch and UTF-8 errors
/// surface here.
pub async fn fetch_manifest(
    store: &dyn ObjectStore,
    config: &RunConfig,
) -> Result<Manifest, ReplicateError> {
    let uri = config.manifest_uri();
    let location = S3Uri::new(config.manifest_bucket.as_str(), config.manifest_key.as_str());

    let body = store
        .get_object(&location)
        .await
        .map_err(|source| ReplicateError::ManifestFetch {
            uri: uri.clone(),
            source,
        })?;

    tracing::info!(
        manifest = %uri,
        size_bytes = body.len() as u64,
        has_header = config.has_header,
        "Manifest fetched"
    );

    Manifest::from_bytes(body, config.has_header)
        .map_err(|source| ReplicateError::Manifest { uri, source })
}
