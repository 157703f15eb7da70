use crate::traits::{CannedAcl, ObjectMetadata, ObjectStore, StorageError, StorageResult};
use async_trait::async_trait;
use aws_config::meta::region::RegionProviderChain;
use aws_config::retry::RetryConfig;
use aws_config::{BehaviorVersion, Region};
use aws_sdk_s3::config::http::HttpResponse;
use aws_sdk_s3::error::{DisplayErrorContext, SdkError};
use aws_sdk_s3::operation::get_object::GetObjectError;
use aws_sdk_s3::operation::head_object::HeadObjectError;
use aws_sdk_s3::types::{CompletedMultipartUpload, CompletedPart, ObjectCannedAcl};
use aws_sdk_s3::Client;
use copysync_core::S3Uri;
use std::time::Instant;

/// Largest object a single CopyObject request accepts.
pub const MAX_SINGLE_COPY_BYTES: u64 = 5 * 1024 * 1024 * 1024;
/// S3 limit on parts per multipart upload.
const MAX_PARTS: u64 = 10_000;
const DEFAULT_PART_SIZE: u64 = 512 * 1024 * 1024;

/// S3 storage implementation
///
/// One client serves every bucket named in the manifest. SDK-level retries are
/// disabled: a failed request fails the row.
#[derive(Clone)]
pub struct S3Storage {
    client: Client,
    multipart_part_size: u64,
}

impl S3Storage {
    /// Create a new S3Storage instance
    ///
    /// # Arguments
    /// * `region` - Region override; falls back to the SDK provider chain when `None`
    /// * `endpoint_url` - Optional custom endpoint URL for S3-compatible providers
    ///   (e.g., "http://localhost:9000" for MinIO)
    pub async fn new(region: Option<String>, endpoint_url: Option<String>) -> StorageResult<Self> {
        let region_provider =
            RegionProviderChain::first_try(region.map(Region::new)).or_default_provider();

        let config = aws_config::defaults(BehaviorVersion::latest())
            .region(region_provider)
            .retry_config(RetryConfig::disabled())
            .load()
            .await;

        if config.region().is_none() {
            return Err(StorageError::ConfigError(
                "no AWS region configured (set S3_REGION or AWS_REGION)".to_string(),
            ));
        }

        let mut s3_config_builder = aws_sdk_s3::config::Builder::from(&config);
        if let Some(ref endpoint) = endpoint_url {
            // Path-style addressing is required by MinIO and most S3-compatible providers
            s3_config_builder = s3_config_builder
                .endpoint_url(endpoint)
                .force_path_style(true);
        }

        Ok(Self::from_client(Client::from_conf(s3_config_builder.build())))
    }

    /// Wrap an already configured client.
    pub fn from_client(client: Client) -> Self {
        Self {
            client,
            multipart_part_size: DEFAULT_PART_SIZE,
        }
    }

    /// Part size used when a copy exceeds [`MAX_SINGLE_COPY_BYTES`].
    pub fn with_multipart_part_size(mut self, part_size: u64) -> Self {
        self.multipart_part_size = part_size;
        self
    }

    async fn copy_single(
        &self,
        source: &S3Uri,
        destination: &S3Uri,
        acl: CannedAcl,
    ) -> StorageResult<()> {
        self.client
            .copy_object()
            .copy_source(copy_source(source))
            .bucket(destination.bucket())
            .key(destination.key())
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .send()
            .await
            .map_err(|e| {
                StorageError::CopyFailed(format!(
                    "{} -> {}: {}",
                    source,
                    destination,
                    DisplayErrorContext(&e)
                ))
            })?;

        Ok(())
    }

    async fn copy_multipart(
        &self,
        source: &S3Uri,
        source_metadata: &ObjectMetadata,
        size: u64,
        destination: &S3Uri,
        acl: CannedAcl,
    ) -> StorageResult<()> {
        let create_result = self
            .client
            .create_multipart_upload()
            .bucket(destination.bucket())
            .key(destination.key())
            .acl(ObjectCannedAcl::from(acl.as_str()))
            .set_content_type(source_metadata.content_type.clone())
            .send()
            .await
            .map_err(|e| {
                tracing::error!(
                    error = %DisplayErrorContext(&e),
                    destination = %destination,
                    "Failed to create multipart upload"
                );
                StorageError::CopyFailed(format!("{}: {}", destination, DisplayErrorContext(&e)))
            })?;

        let upload_id = create_result
            .upload_id()
            .ok_or_else(|| StorageError::CopyFailed("No upload ID returned from S3".to_string()))?
            .to_string();

        match self
            .copy_parts(source, size, destination, &upload_id)
            .await
        {
            Ok(parts) => {
                let completed_parts = CompletedMultipartUpload::builder()
                    .set_parts(Some(parts))
                    .build();

                self.client
                    .complete_multipart_upload()
                    .bucket(destination.bucket())
                    .key(destination.key())
                    .upload_id(&upload_id)
                    .multipart_upload(completed_parts)
                    .send()
                    .await
                    .map_err(|e| {
                        StorageError::CopyFailed(format!(
                            "completing {}: {}",
                            destination,
                            DisplayErrorContext(&e)
                        ))
                    })?;
                Ok(())
            }
            Err(err) => {
                if let Err(abort_err) = self
                    .client
                    .abort_multipart_upload()
                    .bucket(destination.bucket())
                    .key(destination.key())
                    .upload_id(&upload_id)
                    .send()
                    .await
                {
                    tracing::warn!(
                        error = %DisplayErrorContext(&abort_err),
                        destination = %destination,
                        upload_id = %upload_id,
                        "Failed to abort multipart upload"
                    );
                }
                Err(err)
            }
        }
    }

    async fn copy_parts(
        &self,
        source: &S3Uri,
        size: u64,
        destination: &S3Uri,
        upload_id: &str,
    ) -> StorageResult<Vec<CompletedPart>> {
        let ranges = copy_part_ranges(size, self.multipart_part_size);
        let mut parts = Vec::with_capacity(ranges.len());

        for (index, (first, last)) in ranges.into_iter().enumerate() {
            let part_number = index as i32 + 1;

            let result = self
                .client
                .upload_part_copy()
                .bucket(destination.bucket())
                .key(destination.key())
                .upload_id(upload_id)
                .part_number(part_number)
                .copy_source(copy_source(source))
                .copy_source_range(format!("bytes={}-{}", first, last))
                .send()
                .await
                .map_err(|e| {
                    tracing::error!(
                        error = %DisplayErrorContext(&e),
                        source = %source,
                        destination = %destination,
                        part_number = part_number,
                        "Failed to copy part"
                    );
                    StorageError::CopyFailed(format!(
                        "part {} of {} -> {}: {}",
                        part_number,
                        source,
                        destination,
                        DisplayErrorContext(&e)
                    ))
                })?;

            let etag = result
                .copy_part_result()
                .and_then(|r| r.e_tag())
                .ok_or_else(|| {
                    StorageError::CopyFailed(format!("No ETag returned for part {}", part_number))
                })?
                .to_string();

            parts.push(
                CompletedPart::builder()
                    .part_number(part_number)
                    .e_tag(etag)
                    .build(),
            );
        }

        Ok(parts)
    }
}

#[async_trait]
impl ObjectStore for S3Storage {
    async fn get_object(&self, location: &S3Uri) -> StorageResult<Vec<u8>> {
        let start = Instant::now();

        let response = self
            .client
            .get_object()
            .bucket(location.bucket())
            .key(location.key())
            .send()
            .await
            .map_err(|e| {
                let err = match &e {
                    SdkError::ServiceError(service_err)
                        if matches!(service_err.err(), GetObjectError::NoSuchKey(_)) =>
                    {
                        StorageError::NotFound(location.clone())
                    }
                    _ => classify_status(&e, location).unwrap_or_else(|| {
                        StorageError::DownloadFailed(format!(
                            "{}: {}",
                            location,
                            DisplayErrorContext(&e)
                        ))
                    }),
                };
                tracing::error!(
                    error = %err,
                    bucket = %location.bucket(),
                    key = %location.key(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 download failed"
                );
                err
            })?;

        let data = response
            .body
            .collect()
            .await
            .map_err(|e| StorageError::DownloadFailed(format!("{}: {}", location, e)))?;

        let bytes = data.into_bytes().to_vec();

        tracing::info!(
            bucket = %location.bucket(),
            key = %location.key(),
            size_bytes = bytes.len() as u64,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 download successful"
        );

        Ok(bytes)
    }

    async fn head_object(&self, location: &S3Uri) -> StorageResult<ObjectMetadata> {
        let start = Instant::now();

        let response = self
            .client
            .head_object()
            .bucket(location.bucket())
            .key(location.key())
            .send()
            .await
            .map_err(|e| {
                let err = match &e {
                    SdkError::ServiceError(service_err)
                        if matches!(service_err.err(), HeadObjectError::NotFound(_)) =>
                    {
                        StorageError::NotFound(location.clone())
                    }
                    _ => classify_status(&e, location).unwrap_or_else(|| {
                        StorageError::BackendError(format!(
                            "{}: {}",
                            location,
                            DisplayErrorContext(&e)
                        ))
                    }),
                };
                tracing::error!(
                    error = %err,
                    bucket = %location.bucket(),
                    key = %location.key(),
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 head failed"
                );
                err
            })?;

        let metadata = ObjectMetadata {
            content_type: response.content_type().map(String::from),
            content_length: response
                .content_length()
                .and_then(|len| u64::try_from(len).ok()),
        };

        tracing::debug!(
            bucket = %location.bucket(),
            key = %location.key(),
            content_type = ?metadata.content_type,
            content_length = ?metadata.content_length,
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "S3 head successful"
        );

        Ok(metadata)
    }

    async fn copy_object(
        &self,
        source: &S3Uri,
        source_metadata: &ObjectMetadata,
        destination: &S3Uri,
        acl: CannedAcl,
    ) -> StorageResult<()> {
        if source.key().is_empty() {
            return Err(StorageError::InvalidKey(source.to_string()));
        }
        if destination.key().is_empty() {
            return Err(StorageError::InvalidKey(destination.to_string()));
        }

        let start = Instant::now();

        let result = match source_metadata.content_length {
            Some(size) if size > MAX_SINGLE_COPY_BYTES => {
                self.copy_multipart(source, source_metadata, size, destination, acl)
                    .await
            }
            _ => self.copy_single(source, destination, acl).await,
        };

        match result {
            Ok(()) => {
                tracing::info!(
                    source = %source,
                    destination = %destination,
                    acl = %acl,
                    size_bytes = ?source_metadata.content_length,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 copy successful"
                );
                Ok(())
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    source = %source,
                    destination = %destination,
                    duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                    "S3 copy failed"
                );
                Err(e)
            }
        }
    }
}

/// Map 403/404 responses that carry no modeled error to typed variants.
fn classify_status<E>(err: &SdkError<E, HttpResponse>, location: &S3Uri) -> Option<StorageError> {
    match err.raw_response().map(|response| response.status().as_u16()) {
        Some(404) => Some(StorageError::NotFound(location.clone())),
        Some(403) => Some(StorageError::AccessDenied(location.clone())),
        _ => None,
    }
}

/// `bucket/key` with the key URL-encoded, as CopyObject expects.
fn copy_source(source: &S3Uri) -> String {
    format!("{}/{}", source.bucket(), urlencoding::encode(source.key()))
}

/// Inclusive byte ranges for a multipart copy of `size` bytes.
///
/// The part size grows when needed so the copy stays within the part limit.
fn copy_part_ranges(size: u64, part_size: u64) -> Vec<(u64, u64)> {
    if size == 0 {
        return Vec::new();
    }
    let part_size = part_size.max(size.div_ceil(MAX_PARTS)).max(1);

    (0..size)
        .step_by(part_size as usize)
        .map(|first| (first, (first + part_size).min(size) - 1))
        .collect()
}
