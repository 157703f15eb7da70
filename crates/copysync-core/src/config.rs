//! Configuration module
//!
//! [`RunConfig`] describes one run and comes from the command line.
//! [`ToolConfig`] holds environment settings for the storage client and the
//! external sync tool.

use std::env;
use std::path::PathBuf;

use crate::error::ConfigError;

const DEFAULT_SYNC_PROGRAM: &str = "/usr/local/bin/aws";
const DEFAULT_MULTIPART_PART_SIZE_MB: u64 = 512;
const MIN_MULTIPART_PART_SIZE_MB: u64 = 5;
const MAX_MULTIPART_PART_SIZE_MB: u64 = 5 * 1024;
const MIB: u64 = 1024 * 1024;

/// Inputs for a single run. Immutable once parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct RunConfig {
    pub manifest_bucket: String,
    pub manifest_key: String,
    /// Discard the first manifest row.
    pub has_header: bool,
    /// Remove destination objects missing from the source during prefix sync.
    pub delete_destination: bool,
}

impl RunConfig {
    pub fn manifest_uri(&self) -> String {
        format!("s3://{}/{}", self.manifest_bucket, self.manifest_key)
    }
}

/// Environment-derived settings for the storage client and sync tool.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ToolConfig {
    /// Program invoked as `<program> s3 sync ...` for prefix synchronization.
    pub sync_program: PathBuf,
    /// Region override; the SDK provider chain is used when unset.
    pub region: Option<String>,
    /// Custom endpoint for S3-compatible providers (MinIO etc.).
    pub endpoint_url: Option<String>,
    /// Part size in bytes for multipart server-side copies.
    pub multipart_part_size: u64,
}

impl Default for ToolConfig {
    fn default() -> Self {
        Self {
            sync_program: PathBuf::from(DEFAULT_SYNC_PROGRAM),
            region: None,
            endpoint_url: None,
            multipart_part_size: DEFAULT_MULTIPART_PART_SIZE_MB * MIB,
        }
    }
}

impl ToolConfig {
    /// Load from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self, ConfigError> {
        dotenvy::dotenv().ok();
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Build from an arbitrary variable lookup. Blank values count as unset.
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ConfigError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };

        let sync_program = get("COPYSYNC_AWS_CLI")
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from(DEFAULT_SYNC_PROGRAM));

        let region = get("S3_REGION").or_else(|| get("AWS_REGION"));
        let endpoint_url = get("S3_ENDPOINT");

        let part_size_mb = match get("COPYSYNC_MULTIPART_PART_SIZE_MB") {
            Some(raw) => raw.parse::<u64>().map_err(|_| ConfigError::NotANumber {
                name: "COPYSYNC_MULTIPART_PART_SIZE_MB",
                value: raw.clone(),
            })?,
            None => DEFAULT_MULTIPART_PART_SIZE_MB,
        };
        if !(MIN_MULTIPART_PART_SIZE_MB..=MAX_MULTIPART_PART_SIZE_MB).contains(&part_size_mb) {
            return Err(ConfigError::OutOfRange {
                name: "COPYSYNC_MULTIPART_PART_SIZE_MB",
                value: part_size_mb,
                min: MIN_MULTIPART_PART_SIZE_MB,
                max: MAX_MULTIPART_PART_SIZE_MB,
            });
        }

        Ok(Self {
            sync_program,
            region,
            endpoint_url,
            multipart_part_size: part_size_mb * MIB,
        })
    }
}
