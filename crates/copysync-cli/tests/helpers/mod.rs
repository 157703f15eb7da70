//! Test helpers: in-memory object store and a recording sync tool.
//!
//! Run from workspace root: `cargo test -p copysync-cli`.

#![allow(dead_code)]

use async_trait::async_trait;
use copysync_cli::{SyncError, SyncReport, SyncRequest, SyncTool};
use copysync_core::S3Uri;
use copysync_storage::{CannedAcl, ObjectMetadata, ObjectStore, StorageError, StorageResult};
use std::collections::{HashMap, HashSet};
use std::sync::{Arc, Mutex};

pub const DIRECTORY_CONTENT_TYPE: &str = "application/x-directory";

pub fn uri(s: &str) -> S3Uri {
    s.parse().expect("test URI must parse")
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StoredObject {
    pub body: Vec<u8>,
    pub content_type: Option<String>,
}

/// Every call made against the store, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StoreCall {
    Get(S3Uri),
    Head(S3Uri),
    Copy {
        source: S3Uri,
        destination: S3Uri,
        acl: CannedAcl,
    },
}

/// In-memory object store keyed by full URI.
#[derive(Clone, Default)]
pub struct MemoryStore {
    objects: Arc<Mutex<HashMap<S3Uri, StoredObject>>>,
    denied: Arc<Mutex<HashSet<S3Uri>>>,
    calls: Arc<Mutex<Vec<StoreCall>>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn put(&self, location: &str, body: &[u8], content_type: &str) {
        self.objects.lock().unwrap().insert(
            uri(location),
            StoredObject {
                body: body.to_vec(),
                content_type: Some(content_type.to_string()),
            },
        );
    }

    /// Store a zero-byte directory marker.
    pub fn put_directory(&self, location: &str) {
        self.put(location, b"", DIRECTORY_CONTENT_TYPE);
    }

    /// Make every call touching `location` fail with access denied.
    pub fn deny(&self, location: &str) {
        self.denied.lock().unwrap().insert(uri(location));
    }

    pub fn object(&self, location: &str) -> Option<StoredObject> {
        self.objects.lock().unwrap().get(&uri(location)).cloned()
    }

    pub fn calls(&self) -> Vec<StoreCall> {
        self.calls.lock().unwrap().clone()
    }

    pub fn heads(&self) -> Vec<S3Uri> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Head(location) => Some(location),
                _ => None,
            })
            .collect()
    }

    pub fn copies(&self) -> Vec<(S3Uri, S3Uri, CannedAcl)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                StoreCall::Copy {
                    source,
                    destination,
                    acl,
                } => Some((source, destination, acl)),
                _ => None,
            })
            .collect()
    }

    fn check_access(&self, location: &S3Uri) -> StorageResult<()> {
        if self.denied.lock().unwrap().contains(location) {
            return Err(StorageError::AccessDenied(location.clone()));
        }
        Ok(())
    }

    fn lookup(&self, location: &S3Uri) -> StorageResult<StoredObject> {
        self.check_access(location)?;
        self.objects
            .lock()
            .unwrap()
            .get(location)
            .cloned()
            .ok_or_else(|| StorageError::NotFound(location.clone()))
    }
}

#[async_trait]
impl ObjectStore for MemoryStore {
    async fn get_object(&self, location: &S3Uri) -> StorageResult<Vec<u8>> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Get(location.clone()));
        Ok(self.lookup(location)?.body)
    }

    async fn head_object(&self, location: &S3Uri) -> StorageResult<ObjectMetadata> {
        self.calls
            .lock()
            .unwrap()
            .push(StoreCall::Head(location.clone()));
        let object = self.lookup(location)?;
        Ok(ObjectMetadata {
            content_type: object.content_type,
            content_length: Some(object.body.len() as u64),
        })
    }

    async fn copy_object(
        &self,
        source: &S3Uri,
        _source_metadata: &ObjectMetadata,
        destination: &S3Uri,
        acl: CannedAcl,
    ) -> StorageResult<()> {
        self.calls.lock().unwrap().push(StoreCall::Copy {
            source: source.clone(),
            destination: destination.clone(),
            acl,
        });
        let object = self.lookup(source)?;
        self.check_access(destination)?;
        self.objects
            .lock()
            .unwrap()
            .insert(destination.clone(), object);
        Ok(())
    }
}

/// Sync tool that records requests and optionally fails them.
#[derive(Clone, Default)]
pub struct RecordingSync {
    requests: Arc<Mutex<Vec<SyncRequest>>>,
    fail_with: Option<i32>,
}

impl RecordingSync {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request fails as if the tool exited with `code`.
    pub fn failing(code: i32) -> Self {
        Self {
            requests: Arc::default(),
            fail_with: Some(code),
        }
    }

    pub fn requests(&self) -> Vec<SyncRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl SyncTool for RecordingSync {
    async fn sync(&self, request: &SyncRequest) -> Result<SyncReport, SyncError> {
        self.requests.lock().unwrap().push(request.clone());
        match self.fail_with {
            Some(code) => Err(SyncError::Failed {
                program: "aws".to_string(),
                code: Some(code),
                status: format!("exit status: {}", code),
                stderr: "fatal error: An error occurred (AccessDenied)".to_string(),
            }),
            None => Ok(SyncReport {
                stdout: format!("copy: {} to {}", request.source, request.destination),
                stderr: String::new(),
            }),
        }
    }
}
