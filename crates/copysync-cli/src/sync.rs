//! Prefix synchronization through the AWS CLI.
//!
//! Whole-prefix mirroring is delegated to `aws s3 sync`. The child process is
//! awaited to completion with no timeout, its output is logged line by line,
//! and a non-zero exit is reported as [`SyncError::Failed`].

use async_trait::async_trait;
use copysync_storage::CannedAcl;
use std::path::PathBuf;
use std::process::{ExitStatus, Stdio};
use std::time::Instant;
use thiserror::Error;
use tokio::process::Command;

/// One `aws s3 sync` invocation.
///
/// `source` and `destination` are the manifest's URI text, passed through
/// untouched so the CLI resolves exactly the prefix the row names.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SyncRequest {
    pub source: String,
    pub destination: String,
    pub acl: CannedAcl,
    /// Remove destination objects that do not exist under the source prefix.
    pub delete_extraneous: bool,
}

impl SyncRequest {
    /// Arguments passed after the program name.
    pub fn to_args(&self) -> Vec<String> {
        let mut args = vec![
            "s3".to_string(),
            "sync".to_string(),
            self.source.clone(),
            self.destination.clone(),
            "--acl".to_string(),
            self.acl.as_str().to_string(),
        ];
        if self.delete_extraneous {
            args.push("--delete".to_string());
        }
        args
    }
}

/// Captured output of a successful sync.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SyncReport {
    pub stdout: String,
    pub stderr: String,
}

#[derive(Debug, Error)]
pub enum SyncError {
    #[error("failed to launch {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("{program} exited with {status}: {stderr}")]
    Failed {
        program: String,
        /// Exit code, or `None` when the process was killed by a signal.
        code: Option<i32>,
        status: String,
        stderr: String,
    },
}

/// Runs prefix synchronizations.
#[async_trait]
pub trait SyncTool: Send + Sync {
    async fn sync(&self, request: &SyncRequest) -> Result<SyncReport, SyncError>;
}

/// [`SyncTool`] backed by the AWS CLI executable.
#[derive(Debug, Clone)]
pub struct AwsCliSync {
    program: PathBuf,
}

impl AwsCliSync {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
        }
    }
}

#[async_trait]
impl SyncTool for AwsCliSync {
    #[tracing::instrument(skip(self, request), fields(source = %request.source, destination = %request.destination))]
    async fn sync(&self, request: &SyncRequest) -> Result<SyncReport, SyncError> {
        let program = self.program.display().to_string();
        let args = request.to_args();
        let start = Instant::now();

        tracing::info!(program = %program, args = ?args, "Starting sync");

        let output = Command::new(&self.program)
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .output()
            .await
            .map_err(|source| SyncError::Spawn {
                program: program.clone(),
                source,
            })?;

        let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
        let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

        for line in stdout.lines().filter(|l| !l.trim().is_empty()) {
            tracing::info!(target: "copysync::sync", "{}", line);
        }
        for line in stderr.lines().filter(|l| !l.trim().is_empty()) {
            tracing::warn!(target: "copysync::sync", "{}", line);
        }

        if !output.status.success() {
            tracing::error!(
                program = %program,
                status = %output.status,
                duration_ms = start.elapsed().as_secs_f64() * 1000.0,
                "Sync failed"
            );
            return Err(failure(program, output.status, stderr));
        }

        tracing::info!(
            duration_ms = start.elapsed().as_secs_f64() * 1000.0,
            "Sync successful"
        );

        Ok(SyncReport { stdout, stderr })
    }
}

fn failure(program: String, status: ExitStatus, stderr: String) -> SyncError {
    SyncError::Failed {
        program,
        code: status.code(),
        status: status.to_string(),
        stderr: stderr.trim().to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(delete_extraneous: bool) -> SyncRequest {
        SyncRequest {
            source: "s3://bucket-a/prefix/".to_string(),
            destination: "s3://bucket-b/mirror/".to_string(),
            acl: CannedAcl::BucketOwnerFullControl,
            delete_extraneous,
        }
    }

    #[test]
    fn args_always_carry_acl() {
        assert_eq!(
            request(false).to_args(),
            vec![
                "s3",
                "sync",
                "s3://bucket-a/prefix/",
                "s3://bucket-b/mirror/",
                "--acl",
                "bucket-owner-full-control",
            ]
        );
    }

    #[test]
    fn uri_text_is_passed_verbatim() {
        let request = SyncRequest {
            source: "s3://b1/my%20dir/".to_string(),
            destination: "S3://b2".to_string(),
            acl: CannedAcl::BucketOwnerFullControl,
            delete_extraneous: false,
        };
        let args = request.to_args();
        assert_eq!(args[2], "s3://b1/my%20dir/");
        assert_eq!(args[3], "S3://b2");
    }

    #[test]
    fn delete_option_only_when_requested() {
        let with_delete = request(true).to_args();
        assert_eq!(with_delete.last().map(String::as_str), Some("--delete"));
        assert_eq!(with_delete.iter().filter(|a| *a == "--delete").count(), 1);

        assert!(!request(false).to_args().iter().any(|a| a == "--delete"));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn captures_output_of_successful_run() {
        // echo prints the arguments it receives and exits 0
        let tool = AwsCliSync::new("echo");
        let report = tool.sync(&request(true)).await.unwrap();
        assert_eq!(
            report.stdout.trim(),
            "s3 sync s3://bucket-a/prefix/ s3://bucket-b/mirror/ --acl bucket-owner-full-control --delete"
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn non_zero_exit_is_a_failure() {
        let tool = AwsCliSync::new("false");
        let err = tool.sync(&request(false)).await.unwrap_err();
        assert!(matches!(err, SyncError::Failed { code: Some(1), .. }), "{err}");
    }

    #[tokio::test]
    async fn missing_program_is_a_spawn_error() {
        let tool = AwsCliSync::new("/nonexistent/copysync/aws");
        let err = tool.sync(&request(false)).await.unwrap_err();
        assert!(matches!(err, SyncError::Spawn { .. }));
    }
}
