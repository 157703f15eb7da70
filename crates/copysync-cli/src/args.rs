//! Positional argument handling.
//!
//! The command takes exactly four positional arguments. Usage problems are
//! reported with their own exit codes before anything touches storage.

use clap::error::ErrorKind;
use clap::Parser;
use copysync_core::{parse_bool_flag, FlagError, RunConfig};
use std::ffi::OsString;
use thiserror::Error;

/// Positional values after the program name.
const EXPECTED_ARGS: usize = 4;

pub const USAGE: &str = "s3-copy-sync <manifest_bucket> <manifest_key> <header:true|false> <delete_destination:true|false>";

#[derive(Parser, Debug)]
#[command(name = "s3-copy-sync")]
#[command(about = "Copy or sync every source/destination pair listed in an S3 manifest")]
struct Args {
    /// Bucket containing the manifest CSV
    manifest_bucket: String,

    /// Key of the manifest CSV
    manifest_key: String,

    /// Whether the manifest starts with a header row (true/false)
    header: String,

    /// Whether prefix syncs delete destination objects missing from the source (true/false)
    delete_destination: String,
}

#[derive(Debug, Error)]
pub enum UsageError {
    /// `--help` or `--version` was requested; the rendered text is attached.
    #[error("{0}")]
    Help(String),

    #[error("expected 4 arguments: {}", USAGE)]
    WrongArgCount,

    #[error("{which}: {source}")]
    InvalidFlag {
        which: &'static str,
        #[source]
        source: FlagError,
    },
}

impl UsageError {
    pub fn exit_code(&self) -> u8 {
        match self {
            UsageError::Help(_) => 0,
            UsageError::WrongArgCount => 1,
            UsageError::InvalidFlag { .. } => 2,
        }
    }
}

/// Parse the process arguments (including the program name) into a [`RunConfig`].
pub fn parse_args<I, T>(args: I) -> Result<RunConfig, UsageError>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let mut args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    if args.len() == EXPECTED_ARGS + 1 {
        // Exactly four values are always positionals, even when they start with '-'.
        args.insert(1, OsString::from("--"));
    }

    let args = Args::try_parse_from(args).map_err(|e| match e.kind() {
        ErrorKind::DisplayHelp | ErrorKind::DisplayVersion => UsageError::Help(e.to_string()),
        _ => UsageError::WrongArgCount,
    })?;

    let has_header = parse_bool_flag(&args.header).map_err(|source| UsageError::InvalidFlag {
        which: "header",
        source,
    })?;
    let delete_destination =
        parse_bool_flag(&args.delete_destination).map_err(|source| UsageError::InvalidFlag {
            which: "delete_destination",
            source,
        })?;

    Ok(RunConfig {
        manifest_bucket: args.manifest_bucket,
        manifest_key: args.manifest_key,
        has_header,
        delete_destination,
    })
}
