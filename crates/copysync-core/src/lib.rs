//! copysync core library
//!
//! Domain types shared by the storage backend and the command-line runner.

pub mod config;
pub mod error;
pub mod flag;
pub mod manifest;
pub mod uri;

// Re-export commonly used types
pub use config::{RunConfig, ToolConfig};
pub use error::ConfigError;
pub use flag::{parse_bool_flag, FlagError};
pub use manifest::{Manifest, ManifestError, ManifestRow, ManifestRows};
pub use uri::{S3Uri, UriError};
