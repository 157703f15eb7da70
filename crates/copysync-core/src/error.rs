//! Error types module
//!
//! Configuration errors live here. Parsing errors stay next to the parser that
//! produces them ([`crate::FlagError`], [`crate::UriError`], [`crate::ManifestError`]).

use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConfigError {
    #[error("{name} must be a whole number, got {value:?}")]
    NotANumber { name: &'static str, value: String },

    #[error("{name} must be between {min} and {max}, got {value}")]
    OutOfRange {
        name: &'static str,
        value: u64,
        min: u64,
        max: u64,
    },
}
