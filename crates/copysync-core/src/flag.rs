//! Boolean flag parsing for positional command-line arguments.

use thiserror::Error;

/// A positional flag that is neither `true` nor `false`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid boolean flag {value:?}: expected true or false")]
pub struct FlagError {
    pub value: String,
}

/// Parse a `true`/`false` flag, ignoring ASCII case.
///
/// Anything else (including `yes`, `1` and the empty string) is rejected.
pub fn parse_bool_flag(value: &str) -> Result<bool, FlagError> {
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(FlagError {
            value: value.to_string(),
        })
    }
}
