//! Storage URI parsing.
//!
//! Manifest entries name objects as `s3://bucket/key`. Both the source and the
//! destination column go through [`S3Uri`], so a row is either fully
//! addressable or rejected before any transfer starts.
//!
//! The key is everything after `s3://bucket/`, taken verbatim. Percent escapes,
//! `.`/`..` segments and the `?`/`#` characters are all part of the key, exactly
//! as S3 and `aws s3 sync` see it.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::str::FromStr;
use thiserror::Error;
use url::Url;

pub const S3_SCHEME: &str = "s3";

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum UriError {
    #[error("invalid storage URI {uri:?}: {reason}")]
    Malformed { uri: String, reason: String },

    #[error("unsupported scheme {scheme:?} in {uri:?}, expected s3://")]
    UnsupportedScheme { uri: String, scheme: String },

    #[error("storage URI {0:?} has no bucket")]
    MissingBucket(String),
}

/// A bucket + key pair parsed from an `s3://` URI.
///
/// The key may be empty (`s3://bucket/`), which addresses the bucket root.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct S3Uri {
    bucket: String,
    key: String,
}

impl S3Uri {
    pub fn new(bucket: impl Into<String>, key: impl Into<String>) -> Self {
        Self {
            bucket: bucket.into(),
            key: key.into(),
        }
    }

    pub fn bucket(&self) -> &str {
        &self.bucket
    }

    pub fn key(&self) -> &str {
        &self.key
    }
}

impl FromStr for S3Uri {
    type Err = UriError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let malformed = |reason: String| UriError::Malformed {
            uri: s.to_string(),
            reason,
        };

        let url = Url::parse(s).map_err(|e| malformed(e.to_string()))?;

        if url.scheme() != S3_SCHEME {
            return Err(UriError::UnsupportedScheme {
                uri: s.to_string(),
                scheme: url.scheme().to_string(),
            });
        }

        if !url.username().is_empty() || url.password().is_some() || url.port().is_some() {
            return Err(malformed(
                "credentials and ports are not allowed in storage URIs".to_string(),
            ));
        }

        let bucket = url
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| UriError::MissingBucket(s.to_string()))?;

        // Url normalizes paths, so the key is cut from the raw text instead.
        let (authority, key) = s
            .split_once("://")
            .map(|(_, rest)| rest.split_once('/').unwrap_or((rest, "")))
            .ok_or_else(|| UriError::MissingBucket(s.to_string()))?;

        if authority != bucket {
            return Err(malformed(format!(
                "bucket {:?} contains characters not allowed in a bucket name",
                authority
            )));
        }

        Ok(S3Uri {
            bucket: bucket.to_string(),
            key: key.to_string(),
        })
    }
}

impl Display for S3Uri {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}://{}/{}", S3_SCHEME, self.bucket, self.key)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bucket_and_nested_key() {
        let uri: S3Uri = "s3://bucket-name/some/path/file.txt".parse().unwrap();
        assert_eq!(uri.bucket(), "bucket-name");
        assert_eq!(uri.key(), "some/path/file.txt");
    }

    #[test]
    fn keeps_trailing_slash_on_prefixes() {
        let uri: S3Uri = "s3://bucket-b/mirror/".parse().unwrap();
        assert_eq!(uri.key(), "mirror/");
    }

    #[test]
    fn bucket_root_has_empty_key() {
        let uri: S3Uri = "s3://bucket".parse().unwrap();
        assert_eq!(uri.bucket(), "bucket");
        assert_eq!(uri.key(), "");

        let uri: S3Uri = "s3://bucket/".parse().unwrap();
        assert_eq!(uri.key(), "");
    }

    #[test]
    fn percent_escapes_stay_literal() {
        let uri: S3Uri = "s3://bucket/reports/q1%20summary.csv".parse().unwrap();
        assert_eq!(uri.key(), "reports/q1%20summary.csv");

        let uri: S3Uri = "s3://bucket/reports/q1 summary.csv".parse().unwrap();
        assert_eq!(uri.key(), "reports/q1 summary.csv");
    }

    #[test]
    fn dot_segments_are_not_resolved() {
        let uri: S3Uri = "s3://b1/logs/../secret.txt".parse().unwrap();
        assert_eq!(uri.key(), "logs/../secret.txt");

        let uri: S3Uri = "s3://b1/./a/./b.txt".parse().unwrap();
        assert_eq!(uri.key(), "./a/./b.txt");

        let uri: S3Uri = "s3://b1/..".parse().unwrap();
        assert_eq!(uri.key(), "..");
    }

    #[test]
    fn display_round_trips_literal_keys() {
        for raw in ["s3://b1/my%20dir/", "s3://b1/logs/../x", "s3://b1/a//b"] {
            let uri: S3Uri = raw.parse().unwrap();
            assert_eq!(uri.to_string(), raw);
        }
    }

    #[test]
    fn uppercase_scheme_is_accepted() {
        let uri: S3Uri = "S3://b1/Key.TXT".parse().unwrap();
        assert_eq!(uri.bucket(), "b1");
        assert_eq!(uri.key(), "Key.TXT");
    }

    #[test]
    fn rejects_query_in_bucket() {
        let err = "s3://bucket?x=1".parse::<S3Uri>().unwrap_err();
        assert!(matches!(err, UriError::Malformed { .. }));
    }

    #[test]
    fn keeps_query_and_fragment_characters_in_key() {
        let uri: S3Uri = "s3://bucket/odd?name#1".parse().unwrap();
        assert_eq!(uri.key(), "odd?name#1");
    }

    #[test]
    fn rejects_other_schemes() {
        let err = "https://bucket/key".parse::<S3Uri>().unwrap_err();
        assert!(matches!(err, UriError::UnsupportedScheme { ref scheme, .. } if scheme == "https"));
    }

    #[test]
    fn rejects_missing_bucket() {
        let err = "s3:///key".parse::<S3Uri>().unwrap_err();
        assert!(matches!(err, UriError::MissingBucket(_)));
    }

    #[test]
    fn rejects_relative_paths() {
        let err = "bucket/key".parse::<S3Uri>().unwrap_err();
        assert!(matches!(err, UriError::Malformed { .. }));
    }

    #[test]
    fn rejects_ports() {
        let err = "s3://bucket:9000/key".parse::<S3Uri>().unwrap_err();
        assert!(matches!(err, UriError::Malformed { .. }));
    }

    #[test]
    fn display_reassembles_uri() {
        let uri = S3Uri::new("b2", "a.txt");
        assert_eq!(uri.to_string(), "s3://b2/a.txt");
    }
}
