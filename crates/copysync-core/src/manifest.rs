//! Manifest parsing.
//!
//! A manifest is a UTF-8, comma-delimited file with one `source,destination`
//! pair per line and an optional header line. Rows are yielded lazily in file
//! order; iteration stops at the first malformed row, so every row before it
//! has already been handed to the caller.

use csv::{ReaderBuilder, StringRecord, Trim};
use thiserror::Error;

const UTF8_BOM: &[u8] = b"\xEF\xBB\xBF";

#[derive(Debug, Error)]
pub enum ManifestError {
    #[error("manifest is not valid UTF-8: {0}")]
    InvalidUtf8(#[from] std::string::FromUtf8Error),

    #[error("manifest is empty but a header row was expected")]
    EmptyManifest,

    #[error("line {line}: expected source and destination columns, found {columns}")]
    MalformedRow { line: u64, columns: usize },

    #[error("manifest could not be read as CSV: {0}")]
    Csv(#[from] csv::Error),
}

/// One `source,destination` pair from the manifest.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestRow {
    /// 1-based line number in the manifest file.
    pub line: u64,
    pub source: String,
    pub destination: String,
}

/// A decoded manifest body.
#[derive(Debug, Clone)]
pub struct Manifest {
    body: String,
    has_header: bool,
}

impl Manifest {
    /// Decode a manifest body fetched from storage.
    pub fn from_bytes(bytes: Vec<u8>, has_header: bool) -> Result<Self, ManifestError> {
        let bytes = match bytes.strip_prefix(UTF8_BOM) {
            Some(rest) => rest.to_vec(),
            None => bytes,
        };
        let body = String::from_utf8(bytes)?;
        Ok(Self { body, has_header })
    }

    /// Iterate the data rows. Each call starts again from the top of the file.
    pub fn rows(&self) -> ManifestRows<'_> {
        let reader = ReaderBuilder::new()
            .has_headers(false)
            .flexible(true)
            .trim(Trim::All)
            .from_reader(self.body.as_bytes());

        ManifestRows {
            reader,
            skip_header: self.has_header,
            done: false,
        }
    }
}

/// Lazy iterator over manifest rows. See [`Manifest::rows`].
pub struct ManifestRows<'a> {
    reader: csv::Reader<&'a [u8]>,
    skip_header: bool,
    done: bool,
}

impl ManifestRows<'_> {
    fn fail(&mut self, err: ManifestError) -> Option<Result<ManifestRow, ManifestError>> {
        self.done = true;
        Some(Err(err))
    }
}

impl Iterator for ManifestRows<'_> {
    type Item = Result<ManifestRow, ManifestError>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done {
            return None;
        }

        let mut record = StringRecord::new();

        if self.skip_header {
            self.skip_header = false;
            match self.reader.read_record(&mut record) {
                Ok(true) => {}
                Ok(false) => return self.fail(ManifestError::EmptyManifest),
                Err(e) => return self.fail(e.into()),
            }
        }

        match self.reader.read_record(&mut record) {
            Ok(true) => {}
            Ok(false) => {
                self.done = true;
                return None;
            }
            Err(e) => return self.fail(e.into()),
        }

        let line = record.position().map(|p| p.line()).unwrap_or_default();
        match (record.get(0), record.get(1)) {
            (Some(source), Some(destination)) => Some(Ok(ManifestRow {
                line,
                source: source.to_string(),
                destination: destination.to_string(),
            })),
            _ => self.fail(ManifestError::MalformedRow {
                line,
                columns: record.len(),
            }),
        }
    }
}
