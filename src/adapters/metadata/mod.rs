//! Record document sources
//!
//! The engine reads a record's structured metadata through the
//! [`RecordSource`] boundary; parsing the underlying document format is
//! not part of the export core.

use crate::domain::document::RecordDocument;
use crate::domain::errors::ArcaError;
use crate::domain::result::Result;
use std::path::PathBuf;

/// Provider of the record document for one export run.
pub trait RecordSource: Send + Sync {
    fn load_record(&self) -> Result<RecordDocument>;
}

/// Loads a record document from a JSON file.
pub struct JsonRecordSource {
    path: PathBuf,
}

impl JsonRecordSource {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl RecordSource for JsonRecordSource {
    fn load_record(&self) -> Result<RecordDocument> {
        let text = std::fs::read_to_string(&self.path).map_err(|err| {
            ArcaError::Metadata(format!(
                "cannot read record document {}: {err}",
                self.path.display()
            ))
        })?;
        serde_json::from_str(&text)
            .map_err(|err| ArcaError::Metadata(format!("malformed record document: {err}")))
    }
}
