//! Export manifest
//!
//! Wire format delivered alongside the exported images: one JSON object
//! carrying the registry id under a fixed label, the generation timestamp,
//! and the list of output records under a configurable root element name.
//! Exactly one manifest per record exists in the remote store at any time;
//! re-exports leave a timestamp-suffixed backup beside it.

use crate::domain::errors::ArcaError;
use crate::domain::result::Result;
use serde_json::{Map, Value};

/// Fixed label of the registry id key.
pub const RECORD_ID_LABEL: &str = "Record-ID";

/// Fixed label of the generation timestamp key.
pub const GENERATED_AT_LABEL: &str = "Generated-At";

/// Timestamp format used for the manifest header and `date`-kind fields
/// (`yyyy-MM-dd HH:mm:ss:SSS`).
pub const TIMESTAMP_FORMAT: &str = "%Y-%m-%d %H:%M:%S:%3f";

/// One output record: an ordered field-name → value mapping. Insertion
/// order is the configured field order and is preserved on serialization.
pub type OutputRecord = Map<String, Value>;

/// Manifest for one export run.
#[derive(Debug, Clone)]
pub struct ExportManifest {
    pub record_id: i64,
    pub generated_at: String,
    pub records: Vec<OutputRecord>,
}

impl ExportManifest {
    pub fn to_json(&self, root_element: &str) -> Value {
        let mut top = Map::new();
        top.insert(RECORD_ID_LABEL.to_string(), Value::from(self.record_id));
        top.insert(
            GENERATED_AT_LABEL.to_string(),
            Value::from(self.generated_at.clone()),
        );
        top.insert(
            root_element.to_string(),
            Value::Array(self.records.iter().cloned().map(Value::Object).collect()),
        );
        Value::Object(top)
    }

    pub fn to_string_pretty(&self, root_element: &str) -> Result<String> {
        Ok(serde_json::to_string_pretty(&self.to_json(root_element))?)
    }
}

/// Parse a prior manifest's record list.
///
/// Lenient on purpose: only the root element list is required, anything
/// else in the document is ignored, and non-object entries are skipped.
pub fn parse_records(text: &str, root_element: &str) -> Result<Vec<OutputRecord>> {
    let value: Value = serde_json::from_str(text)?;
    let records = value
        .get(root_element)
        .and_then(Value::as_array)
        .ok_or_else(|| {
            ArcaError::Serialization(format!("manifest has no '{root_element}' record list"))
        })?;
    Ok(records
        .iter()
        .filter_map(|record| record.as_object().cloned())
        .collect())
}
