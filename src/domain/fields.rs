//! Declarative field mapping
//!
//! A list of field definitions, loaded once per run from configuration,
//! defines the shape of every output record in the manifest.

use serde::{Deserialize, Serialize};

/// How a field's output value is produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldKind {
    /// The configured value, verbatim.
    Static,
    /// Scoped metadata lookup: per-image node first, record-level node as
    /// fallback.
    Metadata,
    /// The staged image filename.
    Filename,
    /// `true` on the first record of the export sequence.
    Representative,
    /// The export timestamp.
    Date,
    /// The record's registry id, as an integer.
    ExternalId,
    /// Registry-assigned image identifier. Resolved to a placeholder and
    /// back-filled from the prior manifest by the continuity pass.
    Identifier,
    /// Unrecognized kinds resolve to an empty value rather than failing.
    #[serde(other)]
    Unknown,
}

/// One declarative output field.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FieldDefinition {
    /// Output key in the manifest record.
    pub name: String,

    pub kind: FieldKind,

    /// Kind-dependent payload: the metadata field name for `metadata`, the
    /// literal text for `static`, unused otherwise.
    #[serde(default)]
    pub value: String,
}

impl FieldDefinition {
    pub fn new(name: impl Into<String>, kind: FieldKind, value: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind,
            value: value.into(),
        }
    }
}

/// First field declared with the given kind, if any.
pub fn find_by_kind(fields: &[FieldDefinition], kind: FieldKind) -> Option<&FieldDefinition> {
    fields.iter().find(|field| field.kind == kind)
}
