//! Identifier continuity
//!
//! Recovers previously assigned registry identifiers from the prior
//! export's manifest and back-fills them into freshly projected records.
//! Recovery is best-effort and keyed by staged filename only: a shelfmark
//! rename breaks continuity by design, and a brand-new image stays without
//! an identifier until the registry assigns one out-of-band.

use crate::core::projector::ProjectedImage;
use crate::domain::fields::{find_by_kind, FieldDefinition, FieldKind};
use crate::domain::manifest::OutputRecord;
use serde_json::Value;
use std::collections::HashMap;

/// Ephemeral filename → identifier map.
///
/// Rebuilt from the prior manifest on every run and never persisted; its
/// only purpose is to seed identifier continuity into the current run's
/// records before the prior manifest is overwritten.
#[derive(Debug, Default)]
pub struct IdentifierMap {
    inner: HashMap<String, String>,
}

impl IdentifierMap {
    /// Build the map from a prior manifest's records.
    ///
    /// Field names are configuration-driven, so the filename and identifier
    /// columns are located by their declared kind, never by a literal key.
    /// Without both kinds in the mapping there is nothing to recover.
    pub fn from_records(records: &[OutputRecord], fields: &[FieldDefinition]) -> Self {
        let (Some(filename_field), Some(identifier_field)) = (
            find_by_kind(fields, FieldKind::Filename),
            find_by_kind(fields, FieldKind::Identifier),
        ) else {
            return Self::default();
        };

        let mut inner = HashMap::new();
        for record in records {
            let Some(filename) = record.get(&filename_field.name).and_then(scalar_text) else {
                continue;
            };
            let Some(identifier) = record.get(&identifier_field.name).and_then(scalar_text)
            else {
                continue;
            };
            if identifier.is_empty() {
                continue;
            }
            inner.insert(filename, identifier);
        }

        tracing::debug!(recovered = inner.len(), "built identifier map from prior manifest");
        Self { inner }
    }

    pub fn len(&self) -> usize {
        self.inner.len()
    }

    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }

    pub fn get(&self, filename: &str) -> Option<&str> {
        self.inner.get(filename).map(String::as_str)
    }

    /// Iterate over the recovered `(filename, identifier)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.inner
            .iter()
            .map(|(file, id)| (file.as_str(), id.as_str()))
    }

    /// Back-fill empty identifier fields on the projected records, keyed by
    /// staged filename. Returns the number of recovered identifiers.
    pub fn apply(&self, images: &mut [ProjectedImage], fields: &[FieldDefinition]) -> usize {
        let Some(identifier_field) = find_by_kind(fields, FieldKind::Identifier) else {
            return 0;
        };

        let mut recovered = 0;
        for image in images.iter_mut() {
            let is_empty = image
                .record
                .get(&identifier_field.name)
                .and_then(Value::as_str)
                .map(str::is_empty)
                .unwrap_or(true);
            if !is_empty {
                continue;
            }
            if let Some(identifier) = self.inner.get(&image.staged_name) {
                image
                    .record
                    .insert(identifier_field.name.clone(), Value::from(identifier.clone()));
                recovered += 1;
            }
        }
        recovered
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(text) => Some(text.clone()),
        Value::Number(number) => Some(number.to_string()),
        _ => None,
    }
}
