//! Field resolution
//!
//! Evaluates one field definition against the metadata scope pair of a
//! single image. `identifier`-kind fields deliberately resolve to an empty
//! placeholder here: prior-run state is unavailable at resolve time and is
//! back-filled afterwards by the continuity pass.

use crate::domain::document::MetadataNode;
use crate::domain::fields::{FieldDefinition, FieldKind};
use crate::domain::ids::RecordId;
use crate::domain::manifest::TIMESTAMP_FORMAT;
use crate::domain::result::Result;
use chrono::{DateTime, Local};
use serde_json::Value;

/// Narrow (per-image) and wide (record-level) metadata scopes.
#[derive(Debug, Clone, Copy)]
pub struct ScopePair<'a> {
    pub narrow: Option<&'a MetadataNode>,
    pub wide: &'a MetadataNode,
}

impl ScopePair<'_> {
    /// Scoped lookup: narrow scope first, wide scope second. The wide scope
    /// is always consulted when the narrow scope lacks the field, even if a
    /// narrow scope is present.
    pub fn lookup(&self, name: &str) -> Option<&str> {
        self.narrow
            .and_then(|node| node.value(name))
            .or_else(|| self.wide.value(name))
    }
}

/// Per-image inputs threaded through every field of one output record.
#[derive(Debug, Clone)]
pub struct ResolveContext<'a> {
    pub scopes: ScopePair<'a>,
    pub is_representative: bool,
    /// Staged filename of the image, after any shelfmark rename.
    pub filename: &'a str,
    pub record_id: &'a RecordId,
    pub now: DateTime<Local>,
}

/// Resolve one field definition to its output value.
///
/// # Errors
///
/// Only `external_id`-kind fields can fail, with
/// [`crate::domain::ArcaError::MalformedRecordId`] for a non-numeric id.
pub fn resolve_field(def: &FieldDefinition, cx: &ResolveContext<'_>) -> Result<Value> {
    let value = match def.kind {
        FieldKind::Static => Value::from(def.value.clone()),
        FieldKind::Metadata => {
            Value::from(cx.scopes.lookup(&def.value).unwrap_or_default().to_string())
        }
        FieldKind::Filename => Value::from(cx.filename.to_string()),
        FieldKind::Representative => Value::from(cx.is_representative),
        FieldKind::Date => Value::from(cx.now.format(TIMESTAMP_FORMAT).to_string()),
        FieldKind::ExternalId => Value::from(cx.record_id.numeric()?),
        FieldKind::Identifier | FieldKind::Unknown => Value::from(String::new()),
    };
    Ok(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::errors::ArcaError;
    use chrono::TimeZone;

    fn context<'a>(
        narrow: Option<&'a MetadataNode>,
        wide: &'a MetadataNode,
        record_id: &'a RecordId,
    ) -> ResolveContext<'a> {
        ResolveContext {
            scopes: ScopePair { narrow, wide },
            is_representative: true,
            filename: "a.tif",
            record_id,
            now: Local.with_ymd_and_hms(2024, 3, 1, 10, 15, 30).unwrap(),
        }
    }

    #[test]
    fn test_static_returns_value_verbatim() {
        let wide = MetadataNode::new();
        let id = RecordId::new("1").unwrap();
        let cx = context(None, &wide, &id);
        let def = FieldDefinition::new("Source", FieldKind::Static, "Archive");
        assert_eq!(resolve_field(&def, &cx).unwrap(), Value::from("Archive"));
    }

    #[test]
    fn test_metadata_prefers_narrow_scope() {
        let narrow = MetadataNode::new().with("Caption", "detail");
        let wide = MetadataNode::new().with("Caption", "overview");
        let id = RecordId::new("1").unwrap();
        let cx = context(Some(&narrow), &wide, &id);
        let def = FieldDefinition::new("Caption", FieldKind::Metadata, "Caption");
        assert_eq!(resolve_field(&def, &cx).unwrap(), Value::from("detail"));
    }

    #[test]
    fn test_metadata_falls_back_to_wide_scope() {
        // the narrow scope exists but lacks the field; the wide scope must
        // still be consulted
        let narrow = MetadataNode::new().with("Other", "x");
        let wide = MetadataNode::new().with("Caption", "overview");
        let id = RecordId::new("1").unwrap();
        let cx = context(Some(&narrow), &wide, &id);
        let def = FieldDefinition::new("Caption", FieldKind::Metadata, "Caption");
        assert_eq!(resolve_field(&def, &cx).unwrap(), Value::from("overview"));
    }

    #[test]
    fn test_metadata_absent_in_both_scopes_is_empty() {
        let wide = MetadataNode::new();
        let id = RecordId::new("1").unwrap();
        let cx = context(None, &wide, &id);
        let def = FieldDefinition::new("Caption", FieldKind::Metadata, "Caption");
        assert_eq!(resolve_field(&def, &cx).unwrap(), Value::from(""));
    }

    #[test]
    fn test_filename_and_representative() {
        let wide = MetadataNode::new();
        let id = RecordId::new("1").unwrap();
        let cx = context(None, &wide, &id);
        let file = FieldDefinition::new("File", FieldKind::Filename, "");
        assert_eq!(resolve_field(&file, &cx).unwrap(), Value::from("a.tif"));
        let rep = FieldDefinition::new("Rep", FieldKind::Representative, "");
        assert_eq!(resolve_field(&rep, &cx).unwrap(), Value::from(true));
    }

    #[test]
    fn test_date_format() {
        let wide = MetadataNode::new();
        let id = RecordId::new("1").unwrap();
        let cx = context(None, &wide, &id);
        let def = FieldDefinition::new("Date", FieldKind::Date, "");
        let value = resolve_field(&def, &cx).unwrap();
        assert_eq!(value.as_str().unwrap(), "2024-03-01 10:15:30:000");
    }

    #[test]
    fn test_external_id_is_numeric() {
        let wide = MetadataNode::new();
        let id = RecordId::new("118009").unwrap();
        let cx = context(None, &wide, &id);
        let def = FieldDefinition::new("RegId", FieldKind::ExternalId, "");
        assert_eq!(resolve_field(&def, &cx).unwrap(), Value::from(118009));
    }

    #[test]
    fn test_external_id_rejects_non_numeric() {
        let wide = MetadataNode::new();
        let id = RecordId::new("abc").unwrap();
        let cx = context(None, &wide, &id);
        let def = FieldDefinition::new("RegId", FieldKind::ExternalId, "");
        assert!(matches!(
            resolve_field(&def, &cx),
            Err(ArcaError::MalformedRecordId(_))
        ));
    }

    #[test]
    fn test_identifier_resolves_to_placeholder() {
        let wide = MetadataNode::new();
        let id = RecordId::new("1").unwrap();
        let cx = context(None, &wide, &id);
        let def = FieldDefinition::new("Id", FieldKind::Identifier, "");
        assert_eq!(resolve_field(&def, &cx).unwrap(), Value::from(""));
    }

    #[test]
    fn test_unknown_kind_never_fails() {
        let wide = MetadataNode::new();
        let id = RecordId::new("1").unwrap();
        let cx = context(None, &wide, &id);
        let def = FieldDefinition::new("Extra", FieldKind::Unknown, "whatever");
        assert_eq!(resolve_field(&def, &cx).unwrap(), Value::from(""));
    }
}
