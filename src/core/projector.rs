//! Record projection
//!
//! Walks the selection in order, locates each selected image's per-image
//! descriptive node, computes the staged filename and assembles one output
//! record per image by applying the full field mapping. The first entry of
//! the sequence is the representative.

use crate::core::resolver::{resolve_field, ResolveContext, ScopePair};
use crate::core::selection::Selection;
use crate::domain::document::RecordDocument;
use crate::domain::errors::ArcaError;
use crate::domain::fields::FieldDefinition;
use crate::domain::ids::RecordId;
use crate::domain::manifest::OutputRecord;
use crate::domain::result::Result;
use chrono::{DateTime, Local};

/// One selected image after projection.
#[derive(Debug, Clone)]
pub struct ProjectedImage {
    /// Original image filename, as addressed by the selection.
    pub source_name: String,
    /// Filename under which the derivative is staged and uploaded. Differs
    /// from `source_name` when the per-image node carries a shelfmark.
    pub staged_name: String,
    pub record: OutputRecord,
}

pub struct RecordProjector<'a> {
    document: &'a RecordDocument,
    fields: &'a [FieldDefinition],
    record_id: &'a RecordId,
    shelfmark_key: &'a str,
    now: DateTime<Local>,
}

impl<'a> RecordProjector<'a> {
    pub fn new(
        document: &'a RecordDocument,
        fields: &'a [FieldDefinition],
        record_id: &'a RecordId,
        shelfmark_key: &'a str,
        now: DateTime<Local>,
    ) -> Self {
        Self {
            document,
            fields,
            record_id,
            shelfmark_key,
            now,
        }
    }

    /// Project every selected image, in selection order.
    ///
    /// # Errors
    ///
    /// [`ArcaError::UnassignedImage`] aborts the whole run when a selected
    /// image matches no page or its page has no per-image descriptive node.
    /// An image the user selected but that is structurally disconnected
    /// from the record is a data-integrity error, not something to skip.
    pub fn project(&self, selection: &Selection) -> Result<Vec<ProjectedImage>> {
        let mut projected = Vec::with_capacity(selection.len());

        for (index, entry) in selection.entries().iter().enumerate() {
            let page = self
                .document
                .page_by_image_name(&entry.name)
                .ok_or_else(|| ArcaError::UnassignedImage(entry.name.clone()))?;
            let photograph = page
                .photograph()
                .ok_or_else(|| ArcaError::UnassignedImage(entry.name.clone()))?;

            // shelfmark rename: the staged derivative takes the shelfmark as
            // its name; renaming intentionally breaks identifier continuity
            let staged_name = match photograph.value(self.shelfmark_key) {
                Some(shelfmark) => format!("{shelfmark}.jpg"),
                None => entry.name.clone(),
            };

            let cx = ResolveContext {
                scopes: ScopePair {
                    narrow: Some(photograph),
                    wide: &self.document.record,
                },
                is_representative: index == 0,
                filename: &staged_name,
                record_id: self.record_id,
                now: self.now,
            };

            let mut record = OutputRecord::new();
            for field in self.fields {
                record.insert(field.name.clone(), resolve_field(field, &cx)?);
            }

            tracing::debug!(
                image = %entry.name,
                staged = %staged_name,
                representative = cx.is_representative,
                "projected image record"
            );
            projected.push(ProjectedImage {
                source_name: entry.name.clone(),
                staged_name,
                record,
            });
        }

        Ok(projected)
    }
}
