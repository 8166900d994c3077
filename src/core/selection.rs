//! Selection parsing
//!
//! The image selection arrives as an opaque workflow property of the
//! textual form `{"name1":order1,"name2":order2}`. The braces and quotes
//! are structural rather than JSON-typed, so the payload goes through a
//! narrow micro-grammar that keeps the historical tolerances (optional
//! braces, optional quoting, stray whitespace) instead of a general-purpose
//! JSON parser.

use crate::domain::errors::ArcaError;
use crate::domain::result::Result;

/// One selected image and its position in the export sequence.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectionEntry {
    pub name: String,
    pub order: i64,
}

/// An ordered image selection.
///
/// Entries are unique by name and sorted ascending by order. The first
/// entry of the final sequence designates the representative image; the
/// raw order values carry no meaning beyond their relative ordering.
#[derive(Debug, Clone, Default)]
pub struct Selection {
    entries: Vec<SelectionEntry>,
}

impl Selection {
    /// Parse a raw selection payload.
    ///
    /// Later duplicates overwrite an earlier entry's order. Blank items
    /// between commas are skipped. Entries with equal orders keep their
    /// payload order.
    ///
    /// # Errors
    ///
    /// [`ArcaError::EmptyOrMissingSelection`] if the payload parses to zero
    /// entries, [`ArcaError::MalformedSelection`] if an item has no order
    /// or a non-numeric order.
    pub fn parse(raw: &str) -> Result<Self> {
        let trimmed = raw.trim();
        let inner = trimmed.strip_prefix('{').unwrap_or(trimmed);
        let inner = inner.strip_suffix('}').unwrap_or(inner);

        let mut entries: Vec<SelectionEntry> = Vec::new();
        for item in inner.split(',') {
            let item = item.trim();
            if item.is_empty() {
                continue;
            }
            let (name, order) = item.split_once(':').ok_or_else(|| {
                ArcaError::MalformedSelection(format!("missing order in '{item}'"))
            })?;
            let name = strip_quotes(name.trim());
            if name.is_empty() {
                return Err(ArcaError::MalformedSelection(format!(
                    "missing image name in '{item}'"
                )));
            }
            let order: i64 = strip_quotes(order.trim()).parse().map_err(|_| {
                ArcaError::MalformedSelection(format!("non-numeric order in '{item}'"))
            })?;

            match entries.iter_mut().find(|entry| entry.name == name) {
                Some(existing) => existing.order = order,
                None => entries.push(SelectionEntry {
                    name: name.to_string(),
                    order,
                }),
            }
        }

        if entries.is_empty() {
            return Err(ArcaError::EmptyOrMissingSelection(
                "selection parsed to zero entries".to_string(),
            ));
        }

        // stable sort: equal orders keep payload order
        entries.sort_by_key(|entry| entry.order);
        Ok(Self { entries })
    }

    pub fn entries(&self) -> &[SelectionEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|entry| entry.name == name)
    }

    /// Canonical re-serialization of the order mapping. Parsing the result
    /// yields the same selection.
    pub fn to_property_string(&self) -> String {
        let items: Vec<String> = self
            .entries
            .iter()
            .map(|entry| format!("\"{}\":{}", entry.name, entry.order))
            .collect();
        format!("{{{}}}", items.join(","))
    }
}

fn strip_quotes(s: &str) -> &str {
    let s = s.strip_prefix('"').unwrap_or(s);
    s.strip_suffix('"').unwrap_or(s)
}
