//! Record document model
//!
//! In-memory form of a digitized record's structured metadata as supplied
//! by a [`crate::adapters::metadata::RecordSource`]: one record-level
//! metadata node, a flat list of page nodes with their image files and
//! typed cross-references, and the workflow properties attached to the
//! record. Parsing the underlying document format is not the engine's
//! concern; it only consumes this tree.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;

/// Reference type that connects a page to its per-image descriptive node.
pub const PHOTOGRAPH_REFERENCE: &str = "Photograph";

/// A flat name → value metadata node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataNode {
    #[serde(default)]
    values: BTreeMap<String, String>,
}

impl MetadataNode {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insertion, mostly useful when assembling documents in
    /// tests.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.values.insert(name.into(), value.into());
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<String>) {
        self.values.insert(name.into(), value.into());
    }

    pub fn value(&self, name: &str) -> Option<&str> {
        self.values.get(name).map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Cross-reference from a page to another node, typed by the kind of the
/// referencing node.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeReference {
    #[serde(rename = "type")]
    pub node_type: String,
    pub node: MetadataNode,
}

/// One physical page with its image file and incoming references.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PageNode {
    /// Image path as recorded in the document; may carry directory
    /// components.
    pub image: String,

    #[serde(default)]
    pub references: Vec<NodeReference>,
}

impl PageNode {
    /// Basename of the page's image path. Selections address images by
    /// basename only.
    pub fn image_name(&self) -> &str {
        Path::new(&self.image)
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or(&self.image)
    }

    /// The per-image descriptive node, reachable via a reference typed
    /// "Photograph". When several such references exist the last one wins.
    pub fn photograph(&self) -> Option<&MetadataNode> {
        self.references
            .iter()
            .filter(|reference| reference.node_type == PHOTOGRAPH_REFERENCE)
            .map(|reference| &reference.node)
            .last()
    }
}

/// The complete record document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RecordDocument {
    /// Record-level (wide-scope) metadata node. Always present.
    pub record: MetadataNode,

    /// Physical pages in document order.
    #[serde(default)]
    pub pages: Vec<PageNode>,

    /// Workflow properties attached to the record, among them the
    /// serialized image selection.
    #[serde(default)]
    pub properties: BTreeMap<String, String>,
}

impl RecordDocument {
    pub fn property(&self, name: &str) -> Option<&str> {
        self.properties.get(name).map(String::as_str)
    }

    /// Locate the page whose image basename matches `name`.
    pub fn page_by_image_name(&self, name: &str) -> Option<&PageNode> {
        self.pages.iter().find(|page| page.image_name() == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn photograph_ref(node: MetadataNode) -> NodeReference {
        NodeReference {
            node_type: PHOTOGRAPH_REFERENCE.to_string(),
            node,
        }
    }

    #[test]
    fn test_image_name_strips_directories() {
        let page = PageNode {
            image: "/data/master/00000001.tif".to_string(),
            references: Vec::new(),
        };
        assert_eq!(page.image_name(), "00000001.tif");
    }

    #[test]
    fn test_photograph_lookup_by_reference_type() {
        let page = PageNode {
            image: "a.tif".to_string(),
            references: vec![
                NodeReference {
                    node_type: "Chapter".to_string(),
                    node: MetadataNode::new().with("TitleDocMain", "ignored"),
                },
                photograph_ref(MetadataNode::new().with("Caption", "front view")),
            ],
        };
        let photograph = page.photograph().unwrap();
        assert_eq!(photograph.value("Caption"), Some("front view"));
    }

    #[test]
    fn test_photograph_absent() {
        let page = PageNode {
            image: "a.tif".to_string(),
            references: Vec::new(),
        };
        assert!(page.photograph().is_none());
    }

    #[test]
    fn test_page_lookup_is_basename_only() {
        let document = RecordDocument {
            record: MetadataNode::new(),
            pages: vec![PageNode {
                image: "master/0001.tif".to_string(),
                references: Vec::new(),
            }],
            properties: BTreeMap::new(),
        };
        assert!(document.page_by_image_name("0001.tif").is_some());
        assert!(document.page_by_image_name("master/0001.tif").is_none());
        assert!(document.page_by_image_name("0002.tif").is_none());
    }

    #[test]
    fn test_document_deserializes_from_json() {
        let json = r#"{
            "record": { "values": { "RegistryId": "118009" } },
            "pages": [
                {
                    "image": "0001.tif",
                    "references": [
                        { "type": "Photograph", "node": { "values": { "Caption": "x" } } }
                    ]
                }
            ],
            "properties": { "export selection": "{\"0001.tif\":1}" }
        }"#;
        let document: RecordDocument = serde_json::from_str(json).unwrap();
        assert_eq!(document.record.value("RegistryId"), Some("118009"));
        assert_eq!(document.pages.len(), 1);
        assert!(document.property("export selection").is_some());
    }
}
