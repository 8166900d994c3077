//! Core domain types and models

pub mod document;
pub mod errors;
pub mod fields;
pub mod ids;
pub mod manifest;
pub mod result;

pub use document::{MetadataNode, NodeReference, PageNode, RecordDocument};
pub use errors::{ArcaError, TransferError};
pub use fields::{FieldDefinition, FieldKind};
pub use ids::RecordId;
pub use manifest::{ExportManifest, OutputRecord};
pub use result::Result;
