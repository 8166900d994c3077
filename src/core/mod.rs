//! Business logic: the export reconciliation engine
//!
//! Control flow runs selection parsing → record projection (one field
//! resolution per field, per image) → identifier continuity → manifest
//! serialization → remote reconciliation.

pub mod continuity;
pub mod export;
pub mod projector;
pub mod reconciler;
pub mod resolver;
pub mod selection;
