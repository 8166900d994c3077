//! Export orchestration

pub mod coordinator;
pub mod summary;

pub use coordinator::{ExportCoordinator, ExportOptions};
pub use summary::ExportSummary;
