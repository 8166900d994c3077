//! Export run summary

use std::path::PathBuf;
use std::time::Duration;

/// Outcome of one export run.
///
/// A run has exactly one terminal outcome: either this summary (optionally
/// with warnings from degraded remote steps) or an error. There is no
/// partial-success reporting beyond the warning list.
#[derive(Debug, Clone, Default)]
pub struct ExportSummary {
    pub record_id: String,
    pub selected_images: usize,
    pub records_projected: usize,
    pub identifiers_recovered: usize,
    pub staged_files: usize,
    pub uploaded_files: usize,
    pub pruned_files: usize,
    pub backup_created: bool,
    /// True when every remote step completed without a transport failure.
    pub remote_synced: bool,
    pub warnings: Vec<String>,
    pub duration: Duration,
    /// Set when the staging directory was retained for diagnosis.
    pub staging_dir: Option<PathBuf>,
}

impl ExportSummary {
    pub fn new(record_id: impl Into<String>) -> Self {
        Self {
            record_id: record_id.into(),
            ..Self::default()
        }
    }

    pub fn add_warning(&mut self, warning: impl Into<String>) {
        self.warnings.push(warning.into());
    }

    pub fn with_duration(mut self, duration: Duration) -> Self {
        self.duration = duration;
        self
    }

    pub fn is_clean(&self) -> bool {
        self.warnings.is_empty()
    }

    pub fn log_summary(&self) {
        tracing::info!(
            record_id = %self.record_id,
            selected = self.selected_images,
            projected = self.records_projected,
            recovered_identifiers = self.identifiers_recovered,
            staged = self.staged_files,
            uploaded = self.uploaded_files,
            pruned = self.pruned_files,
            backup = self.backup_created,
            synced = self.remote_synced,
            warnings = self.warnings.len(),
            duration_ms = self.duration.as_millis() as u64,
            "export run finished"
        );
    }
}
