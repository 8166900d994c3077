//! Export coordinator - main orchestrator for the export process
//!
//! Runs one export end to end: selection parsing, record projection,
//! identifier continuity, derivative staging, manifest serialization and
//! remote reconciliation. Every run builds its own state from scratch —
//! nothing is shared across runs, and the invoking workflow is expected to
//! serialize exports per record id; the engine provides no cross-process
//! mutual exclusion.

use crate::adapters::imaging::{DerivativeWriter, JpegDerivativeWriter};
use crate::adapters::metadata::RecordSource;
use crate::adapters::transfer;
use crate::config::schema::ProjectConfig;
use crate::core::continuity::IdentifierMap;
use crate::core::export::summary::ExportSummary;
use crate::core::projector::RecordProjector;
use crate::core::reconciler::RemoteReconciler;
use crate::core::selection::Selection;
use crate::domain::errors::ArcaError;
use crate::domain::ids::RecordId;
use crate::domain::manifest::{parse_records, ExportManifest, TIMESTAMP_FORMAT};
use crate::domain::result::Result;
use chrono::Local;
use std::path::PathBuf;
use std::time::Instant;

/// Options controlling one export run.
#[derive(Debug, Clone, Default)]
pub struct ExportOptions {
    /// Skip every remote step; the run only projects and stages locally.
    pub dry_run: bool,
    /// Keep the staging directory after the run for diagnosis.
    pub retain_staging: bool,
}

/// Export coordinator
pub struct ExportCoordinator {
    project: ProjectConfig,
    source: Box<dyn RecordSource>,
    images_dir: PathBuf,
    scaler: Box<dyn DerivativeWriter>,
    options: ExportOptions,
}

impl ExportCoordinator {
    pub fn new(
        project: ProjectConfig,
        source: Box<dyn RecordSource>,
        images_dir: impl Into<PathBuf>,
        options: ExportOptions,
    ) -> Self {
        Self {
            project,
            source,
            images_dir: images_dir.into(),
            scaler: Box::new(JpegDerivativeWriter::default()),
            options,
        }
    }

    /// Replace the derivative writer, mostly useful in tests.
    pub fn with_scaler(mut self, scaler: Box<dyn DerivativeWriter>) -> Self {
        self.scaler = scaler;
        self
    }

    /// Execute the export
    ///
    /// This is the main entry point. It:
    /// 1. Loads the record document and validates the registry id
    /// 2. Parses the image selection
    /// 3. Connects the transfer session (soft failure: the run continues
    ///    without remote operations)
    /// 4. Fetches the prior manifest, builds the identifier map and keeps
    ///    a timestamp-suffixed backup copy
    /// 5. Projects one output record per selected image
    /// 6. Back-fills recovered identifiers
    /// 7. Stages derivatives and the serialized manifest
    /// 8. Reconciles the remote folder (prune orphans, upload everything)
    /// 9. Closes the session and tears down the staging directory
    ///
    /// User-abort conditions (missing registry id, missing or empty
    /// selection, structurally unassigned image) and malformed inputs
    /// return an error before any remote state is touched.
    pub async fn execute_export(&self) -> Result<ExportSummary> {
        let start = Instant::now();
        let now = Local::now();

        let document = self.source.load_record()?;

        // registry id, validated numeric before anything is staged or sent
        let record_id = match document.record.value(&self.project.record_id_metadata) {
            Some(value) => {
                RecordId::new(value).map_err(|_| ArcaError::MissingRecordId)?
            }
            None => return Err(ArcaError::MissingRecordId),
        };
        let registry_number = record_id.numeric()?;

        // image selection
        let raw_selection = document
            .property(&self.project.selection_property)
            .ok_or_else(|| {
                ArcaError::EmptyOrMissingSelection(format!(
                    "property '{}' is not set",
                    self.project.selection_property
                ))
            })?;
        let selection = Selection::parse(raw_selection)?;
        tracing::info!(
            record_id = %record_id,
            images = selection.len(),
            "starting export"
        );

        let mut summary = ExportSummary::new(record_id.as_str());
        summary.selected_images = selection.len();

        // staging directory, torn down on every exit path unless retained
        let staging = tempfile::Builder::new()
            .prefix(&format!("arca-{record_id}-"))
            .tempdir()
            .map_err(|err| ArcaError::Io(format!("cannot create staging directory: {err}")))?;

        // transfer session: a failed connect short-circuits the remote
        // steps but never the locally computed output
        let mut reconciler = if self.options.dry_run {
            tracing::info!("dry run, remote operations skipped");
            None
        } else {
            match transfer::connect(&self.project.transfer).await {
                Ok(session) => Some(RemoteReconciler::new(
                    session,
                    self.project.transfer.remote_folder.clone(),
                    record_id.clone(),
                )),
                Err(err) => {
                    tracing::warn!(error = %err, "transfer connect failed, continuing without remote operations");
                    summary.add_warning(format!("connect: {err}"));
                    None
                }
            }
        };

        // prior manifest: identifier map + local backup copy
        let mut identifier_map = IdentifierMap::default();
        if let Some(reconciler) = reconciler.as_mut() {
            match reconciler.fetch_prior_manifest(staging.path()).await {
                Ok(Some(fetched)) => {
                    match std::fs::read_to_string(&fetched) {
                        Ok(text) => match parse_records(&text, &self.project.manifest_root) {
                            Ok(records) => {
                                identifier_map =
                                    IdentifierMap::from_records(&records, &self.project.fields);
                            }
                            Err(err) => {
                                // identifier recovery is best-effort
                                tracing::warn!(error = %err, "prior manifest unparseable, continuing without identifier recovery");
                                summary.add_warning(format!("prior manifest: {err}"));
                            }
                        },
                        Err(err) => {
                            tracing::warn!(error = %err, "cannot read fetched manifest");
                            summary.add_warning(format!("prior manifest: {err}"));
                        }
                    }
                    match reconciler.backup_prior_manifest(&fetched, now.timestamp_millis()) {
                        Ok(_) => summary.backup_created = true,
                        Err(err) => {
                            tracing::warn!(error = %err, "prior manifest backup failed");
                            summary.add_warning(format!("backup: {err}"));
                        }
                    }
                }
                Ok(None) => {
                    tracing::info!("treating run as first export");
                }
                Err(err) => {
                    tracing::warn!(error = %err, "prior manifest lookup failed");
                    summary.add_warning(format!("prior manifest: {err}"));
                }
            }
        }

        // projection
        let projector = RecordProjector::new(
            &document,
            &self.project.fields,
            &record_id,
            &self.project.shelfmark_metadata,
            now,
        );
        let mut images = projector.project(&selection)?;
        summary.records_projected = images.len();

        // identifier continuity back-fill
        summary.identifiers_recovered = identifier_map.apply(&mut images, &self.project.fields);

        // stage derivatives; a failed image is logged and skipped
        for image in &images {
            let source = self.images_dir.join(&image.source_name);
            let dest = staging.path().join(&image.staged_name);
            match self.scaler.write_derivative(&source, &dest) {
                Ok(()) => summary.staged_files += 1,
                Err(err) => {
                    tracing::warn!(image = %image.source_name, error = %err, "failed to stage derivative");
                    summary.add_warning(format!("stage {}: {err}", image.source_name));
                }
            }
        }

        // serialize the manifest into the staging directory
        let manifest = ExportManifest {
            record_id: registry_number,
            generated_at: now.format(TIMESTAMP_FORMAT).to_string(),
            records: images.iter().map(|image| image.record.clone()).collect(),
        };
        let manifest_path = staging.path().join(format!("{record_id}.json"));
        std::fs::write(
            &manifest_path,
            manifest.to_string_pretty(&self.project.manifest_root)?,
        )
        .map_err(|err| ArcaError::Io(format!("cannot write manifest: {err}")))?;
        summary.staged_files += 1;

        // reconcile the remote folder
        if let Some(reconciler) = reconciler.as_mut() {
            reconciler.mark_staged();
            match reconciler.sync(staging.path()).await {
                Ok(report) => {
                    summary.uploaded_files = report.uploaded;
                    summary.pruned_files = report.pruned;
                    summary.remote_synced = report.failures.is_empty();
                    for failure in report.failures {
                        summary.add_warning(failure);
                    }
                }
                Err(err) => {
                    tracing::warn!(error = %err, "remote reconciliation failed");
                    summary.add_warning(format!("sync: {err}"));
                }
            }
            reconciler.close().await;
        }

        // staging cleanup; TempDir removes itself unless retained
        if self.options.retain_staging {
            let kept = staging.into_path();
            tracing::info!(path = %kept.display(), "staging directory retained");
            summary.staging_dir = Some(kept);
        }

        let summary = summary.with_duration(start.elapsed());
        summary.log_summary();
        Ok(summary)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::schema::{TransferConfig, TransferMode};
    use crate::domain::document::{
        MetadataNode, NodeReference, PageNode, RecordDocument, PHOTOGRAPH_REFERENCE,
    };
    use crate::domain::fields::{FieldDefinition, FieldKind};

    struct FixedSource(RecordDocument);

    impl RecordSource for FixedSource {
        fn load_record(&self) -> Result<RecordDocument> {
            Ok(self.0.clone())
        }
    }

    fn project(mirror_dir: Option<String>) -> ProjectConfig {
        ProjectConfig {
            name: "*".to_string(),
            selection_property: "export selection".to_string(),
            record_id_metadata: "RegistryId".to_string(),
            shelfmark_metadata: "shelfmarksource".to_string(),
            manifest_root: "Media".to_string(),
            fields: vec![
                FieldDefinition::new("Dateiinformation", FieldKind::Filename, ""),
                FieldDefinition::new("Id", FieldKind::Identifier, ""),
            ],
            transfer: TransferConfig {
                mode: TransferMode::Mirror,
                host: String::new(),
                port: 22,
                username: String::new(),
                password: None,
                keyfile: None,
                known_hosts: None,
                remote_folder: "upload".to_string(),
                timeout_secs: 30,
                mirror_dir,
            },
        }
    }

    fn document_without_id() -> RecordDocument {
        RecordDocument::default()
    }

    #[tokio::test]
    async fn test_missing_record_id_is_user_abort() {
        let coordinator = ExportCoordinator::new(
            project(None),
            Box::new(FixedSource(document_without_id())),
            "/tmp",
            ExportOptions {
                dry_run: true,
                ..Default::default()
            },
        );
        let err = coordinator.execute_export().await.unwrap_err();
        assert!(matches!(err, ArcaError::MissingRecordId));
        assert!(err.is_user_abort());
    }

    #[tokio::test]
    async fn test_non_numeric_record_id_is_fatal() {
        let mut document = RecordDocument::default();
        document.record.set("RegistryId", "ABC");
        let coordinator = ExportCoordinator::new(
            project(None),
            Box::new(FixedSource(document)),
            "/tmp",
            ExportOptions {
                dry_run: true,
                ..Default::default()
            },
        );
        assert!(matches!(
            coordinator.execute_export().await,
            Err(ArcaError::MalformedRecordId(_))
        ));
    }

    #[tokio::test]
    async fn test_missing_selection_property_is_user_abort() {
        let mut document = RecordDocument::default();
        document.record.set("RegistryId", "1");
        let coordinator = ExportCoordinator::new(
            project(None),
            Box::new(FixedSource(document)),
            "/tmp",
            ExportOptions {
                dry_run: true,
                ..Default::default()
            },
        );
        let err = coordinator.execute_export().await.unwrap_err();
        assert!(matches!(err, ArcaError::EmptyOrMissingSelection(_)));
    }

    #[tokio::test]
    async fn test_unassigned_selected_image_aborts_run() {
        let mut document = RecordDocument::default();
        document.record.set("RegistryId", "1");
        document
            .properties
            .insert("export selection".to_string(), r#"{"a.tif":1}"#.to_string());
        document.pages.push(PageNode {
            image: "a.tif".to_string(),
            references: Vec::new(),
        });
        let coordinator = ExportCoordinator::new(
            project(None),
            Box::new(FixedSource(document)),
            "/tmp",
            ExportOptions {
                dry_run: true,
                ..Default::default()
            },
        );
        assert!(matches!(
            coordinator.execute_export().await,
            Err(ArcaError::UnassignedImage(_))
        ));
    }

    #[tokio::test]
    async fn test_failed_connect_still_produces_local_output() {
        let mut document = RecordDocument::default();
        document.record.set("RegistryId", "1");
        document
            .properties
            .insert("export selection".to_string(), r#"{"a.tif":1}"#.to_string());
        document.pages.push(PageNode {
            image: "a.tif".to_string(),
            references: vec![NodeReference {
                node_type: PHOTOGRAPH_REFERENCE.to_string(),
                node: MetadataNode::new(),
            }],
        });

        // mirror root does not exist, so connect fails softly
        let coordinator = ExportCoordinator::new(
            project(Some("/nonexistent/mirror".to_string())),
            Box::new(FixedSource(document)),
            "/tmp",
            ExportOptions {
                retain_staging: true,
                ..Default::default()
            },
        );
        let summary = coordinator.execute_export().await.unwrap();
        assert!(!summary.is_clean());
        assert!(!summary.remote_synced);
        assert_eq!(summary.records_projected, 1);
        // the manifest was still written locally
        let staging = summary.staging_dir.expect("staging retained");
        assert!(staging.join("1.json").exists());
        std::fs::remove_dir_all(staging).unwrap();
    }
}
