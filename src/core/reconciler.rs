//! Remote reconciliation
//!
//! Drives one transfer session through the remote half of an export run:
//! locate and fetch the prior manifest, back it up, diff the remote
//! per-record folder against the staged file set, prune orphaned images and
//! upload the staging directory.
//!
//! Transport failures during diff and upload are logged and the run
//! continues. The design favors delivering a partial file set over an
//! all-or-nothing guarantee; there is no rollback across the remote file
//! set.

use crate::adapters::transfer::TransferSession;
use crate::domain::errors::{ArcaError, TransferError};
use crate::domain::ids::RecordId;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use tokio::fs;

/// Progress of one reconciliation run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileState {
    Idle,
    Connected,
    PriorManifestChecked,
    BackedUp,
    LocalStaged,
    Diffed,
    Synced,
    Disconnected,
}

/// Where the session's current folder is, relative to the export layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RemoteLocation {
    Home,
    Root,
    RecordFolder,
}

/// Extensions that mark a remote entry as image payload during pruning.
const IMAGE_EXTENSIONS: [&str; 2] = ["tif", "jpg"];

/// Result of the sync step.
#[derive(Debug, Default, Clone)]
pub struct SyncReport {
    pub uploaded: usize,
    pub pruned: usize,
    /// Per-operation transport failures; the sync keeps going past them.
    pub failures: Vec<String>,
}

pub struct RemoteReconciler {
    session: Box<dyn TransferSession>,
    remote_root: String,
    record_id: RecordId,
    state: ReconcileState,
    location: RemoteLocation,
}

impl RemoteReconciler {
    /// Takes ownership of an already-connected session.
    pub fn new(
        session: Box<dyn TransferSession>,
        remote_root: impl Into<String>,
        record_id: RecordId,
    ) -> Self {
        Self {
            session,
            remote_root: remote_root.into(),
            record_id,
            state: ReconcileState::Connected,
            location: RemoteLocation::Home,
        }
    }

    pub fn state(&self) -> ReconcileState {
        self.state
    }

    fn set_state(&mut self, next: ReconcileState) {
        tracing::debug!(from = ?self.state, to = ?next, "reconciler state transition");
        self.state = next;
    }

    fn manifest_name(&self) -> String {
        format!("{}.json", self.record_id)
    }

    async fn enter_root(&mut self) -> Result<(), TransferError> {
        if self.location == RemoteLocation::Home {
            self.session.change_folder(&self.remote_root).await?;
            self.location = RemoteLocation::Root;
        }
        Ok(())
    }

    /// Navigate into the per-record subfolder. With `create` the folder is
    /// made on demand; without it a missing folder yields `Ok(false)`.
    /// Navigation only ever moves forward (home → root → record folder), so
    /// the session needs no notion of "up".
    async fn enter_record_folder(&mut self, create: bool) -> Result<bool, TransferError> {
        self.enter_root().await?;
        if self.location == RemoteLocation::RecordFolder {
            return Ok(true);
        }
        let name = self.record_id.as_str().to_string();
        match self.session.change_folder(&name).await {
            Ok(()) => {
                self.location = RemoteLocation::RecordFolder;
                Ok(true)
            }
            Err(err) if err.is_not_found() && create => {
                self.session.make_folder(&name).await?;
                self.session.change_folder(&name).await?;
                self.location = RemoteLocation::RecordFolder;
                Ok(true)
            }
            Err(err) if err.is_not_found() => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Locate and fetch the prior manifest into `dest_dir`.
    ///
    /// Absence of the per-record folder or of the manifest file means
    /// "first export" and yields `Ok(None)`; the folder is never created on
    /// this read path.
    pub async fn fetch_prior_manifest(
        &mut self,
        dest_dir: &Path,
    ) -> Result<Option<PathBuf>, TransferError> {
        let folder_exists = self.enter_record_folder(false).await?;
        self.set_state(ReconcileState::PriorManifestChecked);
        if !folder_exists {
            tracing::info!(record_id = %self.record_id, "no prior export folder, first export");
            return Ok(None);
        }

        let manifest_name = self.manifest_name();
        let names = self.session.list().await?;
        if !names.iter().any(|name| *name == manifest_name) {
            tracing::info!(record_id = %self.record_id, "no prior manifest in export folder");
            return Ok(None);
        }

        let fetched = self.session.download(&manifest_name, dest_dir).await?;
        tracing::info!(manifest = %manifest_name, "fetched prior manifest");
        Ok(Some(fetched))
    }

    /// Rename the fetched prior manifest by appending a millisecond epoch
    /// suffix. The backup travels with the staging set on upload, so each
    /// re-export adds exactly one distinctly-suffixed backup remotely and
    /// never touches earlier ones.
    pub fn backup_prior_manifest(
        &mut self,
        fetched: &Path,
        epoch_millis: i64,
    ) -> Result<PathBuf, ArcaError> {
        let name = fetched
            .file_name()
            .and_then(|name| name.to_str())
            .ok_or_else(|| ArcaError::Io(format!("{} has no filename", fetched.display())))?;
        let backup = fetched.with_file_name(format!("{name}-{epoch_millis}"));
        std::fs::rename(fetched, &backup)
            .map_err(|err| ArcaError::Io(format!("backup rename failed: {err}")))?;
        tracing::info!(backup = %backup.display(), "prior manifest kept as backup");
        self.set_state(ReconcileState::BackedUp);
        Ok(backup)
    }

    /// Record that the local staging directory is complete.
    pub fn mark_staged(&mut self) {
        self.set_state(ReconcileState::LocalStaged);
    }

    /// Diff the remote folder against the staged file set, prune orphaned
    /// remote images and upload everything staged, overwriting same-named
    /// remote files. The per-record folder is created here on demand.
    pub async fn sync(&mut self, staging: &Path) -> Result<SyncReport, TransferError> {
        let mut report = SyncReport::default();
        self.enter_record_folder(true).await?;

        let local = list_local_files(staging).await.map_err(|err| {
            TransferError::Io(format!("cannot list staging directory: {err}"))
        })?;

        // prune: remote images that are no longer part of the selection
        match self.session.list().await {
            Ok(remote_names) => {
                for name in remote_names {
                    if !is_image_name(&name) || local.contains_key(&name) {
                        continue;
                    }
                    match self.session.delete(&name).await {
                        Ok(()) => {
                            tracing::info!(file = %name, "pruned deselected remote image");
                            report.pruned += 1;
                        }
                        Err(err) => {
                            tracing::warn!(file = %name, error = %err, "failed to prune remote image");
                            report.failures.push(format!("delete {name}: {err}"));
                        }
                    }
                }
            }
            Err(err) => {
                tracing::warn!(error = %err, "cannot list remote folder, skipping prune");
                report.failures.push(format!("list: {err}"));
            }
        }
        self.set_state(ReconcileState::Diffed);

        // upload: images, manifest and any backup file
        for (name, path) in &local {
            match self.session.upload(path).await {
                Ok(()) => {
                    tracing::debug!(file = %name, "uploaded");
                    report.uploaded += 1;
                }
                Err(err) => {
                    tracing::warn!(file = %name, error = %err, "failed to upload");
                    report.failures.push(format!("upload {name}: {err}"));
                }
            }
        }
        self.set_state(ReconcileState::Synced);

        Ok(report)
    }

    /// Close the transfer session. Failures are logged, not raised.
    pub async fn close(&mut self) {
        if let Err(err) = self.session.close().await {
            tracing::warn!(error = %err, "failed to close transfer session");
        }
        self.set_state(ReconcileState::Disconnected);
    }
}

fn is_image_name(name: &str) -> bool {
    Path::new(name)
        .extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| {
            IMAGE_EXTENSIONS
                .iter()
                .any(|image_ext| ext.eq_ignore_ascii_case(image_ext))
        })
        .unwrap_or(false)
}

async fn list_local_files(dir: &Path) -> std::io::Result<BTreeMap<String, PathBuf>> {
    let mut files = BTreeMap::new();
    let mut entries = fs::read_dir(dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        if !entry.file_type().await?.is_file() {
            continue;
        }
        if let Some(name) = entry.file_name().to_str() {
            files.insert(name.to_string(), entry.path());
        }
    }
    Ok(files)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::adapters::transfer::MirrorSession;
    use tempfile::TempDir;

    async fn reconciler(remote: &TempDir, record_id: &str) -> RemoteReconciler {
        let session = MirrorSession::open(remote.path()).await.unwrap();
        RemoteReconciler::new(
            Box::new(session),
            "upload",
            RecordId::new(record_id).unwrap(),
        )
    }

    fn stage_file(staging: &TempDir, name: &str, content: &[u8]) {
        std::fs::write(staging.path().join(name), content).unwrap();
    }

    #[test]
    fn test_image_name_extensions() {
        assert!(is_image_name("a.tif"));
        assert!(is_image_name("B.JPG"));
        assert!(is_image_name("x.Tif"));
        assert!(!is_image_name("123.json"));
        assert!(!is_image_name("123.json-1700000000000"));
        assert!(!is_image_name("noext"));
    }

    #[tokio::test]
    async fn test_fetch_without_root_folder_is_error() {
        let remote = TempDir::new().unwrap();
        let staging = TempDir::new().unwrap();
        let mut reconciler = reconciler(&remote, "1").await;
        // configured remote root itself is missing
        assert!(reconciler
            .fetch_prior_manifest(staging.path())
            .await
            .is_err());
    }

    #[tokio::test]
    async fn test_fetch_first_export_yields_none() {
        let remote = TempDir::new().unwrap();
        std::fs::create_dir(remote.path().join("upload")).unwrap();
        let staging = TempDir::new().unwrap();
        let mut reconciler = reconciler(&remote, "1").await;
        let fetched = reconciler.fetch_prior_manifest(staging.path()).await.unwrap();
        assert!(fetched.is_none());
        assert_eq!(reconciler.state(), ReconcileState::PriorManifestChecked);
        // the read path must not create the per-record folder
        assert!(!remote.path().join("upload/1").exists());
    }

    #[tokio::test]
    async fn test_fetch_downloads_existing_manifest() {
        let remote = TempDir::new().unwrap();
        std::fs::create_dir_all(remote.path().join("upload/1")).unwrap();
        std::fs::write(remote.path().join("upload/1/1.json"), b"{}").unwrap();
        let staging = TempDir::new().unwrap();

        let mut reconciler = reconciler(&remote, "1").await;
        let fetched = reconciler
            .fetch_prior_manifest(staging.path())
            .await
            .unwrap()
            .unwrap();
        assert_eq!(std::fs::read(&fetched).unwrap(), b"{}");
    }

    #[tokio::test]
    async fn test_backup_appends_millis_suffix() {
        let remote = TempDir::new().unwrap();
        std::fs::create_dir(remote.path().join("upload")).unwrap();
        let staging = TempDir::new().unwrap();
        let fetched = staging.path().join("1.json");
        std::fs::write(&fetched, b"{}").unwrap();

        let mut reconciler = reconciler(&remote, "1").await;
        let backup = reconciler
            .backup_prior_manifest(&fetched, 1700000000000)
            .unwrap();
        assert!(!fetched.exists());
        assert_eq!(
            backup.file_name().unwrap().to_str().unwrap(),
            "1.json-1700000000000"
        );
        assert_eq!(reconciler.state(), ReconcileState::BackedUp);
    }

    #[tokio::test]
    async fn test_sync_creates_folder_prunes_and_uploads() {
        let remote = TempDir::new().unwrap();
        std::fs::create_dir_all(remote.path().join("upload/1")).unwrap();
        // remote has an image that is no longer selected and one that still is
        std::fs::write(remote.path().join("upload/1/old.tif"), b"old").unwrap();
        std::fs::write(remote.path().join("upload/1/keep.tif"), b"stale").unwrap();
        // non-image files survive the prune
        std::fs::write(remote.path().join("upload/1/1.json-99"), b"backup").unwrap();

        let staging = TempDir::new().unwrap();
        stage_file(&staging, "keep.tif", b"fresh");
        stage_file(&staging, "1.json", b"{}");

        let mut reconciler = reconciler(&remote, "1").await;
        let report = reconciler.sync(staging.path()).await.unwrap();

        assert_eq!(report.pruned, 1);
        assert_eq!(report.uploaded, 2);
        assert!(report.failures.is_empty());
        assert_eq!(reconciler.state(), ReconcileState::Synced);

        assert!(!remote.path().join("upload/1/old.tif").exists());
        assert_eq!(
            std::fs::read(remote.path().join("upload/1/keep.tif")).unwrap(),
            b"fresh"
        );
        assert!(remote.path().join("upload/1/1.json").exists());
        assert!(remote.path().join("upload/1/1.json-99").exists());
    }

    #[tokio::test]
    async fn test_sync_creates_record_folder_on_demand() {
        let remote = TempDir::new().unwrap();
        std::fs::create_dir(remote.path().join("upload")).unwrap();
        let staging = TempDir::new().unwrap();
        stage_file(&staging, "a.tif", b"img");

        let mut reconciler = reconciler(&remote, "42").await;
        let report = reconciler.sync(staging.path()).await.unwrap();
        assert_eq!(report.uploaded, 1);
        assert!(remote.path().join("upload/42/a.tif").exists());
    }

    #[tokio::test]
    async fn test_fetch_then_sync_reuses_record_folder() {
        let remote = TempDir::new().unwrap();
        std::fs::create_dir_all(remote.path().join("upload/7")).unwrap();
        std::fs::write(remote.path().join("upload/7/7.json"), b"{}").unwrap();
        let staging = TempDir::new().unwrap();

        let mut reconciler = reconciler(&remote, "7").await;
        let fetched = reconciler
            .fetch_prior_manifest(staging.path())
            .await
            .unwrap();
        assert!(fetched.is_some());

        stage_file(&staging, "7.json", b"{\"new\":1}");
        let report = reconciler.sync(staging.path()).await.unwrap();
        // fetched manifest was renamed locally in real runs; here the fresh
        // manifest plus the downloaded copy both count as staged files
        assert!(report.uploaded >= 1);
        assert!(report.failures.is_empty());
    }
}
