//! Local-directory mirror session
//!
//! A transfer target rooted at a local directory. Used for the `mirror`
//! transfer mode and throughout the integration tests, where it stands in
//! for the remote store with identical navigation semantics.

use crate::adapters::transfer::traits::TransferSession;
use crate::domain::errors::TransferError;
use async_trait::async_trait;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::debug;

pub struct MirrorSession {
    root: PathBuf,
    cwd: PathBuf,
}

impl MirrorSession {
    /// Open a session rooted at `root`. The root itself must exist; like a
    /// remote login directory it is never created by the session.
    pub async fn open(root: impl Into<PathBuf>) -> Result<Self, TransferError> {
        let root = root.into();
        let exists = fs::try_exists(&root).await.map_err(map_io)?;
        if !exists {
            return Err(TransferError::ConnectionFailed(format!(
                "mirror root {} does not exist",
                root.display()
            )));
        }
        Ok(Self {
            cwd: root.clone(),
            root,
        })
    }

    /// Folder paths starting with `/` are taken relative to the mirror
    /// root, everything else relative to the current folder.
    fn resolve(&self, name: &str) -> PathBuf {
        match name.strip_prefix('/') {
            Some(rooted) => self.root.join(rooted),
            None => self.cwd.join(name),
        }
    }
}

#[async_trait]
impl TransferSession for MirrorSession {
    async fn change_folder(&mut self, name: &str) -> Result<(), TransferError> {
        let target = self.resolve(name);
        match fs::metadata(&target).await {
            Ok(meta) if meta.is_dir() => {
                debug!(folder = %target.display(), "changed mirror folder");
                self.cwd = target;
                Ok(())
            }
            Ok(_) => Err(TransferError::NotFound(format!("{name} is not a folder"))),
            Err(err) if err.kind() == ErrorKind::NotFound => {
                Err(TransferError::NotFound(name.to_string()))
            }
            Err(err) => Err(map_io(err)),
        }
    }

    async fn list(&mut self) -> Result<Vec<String>, TransferError> {
        let mut names = Vec::new();
        let mut entries = fs::read_dir(&self.cwd).await.map_err(map_io)?;
        while let Some(entry) = entries.next_entry().await.map_err(map_io)? {
            if let Some(name) = entry.file_name().to_str() {
                names.push(name.to_string());
            }
        }
        names.sort();
        Ok(names)
    }

    async fn download(&mut self, name: &str, dest_dir: &Path) -> Result<PathBuf, TransferError> {
        let source = self.cwd.join(name);
        let dest = dest_dir.join(name);
        fs::copy(&source, &dest).await.map_err(map_io)?;
        debug!(file = %name, dest = %dest.display(), "downloaded from mirror");
        Ok(dest)
    }

    async fn upload(&mut self, local: &Path) -> Result<(), TransferError> {
        let name = local
            .file_name()
            .ok_or_else(|| TransferError::Io(format!("{} has no filename", local.display())))?;
        fs::copy(local, self.cwd.join(name)).await.map_err(map_io)?;
        debug!(file = ?name, "uploaded to mirror");
        Ok(())
    }

    async fn make_folder(&mut self, name: &str) -> Result<(), TransferError> {
        fs::create_dir(self.resolve(name)).await.map_err(map_io)?;
        debug!(folder = %name, "created mirror folder");
        Ok(())
    }

    async fn delete(&mut self, name: &str) -> Result<(), TransferError> {
        fs::remove_file(self.cwd.join(name)).await.map_err(map_io)
    }

    async fn close(&mut self) -> Result<(), TransferError> {
        Ok(())
    }
}

fn map_io(err: std::io::Error) -> TransferError {
    match err.kind() {
        ErrorKind::NotFound => TransferError::NotFound(err.to_string()),
        _ => TransferError::Io(err.to_string()),
    }
}
