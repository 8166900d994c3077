//! Transfer session abstraction
//!
//! The engine consumes the remote store through this trait only.
//! Implementations own the connection state and the current remote folder;
//! every operation is relative to that folder.

use crate::domain::errors::TransferError;
use async_trait::async_trait;
use std::path::{Path, PathBuf};

/// A stateful remote transfer session.
#[async_trait]
pub trait TransferSession: Send {
    /// Change the current remote folder.
    ///
    /// Navigating into a missing folder fails with
    /// [`TransferError::NotFound`], which callers treat as the absence of
    /// prior export data rather than a hard failure.
    async fn change_folder(&mut self, name: &str) -> Result<(), TransferError>;

    /// Names in the current remote folder, sorted.
    async fn list(&mut self) -> Result<Vec<String>, TransferError>;

    /// Download a file from the current remote folder into `dest_dir` and
    /// return the local path.
    async fn download(&mut self, name: &str, dest_dir: &Path) -> Result<PathBuf, TransferError>;

    /// Upload a local file into the current remote folder, overwriting any
    /// same-named remote file.
    async fn upload(&mut self, local: &Path) -> Result<(), TransferError>;

    /// Create a subfolder of the current remote folder.
    async fn make_folder(&mut self, name: &str) -> Result<(), TransferError>;

    /// Delete a file in the current remote folder.
    async fn delete(&mut self, name: &str) -> Result<(), TransferError>;

    /// Close the session. Safe to call once at the end of a run.
    async fn close(&mut self) -> Result<(), TransferError>;
}
