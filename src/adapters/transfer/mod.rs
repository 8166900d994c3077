//! Remote transfer sessions
//!
//! The reconciler drives the remote store exclusively through the
//! [`TransferSession`] trait. The factory picks the backend from the
//! project's transfer configuration.

pub mod mirror;
pub mod sftp;
pub mod traits;

pub use mirror::MirrorSession;
pub use sftp::SftpSession;
pub use traits::TransferSession;

use crate::config::schema::{TransferConfig, TransferMode};
use crate::domain::errors::TransferError;

/// Open a transfer session for the configured backend.
pub async fn connect(config: &TransferConfig) -> Result<Box<dyn TransferSession>, TransferError> {
    match config.mode {
        TransferMode::Sftp => Ok(Box::new(SftpSession::connect(config).await?)),
        TransferMode::Mirror => {
            let root = config.mirror_dir.as_deref().ok_or_else(|| {
                TransferError::ConnectionFailed(
                    "mirror mode requires mirror_dir to be configured".to_string(),
                )
            })?;
            Ok(Box::new(MirrorSession::open(root).await?))
        }
    }
}
