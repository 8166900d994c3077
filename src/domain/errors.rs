//! Domain error types
//!
//! Error hierarchy for the export engine. All errors are domain-specific
//! and don't expose third-party types.

use thiserror::Error;

/// Main error type
///
/// This is the primary error type used throughout the application.
#[derive(Debug, Error)]
pub enum ArcaError {
    /// Configuration-related errors
    #[error("Configuration error: {0}")]
    Configuration(String),

    /// The record carries no registry id
    #[error("The record does not contain a registry id")]
    MissingRecordId,

    /// The registry id cannot be used where a number is required
    #[error("Registry id is not numeric: {0}")]
    MalformedRecordId(String),

    /// The selection property is absent or parsed to zero entries
    #[error("The record has no images selected: {0}")]
    EmptyOrMissingSelection(String),

    /// The selection payload is present but unparseable
    #[error("Malformed image selection: {0}")]
    MalformedSelection(String),

    /// A selected image has no descriptive node attached to its page
    #[error("Selected image is not assigned to the record structure: {0}")]
    UnassignedImage(String),

    /// Record document errors
    #[error("Record document error: {0}")]
    Metadata(String),

    /// Derivative generation errors
    #[error("Imaging error: {0}")]
    Imaging(String),

    /// Remote transfer errors
    #[error("Transfer error: {0}")]
    Transfer(#[from] TransferError),

    /// Serialization/deserialization errors
    #[error("Serialization error: {0}")]
    Serialization(String),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(String),
}

impl ArcaError {
    /// User-abort conditions stop the run before any remote mutation and
    /// are reported to the invoking workflow as a failed run with a
    /// readable message, not as a crash.
    pub fn is_user_abort(&self) -> bool {
        matches!(
            self,
            ArcaError::MissingRecordId
                | ArcaError::EmptyOrMissingSelection(_)
                | ArcaError::UnassignedImage(_)
        )
    }
}

/// Transport-boundary errors raised by transfer sessions
///
/// These errors don't expose the underlying SSH library types.
#[derive(Debug, Error)]
pub enum TransferError {
    /// Failed to reach or handshake with the transfer host
    #[error("Failed to connect to transfer host: {0}")]
    ConnectionFailed(String),

    /// Authentication rejected
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Remote file or folder does not exist
    #[error("Remote path not found: {0}")]
    NotFound(String),

    /// An operation exceeded the configured timeout
    #[error("Operation timed out: {0}")]
    Timeout(String),

    /// Host key verification against the known-hosts file failed
    #[error("Host key verification failed: {0}")]
    HostKeyMismatch(String),

    /// Local I/O while staging a transfer
    #[error("I/O error: {0}")]
    Io(String),

    /// Any other protocol-level failure
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl TransferError {
    /// Recoverable remote-absence: navigating to a folder or file that does
    /// not exist yet means "first export", not a hard failure.
    pub fn is_not_found(&self) -> bool {
        matches!(self, TransferError::NotFound(_))
    }
}

// Conversion from std::io::Error
impl From<std::io::Error> for ArcaError {
    fn from(err: std::io::Error) -> Self {
        ArcaError::Io(err.to_string())
    }
}

// Conversion from serde_json::Error
impl From<serde_json::Error> for ArcaError {
    fn from(err: serde_json::Error) -> Self {
        ArcaError::Serialization(err.to_string())
    }
}

// Conversion from toml parse errors
impl From<toml::de::Error> for ArcaError {
    fn from(err: toml::de::Error) -> Self {
        ArcaError::Configuration(format!("TOML parse error: {err}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = ArcaError::Configuration("Invalid config".to_string());
        assert_eq!(err.to_string(), "Configuration error: Invalid config");
    }

    #[test]
    fn test_transfer_error_conversion() {
        let transfer_err = TransferError::ConnectionFailed("Network error".to_string());
        let err: ArcaError = transfer_err.into();
        assert!(matches!(err, ArcaError::Transfer(_)));
    }

    #[test]
    fn test_user_abort_classification() {
        assert!(ArcaError::MissingRecordId.is_user_abort());
        assert!(ArcaError::EmptyOrMissingSelection("empty".to_string()).is_user_abort());
        assert!(ArcaError::UnassignedImage("a.tif".to_string()).is_user_abort());
        assert!(!ArcaError::MalformedRecordId("x".to_string()).is_user_abort());
        assert!(!ArcaError::Io("disk".to_string()).is_user_abort());
    }

    #[test]
    fn test_not_found_is_recoverable() {
        assert!(TransferError::NotFound("123".to_string()).is_not_found());
        assert!(!TransferError::Timeout("list".to_string()).is_not_found());
    }

    #[test]
    fn test_io_error_conversion() {
        let io_err = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let err: ArcaError = io_err.into();
        assert!(matches!(err, ArcaError::Io(_)));
    }

    #[test]
    fn test_errors_implement_std_error() {
        let err = ArcaError::MissingRecordId;
        let _: &dyn std::error::Error = &err;
        let err = TransferError::NotFound("x".to_string());
        let _: &dyn std::error::Error = &err;
    }
}
