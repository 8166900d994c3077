//! Result type alias used throughout the crate

use crate::domain::errors::ArcaError;

/// Convenience alias for `std::result::Result<T, ArcaError>`
pub type Result<T> = std::result::Result<T, ArcaError>;
