//! Domain identifier types with validation
//!
//! Newtype wrappers for the identifiers the engine hands around, so a
//! registry id can't be confused with an arbitrary string.

use crate::domain::errors::ArcaError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Registry record identifier newtype wrapper
///
/// The identifier of a record in the receiving registry. Carried as a
/// string (it names remote folders and manifest files) but required to be
/// numeric wherever the manifest format demands an integer.
///
/// # Examples
///
/// ```
/// use arca::domain::ids::RecordId;
/// use std::str::FromStr;
///
/// let id = RecordId::from_str("118009").unwrap();
/// assert_eq!(id.as_str(), "118009");
/// assert_eq!(id.numeric().unwrap(), 118009);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordId(String);

impl RecordId {
    /// Creates a new RecordId from a string
    ///
    /// # Errors
    ///
    /// Returns `Err` if the id is empty or whitespace-only
    pub fn new(id: impl Into<String>) -> Result<Self, String> {
        let id = id.into();
        if id.trim().is_empty() {
            return Err("Record id cannot be empty".to_string());
        }
        Ok(Self(id))
    }

    /// Returns the record id as a string slice
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Consumes self and returns the inner String
    pub fn into_inner(self) -> String {
        self.0
    }

    /// The id as an integer, as required by the manifest header and
    /// `external_id`-kind fields.
    ///
    /// # Errors
    ///
    /// Returns [`ArcaError::MalformedRecordId`] if the id is not numeric
    pub fn numeric(&self) -> Result<i64, ArcaError> {
        self.0
            .trim()
            .parse()
            .map_err(|_| ArcaError::MalformedRecordId(self.0.clone()))
    }
}

impl fmt::Display for RecordId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for RecordId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::new(s)
    }
}

impl AsRef<str> for RecordId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
