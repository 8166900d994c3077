//! Configuration schema types

use crate::config::SecretString;
use crate::domain::fields::{FieldDefinition, FieldKind};
use serde::{Deserialize, Serialize};

/// Transfer backend selection
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransferMode {
    /// SFTP over SSH
    Sftp,
    /// Local directory mirror (tests, offline runs)
    Mirror,
}

/// Main configuration
///
/// This is the root structure that maps to the TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ArcaConfig {
    /// Application-level settings
    pub application: ApplicationConfig,

    /// Per-project export profiles. The profile named "*" is the wildcard
    /// fallback used when no exact project name matches.
    #[serde(rename = "project")]
    pub projects: Vec<ProjectConfig>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,
}

impl ArcaConfig {
    /// Select a project profile: exact name match first, wildcard second.
    pub fn project(&self, name: &str) -> Option<&ProjectConfig> {
        self.projects
            .iter()
            .find(|project| project.name == name)
            .or_else(|| self.projects.iter().find(|project| project.name == "*"))
    }

    /// Validates the configuration
    ///
    /// # Errors
    ///
    /// Returns an error if any configuration values are invalid
    pub fn validate(&self) -> Result<(), String> {
        self.application.validate()?;
        if self.projects.is_empty() {
            return Err("at least one [[project]] section is required".to_string());
        }
        for project in &self.projects {
            project.validate()?;
        }
        self.logging.validate()?;
        Ok(())
    }
}

/// Application-level configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApplicationConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub log_level: String,

    /// Keep staging directories after every run (diagnosis)
    #[serde(default)]
    pub retain_staging: bool,
}

impl ApplicationConfig {
    fn validate(&self) -> Result<(), String> {
        let valid_levels = ["trace", "debug", "info", "warn", "error"];
        if !valid_levels.contains(&self.log_level.as_str()) {
            return Err(format!(
                "Invalid log_level '{}'. Must be one of: {}",
                self.log_level,
                valid_levels.join(", ")
            ));
        }
        Ok(())
    }
}

/// One project's export profile
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Project name; "*" marks the wildcard fallback profile
    pub name: String,

    /// Name of the record property holding the serialized image selection
    pub selection_property: String,

    /// Record-level metadata field carrying the registry id
    #[serde(default = "default_record_id_metadata")]
    pub record_id_metadata: String,

    /// Per-image metadata field whose value renames the staged derivative
    #[serde(default = "default_shelfmark_metadata")]
    pub shelfmark_metadata: String,

    /// Root element name of the manifest's record list
    pub manifest_root: String,

    /// Output field mapping, in manifest order
    #[serde(rename = "field")]
    pub fields: Vec<FieldDefinition>,

    /// Transfer connection parameters
    pub transfer: TransferConfig,
}

impl ProjectConfig {
    fn validate(&self) -> Result<(), String> {
        if self.name.trim().is_empty() {
            return Err("project name must not be empty".to_string());
        }
        if self.selection_property.trim().is_empty() {
            return Err(format!(
                "project '{}': selection_property must not be empty",
                self.name
            ));
        }
        if self.manifest_root.trim().is_empty() {
            return Err(format!(
                "project '{}': manifest_root must not be empty",
                self.name
            ));
        }
        if self.fields.is_empty() {
            return Err(format!(
                "project '{}': at least one [[project.field]] is required",
                self.name
            ));
        }
        // identifier recovery is keyed through these two kinds, a second
        // column of either kind would make the mapping ambiguous
        for kind in [FieldKind::Filename, FieldKind::Identifier] {
            let count = self.fields.iter().filter(|field| field.kind == kind).count();
            if count > 1 {
                return Err(format!(
                    "project '{}': at most one field of kind {kind:?} is allowed",
                    self.name
                ));
            }
        }
        self.transfer.validate(&self.name)
    }
}

/// Transfer connection parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransferConfig {
    pub mode: TransferMode,

    /// SFTP host name
    #[serde(default)]
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub username: String,

    /// Account password, or the keyfile passphrase when a keyfile is set
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password: Option<SecretString>,

    /// Path to a private keyfile
    #[serde(default)]
    pub keyfile: Option<String>,

    /// Path to an OpenSSH known-hosts file; host key checking is skipped
    /// when unset
    #[serde(default)]
    pub known_hosts: Option<String>,

    /// Remote working folder holding one subfolder per record
    pub remote_folder: String,

    /// Per-operation timeout in seconds
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Root directory of the `mirror` mode target
    #[serde(default)]
    pub mirror_dir: Option<String>,
}

impl TransferConfig {
    fn validate(&self, project: &str) -> Result<(), String> {
        if self.remote_folder.trim().is_empty() {
            return Err(format!(
                "project '{project}': transfer.remote_folder must not be empty"
            ));
        }
        match self.mode {
            TransferMode::Sftp => {
                if self.host.trim().is_empty() {
                    return Err(format!(
                        "project '{project}': transfer.host is required for sftp mode"
                    ));
                }
                if self.username.trim().is_empty() {
                    return Err(format!(
                        "project '{project}': transfer.username is required for sftp mode"
                    ));
                }
                if self.password.is_none() && self.keyfile.is_none() {
                    return Err(format!(
                        "project '{project}': sftp mode needs a password or a keyfile"
                    ));
                }
            }
            TransferMode::Mirror => {
                if self.mirror_dir.is_none() {
                    return Err(format!(
                        "project '{project}': transfer.mirror_dir is required for mirror mode"
                    ));
                }
            }
        }
        Ok(())
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Write a JSON log file in addition to console output
    #[serde(default)]
    pub local_enabled: bool,

    /// Directory for log files
    #[serde(default = "default_log_path")]
    pub local_path: String,

    /// Rotation: "daily" or "hourly"
    #[serde(default = "default_rotation")]
    pub local_rotation: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            local_enabled: false,
            local_path: default_log_path(),
            local_rotation: default_rotation(),
        }
    }
}

impl LoggingConfig {
    fn validate(&self) -> Result<(), String> {
        let valid = ["daily", "hourly"];
        if !valid.contains(&self.local_rotation.as_str()) {
            return Err(format!(
                "Invalid local_rotation '{}'. Must be one of: {}",
                self.local_rotation,
                valid.join(", ")
            ));
        }
        Ok(())
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_record_id_metadata() -> String {
    "RegistryId".to_string()
}

fn default_shelfmark_metadata() -> String {
    "shelfmarksource".to_string()
}

fn default_port() -> u16 {
    22
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_log_path() -> String {
    "logs".to_string()
}

fn default_rotation() -> String {
    "daily".to_string()
}
