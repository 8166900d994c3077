//! Init command - writes a commented example configuration

use clap::Args;
use std::path::PathBuf;

const EXAMPLE_CONFIG: &str = r#"# Arca configuration

[application]
log_level = "info"
# keep staging directories after every run (diagnosis)
retain_staging = false

[logging]
local_enabled = false
local_path = "logs"
local_rotation = "daily"

# One profile per project; the profile named "*" is the fallback.
[[project]]
name = "*"
# record property holding the serialized image selection
selection_property = "export selection"
# record-level metadata field carrying the registry id
record_id_metadata = "RegistryId"
# per-image metadata field whose value renames the staged derivative
shelfmark_metadata = "shelfmarksource"
# root element of the manifest's record list
manifest_root = "Media"

# Output fields, in manifest order.
# kinds: static, metadata, filename, representative, date, external_id, identifier
[[project.field]]
name = "Id"
kind = "identifier"

[[project.field]]
name = "Dateiinformation"
kind = "filename"

[[project.field]]
name = "Hauptfoto"
kind = "representative"

[[project.field]]
name = "Beschreibung"
kind = "metadata"
value = "Description"

[[project.field]]
name = "Quelle"
kind = "static"
value = "Digitization workflow"

[[project.field]]
name = "Exportdatum"
kind = "date"

[[project.field]]
name = "Objekt-ID"
kind = "external_id"

[project.transfer]
mode = "sftp"
host = "registry.example.org"
port = 22
username = "export"
# password = "${ARCA_TRANSFER_PASSWORD}"
keyfile = "/etc/arca/export_key"
known_hosts = "/etc/arca/known_hosts"
remote_folder = "/upload"
timeout_secs = 30
"#;

/// Arguments for the init command
#[derive(Args, Debug)]
pub struct InitArgs {
    /// Where to write the configuration file
    #[arg(long, default_value = "arca.toml")]
    pub output: PathBuf,

    /// Overwrite an existing file
    #[arg(long)]
    pub force: bool,
}

impl InitArgs {
    /// Execute the init command
    pub async fn execute(&self) -> anyhow::Result<i32> {
        if self.output.exists() && !self.force {
            eprintln!(
                "{} already exists, use --force to overwrite",
                self.output.display()
            );
            return Ok(2);
        }
        std::fs::write(&self.output, EXAMPLE_CONFIG)?;
        println!("Wrote example configuration to {}", self.output.display());
        Ok(0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::load_config;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_init_writes_loadable_config() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("arca.toml");
        let args = InitArgs {
            output: output.clone(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 0);
        // the generated example must pass the loader's validation
        let config = load_config(&output).unwrap();
        assert_eq!(config.projects.len(), 1);
        assert_eq!(config.projects[0].fields.len(), 7);
    }

    #[tokio::test]
    async fn test_init_refuses_overwrite_without_force() {
        let dir = TempDir::new().unwrap();
        let output = dir.path().join("arca.toml");
        std::fs::write(&output, "existing").unwrap();
        let args = InitArgs {
            output: output.clone(),
            force: false,
        };
        assert_eq!(args.execute().await.unwrap(), 2);
        assert_eq!(std::fs::read_to_string(&output).unwrap(), "existing");
    }
}
