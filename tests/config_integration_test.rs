//! Configuration loading integration tests

use arca::config::{load_config, TransferMode};
use secrecy::ExposeSecret;
use std::io::Write;
use tempfile::NamedTempFile;

const FULL_CONFIG: &str = r#"
[application]
log_level = "debug"
retain_staging = false

[logging]
local_enabled = false

[[project]]
name = "Monuments"
selection_property = "export selection"
record_id_metadata = "RegistryId"
manifest_root = "Media"

[[project.field]]
name = "Id"
kind = "identifier"

[[project.field]]
name = "Dateiinformation"
kind = "filename"

[[project.field]]
name = "Beschreibung"
kind = "metadata"
value = "Description"

[project.transfer]
mode = "sftp"
host = "registry.example.org"
username = "export"
password = "${ARCA_TEST_TRANSFER_PASSWORD}"
known_hosts = "/etc/arca/known_hosts"
remote_folder = "/upload"

[[project]]
name = "*"
selection_property = "export selection"
manifest_root = "Media"

[[project.field]]
name = "Id"
kind = "identifier"

[project.transfer]
mode = "mirror"
remote_folder = "upload"
mirror_dir = "/tmp/arca-mirror"
"#;

fn write_config(contents: &str) -> NamedTempFile {
    let mut file = NamedTempFile::new().unwrap();
    file.write_all(contents.as_bytes()).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn full_config_loads_with_env_substitution() {
    std::env::set_var("ARCA_TEST_TRANSFER_PASSWORD", "s3cret");
    let file = write_config(FULL_CONFIG);
    let config = load_config(file.path()).unwrap();
    std::env::remove_var("ARCA_TEST_TRANSFER_PASSWORD");

    assert_eq!(config.application.log_level, "debug");
    assert_eq!(config.projects.len(), 2);

    let monuments = config.project("Monuments").unwrap();
    assert_eq!(monuments.transfer.mode, TransferMode::Sftp);
    assert_eq!(monuments.transfer.port, 22);
    assert_eq!(
        monuments
            .transfer
            .password
            .as_ref()
            .unwrap()
            .expose_secret()
            .as_ref(),
        "s3cret"
    );
    // unknown projects fall back to the wildcard profile
    assert_eq!(config.project("Paintings").unwrap().name, "*");
}

#[test]
fn missing_env_variable_fails_loading() {
    std::env::remove_var("ARCA_TEST_UNSET_PASSWORD");
    let contents = FULL_CONFIG.replace("ARCA_TEST_TRANSFER_PASSWORD", "ARCA_TEST_UNSET_PASSWORD");
    let file = write_config(&contents);
    let err = load_config(file.path()).unwrap_err();
    assert!(err.to_string().contains("ARCA_TEST_UNSET_PASSWORD"));
}

#[test]
fn sftp_without_credentials_is_rejected() {
    let contents = r#"
[application]
log_level = "info"

[[project]]
name = "*"
selection_property = "export selection"
manifest_root = "Media"

[[project.field]]
name = "Id"
kind = "identifier"

[project.transfer]
mode = "sftp"
host = "registry.example.org"
username = "export"
remote_folder = "/upload"
"#;
    let file = write_config(contents);
    assert!(load_config(file.path()).is_err());
}

#[test]
fn secrets_are_redacted_in_debug_output() {
    std::env::set_var("ARCA_TEST_REDACTED_PASSWORD", "s3cret");
    let contents =
        FULL_CONFIG.replace("ARCA_TEST_TRANSFER_PASSWORD", "ARCA_TEST_REDACTED_PASSWORD");
    let file = write_config(&contents);
    let config = load_config(file.path()).unwrap();
    std::env::remove_var("ARCA_TEST_REDACTED_PASSWORD");

    let debug_output = format!("{config:?}");
    assert!(!debug_output.contains("s3cret"));
}
