//! Configuration loader with TOML parsing and environment variable overrides
//!
//! Loading order: read the file, substitute `${VAR}` placeholders from the
//! environment (comment lines are left alone), parse the TOML, apply
//! `ARCA_*` overrides, validate.

use super::schema::ArcaConfig;
use crate::config::secret_string;
use crate::domain::errors::ArcaError;
use crate::domain::result::Result;
use regex::Regex;
use std::fs;
use std::path::Path;

/// Loads configuration from a TOML file
///
/// # Errors
///
/// Returns an error if the file cannot be read, a referenced environment
/// variable is missing, the TOML is malformed, or validation fails.
pub fn load_config(path: impl AsRef<Path>) -> Result<ArcaConfig> {
    let path = path.as_ref();

    if !path.exists() {
        return Err(ArcaError::Configuration(format!(
            "Configuration file not found: {}",
            path.display()
        )));
    }

    let contents = fs::read_to_string(path).map_err(|err| {
        ArcaError::Configuration(format!(
            "Failed to read configuration file {}: {err}",
            path.display()
        ))
    })?;

    let contents = substitute_env_vars(&contents)?;

    let mut config: ArcaConfig = toml::from_str(&contents)
        .map_err(|err| ArcaError::Configuration(format!("Failed to parse TOML: {err}")))?;

    apply_env_overrides(&mut config);

    config
        .validate()
        .map_err(|err| ArcaError::Configuration(format!("Configuration validation failed: {err}")))?;

    Ok(config)
}

/// Substitutes environment variables in the format ${VAR_NAME}
fn substitute_env_vars(input: &str) -> Result<String> {
    let re = Regex::new(r"\$\{([A-Z_][A-Z0-9_]*)\}").expect("static pattern");
    let mut result = String::new();
    let mut missing_vars = Vec::new();

    for line in input.lines() {
        // leave comment lines alone
        if line.trim_start().starts_with('#') {
            result.push_str(line);
            result.push('\n');
            continue;
        }

        let mut processed_line = line.to_string();
        for capture in re.captures_iter(line) {
            let var_name = &capture[1];
            match std::env::var(var_name) {
                Ok(value) => {
                    let placeholder = format!("${{{var_name}}}");
                    processed_line = processed_line.replace(&placeholder, &value);
                }
                Err(_) => {
                    if !missing_vars.contains(&var_name.to_string()) {
                        missing_vars.push(var_name.to_string());
                    }
                }
            }
        }
        result.push_str(&processed_line);
        result.push('\n');
    }

    if !missing_vars.is_empty() {
        return Err(ArcaError::Configuration(format!(
            "Missing required environment variables: {}",
            missing_vars.join(", ")
        )));
    }

    Ok(result)
}

/// Applies environment variable overrides using the ARCA_* prefix
///
/// Transfer overrides apply to every project profile; credentials are
/// usually shared across projects on one host.
fn apply_env_overrides(config: &mut ArcaConfig) {
    if let Ok(val) = std::env::var("ARCA_APPLICATION_LOG_LEVEL") {
        config.application.log_level = val;
    }
    if let Ok(val) = std::env::var("ARCA_APPLICATION_RETAIN_STAGING") {
        config.application.retain_staging = val.parse().unwrap_or(false);
    }

    for project in &mut config.projects {
        if let Ok(val) = std::env::var("ARCA_TRANSFER_HOST") {
            project.transfer.host = val;
        }
        if let Ok(val) = std::env::var("ARCA_TRANSFER_PORT") {
            if let Ok(port) = val.parse() {
                project.transfer.port = port;
            }
        }
        if let Ok(val) = std::env::var("ARCA_TRANSFER_USERNAME") {
            project.transfer.username = val;
        }
        if let Ok(val) = std::env::var("ARCA_TRANSFER_PASSWORD") {
            project.transfer.password = Some(secret_string(val));
        }
        if let Ok(val) = std::env::var("ARCA_TRANSFER_KEYFILE") {
            project.transfer.keyfile = Some(val);
        }
        if let Ok(val) = std::env::var("ARCA_TRANSFER_REMOTE_FOLDER") {
            project.transfer.remote_folder = val;
        }
    }

    if let Ok(val) = std::env::var("ARCA_LOGGING_LOCAL_ENABLED") {
        config.logging.local_enabled = val.parse().unwrap_or(false);
    }
    if let Ok(val) = std::env::var("ARCA_LOGGING_LOCAL_PATH") {
        config.logging.local_path = val;
    }
}
