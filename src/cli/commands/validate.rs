//! Configuration validation command

use crate::config::load_config;
use clap::Args;

/// Arguments for the validate-config command
#[derive(Args, Debug)]
pub struct ValidateArgs {}

impl ValidateArgs {
    /// Execute the validate-config command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        match load_config(config_path) {
            Ok(config) => {
                println!(
                    "Configuration OK ({} project profile(s))",
                    config.projects.len()
                );
                for project in &config.projects {
                    println!(
                        "  {}: {} field(s), transfer mode {:?}",
                        project.name,
                        project.fields.len(),
                        project.transfer.mode
                    );
                }
                Ok(0)
            }
            Err(err) => {
                eprintln!("Configuration error: {err}");
                Ok(2)
            }
        }
    }
}
