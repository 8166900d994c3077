//! Export command implementation

use crate::adapters::metadata::JsonRecordSource;
use crate::config::load_config;
use crate::core::export::{ExportCoordinator, ExportOptions};
use clap::Args;
use std::path::PathBuf;

/// Arguments for the export command
#[derive(Args, Debug)]
pub struct ExportArgs {
    /// Path to the record document (JSON)
    #[arg(long)]
    pub record: PathBuf,

    /// Directory containing the record's master images
    #[arg(long)]
    pub images: PathBuf,

    /// Project profile to use
    #[arg(long, default_value = "*")]
    pub project: String,

    /// Stage locally but skip all remote operations
    #[arg(long)]
    pub dry_run: bool,

    /// Keep the staging directory after the run
    #[arg(long)]
    pub retain_staging: bool,
}

impl ExportArgs {
    /// Execute the export command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        tracing::info!("Starting export command");

        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(err) => {
                tracing::error!(error = %err, "Configuration error");
                eprintln!("Configuration error: {err}");
                return Ok(2);
            }
        };

        let Some(project) = config.project(&self.project) else {
            eprintln!(
                "No project profile named '{}' and no wildcard profile configured",
                self.project
            );
            return Ok(2);
        };

        let options = ExportOptions {
            dry_run: self.dry_run,
            retain_staging: self.retain_staging || config.application.retain_staging,
        };
        if options.dry_run {
            println!("DRY RUN - no remote operations will be performed");
        }

        let source = JsonRecordSource::new(&self.record);
        let coordinator =
            ExportCoordinator::new(project.clone(), Box::new(source), &self.images, options);

        match coordinator.execute_export().await {
            Ok(summary) => {
                println!();
                println!("Export summary:");
                println!("  Record:                {}", summary.record_id);
                println!("  Selected images:       {}", summary.selected_images);
                println!("  Records projected:     {}", summary.records_projected);
                println!("  Identifiers recovered: {}", summary.identifiers_recovered);
                println!("  Files staged:          {}", summary.staged_files);
                println!("  Files uploaded:        {}", summary.uploaded_files);
                println!("  Remote files pruned:   {}", summary.pruned_files);
                println!("  Backup created:        {}", summary.backup_created);
                println!("  Duration:              {:.2}s", summary.duration.as_secs_f64());
                if let Some(staging) = &summary.staging_dir {
                    println!("  Staging retained at:   {}", staging.display());
                }

                if summary.is_clean() {
                    println!();
                    println!("Export completed successfully");
                    Ok(0)
                } else {
                    println!();
                    println!("Export completed with warnings:");
                    for warning in &summary.warnings {
                        println!("  - {warning}");
                    }
                    Ok(1)
                }
            }
            Err(err) if err.is_user_abort() => {
                tracing::error!(error = %err, "Export aborted");
                eprintln!("Export aborted: {err}");
                Ok(3)
            }
            Err(err) => {
                tracing::error!(error = %err, "Export failed");
                eprintln!("Export failed: {err}");
                Ok(5)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_export_args_defaults() {
        let args = ExportArgs {
            record: PathBuf::from("record.json"),
            images: PathBuf::from("images"),
            project: "*".to_string(),
            dry_run: false,
            retain_staging: false,
        };
        assert!(!args.dry_run);
        assert!(!args.retain_staging);
        assert_eq!(args.project, "*");
    }
}
