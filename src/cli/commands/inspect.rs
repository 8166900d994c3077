//! Inspect command implementation
//!
//! Read-only look at the current remote state of a record: fetches the
//! manifest from the remote store and reports which images carry which
//! registry identifiers.

use crate::adapters::transfer;
use crate::config::load_config;
use crate::core::continuity::IdentifierMap;
use crate::core::reconciler::RemoteReconciler;
use crate::domain::ids::RecordId;
use crate::domain::manifest::parse_records;
use clap::Args;

/// Arguments for the inspect command
#[derive(Args, Debug)]
pub struct InspectArgs {
    /// Registry record id to inspect
    #[arg(long)]
    pub record_id: String,

    /// Project profile to use
    #[arg(long, default_value = "*")]
    pub project: String,
}

impl InspectArgs {
    /// Execute the inspect command
    pub async fn execute(&self, config_path: &str) -> anyhow::Result<i32> {
        let config = match load_config(config_path) {
            Ok(config) => config,
            Err(err) => {
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
        let record_id = match RecordId::new(&self.record_id) {
            Ok(id) => id,
            Err(err) => {
                eprintln!("Invalid record id: {err}");
                return Ok(2);
            }
        };

        let session = match transfer::connect(&project.transfer).await {
            Ok(session) => session,
            Err(err) => {
                eprintln!("Cannot connect to transfer host: {err}");
                return Ok(5);
            }
        };

        let download_dir = tempfile::tempdir()?;
        let mut reconciler = RemoteReconciler::new(
            session,
            project.transfer.remote_folder.clone(),
            record_id.clone(),
        );

        let fetched = reconciler.fetch_prior_manifest(download_dir.path()).await;
        let exit_code = match fetched {
            Ok(Some(path)) => {
                let text = std::fs::read_to_string(&path)?;
                match parse_records(&text, &project.manifest_root) {
                    Ok(records) => {
                        println!("Record {record_id}: {} exported image(s)", records.len());
                        let map = IdentifierMap::from_records(&records, &project.fields);
                        let mut pairs: Vec<(&str, &str)> = map.iter().collect();
                        pairs.sort();
                        for (filename, identifier) in pairs {
                            println!("  {filename}  →  {identifier}");
                        }
                        let unassigned = records.len() - map.len();
                        if unassigned > 0 {
                            println!("  ({unassigned} image(s) without a registry identifier yet)");
                        }
                        0
                    }
                    Err(err) => {
                        eprintln!("Remote manifest is unparseable: {err}");
                        5
                    }
                }
            }
            Ok(None) => {
                println!("Record {record_id}: no export present in the remote store");
                0
            }
            Err(err) => {
                eprintln!("Remote lookup failed: {err}");
                5
            }
        };

        reconciler.close().await;
        Ok(exit_code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inspect_args() {
        let args = InspectArgs {
            record_id: "118009".to_string(),
            project: "*".to_string(),
        };
        assert_eq!(args.record_id, "118009");
    }
}
