//! CLI interface and argument parsing
//!
//! Command-line interface using clap.

pub mod commands;

use clap::{Parser, Subcommand};

/// Arca - registry export tool
#[derive(Parser, Debug)]
#[command(name = "arca")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Path to configuration file
    #[arg(short, long, default_value = "arca.toml", env = "ARCA_CONFIG")]
    pub config: String,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short, long, env = "ARCA_LOG_LEVEL")]
    pub log_level: Option<String>,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Export a record's selected images and metadata to the registry
    Export(commands::export::ExportArgs),

    /// Show the remote export state of a record
    Inspect(commands::inspect::InspectArgs),

    /// Validate the configuration file
    ValidateConfig(commands::validate::ValidateArgs),

    /// Write an example configuration file
    Init(commands::init::InitArgs),
}
