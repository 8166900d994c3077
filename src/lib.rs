// Arca - Registry Export Tool
// Copyright (c) 2025 Arca Contributors
// Licensed under the MIT License

//! # Arca - registry export engine
//!
//! Arca exports a curated subset of a digitized record's images and
//! descriptive metadata to an external registry over a remote
//! file-transfer channel. The same record can be exported repeatedly
//! without losing identity continuity: an identifier the registry assigned
//! to an image survives re-export even when the image set, its order or
//! its metadata changes.
//!
//! ## Architecture
//!
//! - [`cli`] - Command-line interface and argument parsing
//! - [`core`] - The export reconciliation engine (selection parsing,
//!   record projection, identifier continuity, remote reconciliation)
//! - [`adapters`] - External collaborators behind traits (transfer
//!   sessions, record document source, image derivatives)
//! - [`domain`] - Core domain types and models
//! - [`config`] - Configuration management
//! - [`logging`] - Structured logging setup
//!
//! ## Quick start
//!
//! ```rust,no_run
//! use arca::adapters::metadata::JsonRecordSource;
//! use arca::config::load_config;
//! use arca::core::export::{ExportCoordinator, ExportOptions};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = load_config("arca.toml")?;
//!     let project = config.project("Monuments").expect("profile");
//!
//!     let coordinator = ExportCoordinator::new(
//!         project.clone(),
//!         Box::new(JsonRecordSource::new("record.json")),
//!         "images/",
//!         ExportOptions::default(),
//!     );
//!
//!     let summary = coordinator.execute_export().await?;
//!     println!("uploaded {} file(s)", summary.uploaded_files);
//!     Ok(())
//! }
//! ```
//!
//! ## Semantics worth knowing
//!
//! - Exactly one manifest per record exists remotely at any time; each
//!   re-export keeps the previous one as a timestamp-suffixed backup.
//! - Identifier continuity is best-effort and keyed by staged filename
//!   only; renaming an image (shelfmark) intentionally breaks it.
//! - Remote transport failures degrade the run instead of crashing it:
//!   the run reports warnings and whatever could not be synced.
//! - The engine provides no cross-process locking. The invoking workflow
//!   must serialize exports per record id.

pub mod adapters;
pub mod cli;
pub mod config;
pub mod core;
pub mod domain;
pub mod logging;
