//! Configuration management

pub mod loader;
pub mod schema;
pub mod secret;

pub use loader::load_config;
pub use schema::{
    ApplicationConfig, ArcaConfig, LoggingConfig, ProjectConfig, TransferConfig, TransferMode,
};
pub use secret::{secret_string, SecretString, SecretValue};
