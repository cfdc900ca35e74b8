//! Configuration utilities.

/// Layered `medrec.toml` + environment configuration.
pub mod config;

pub use config::{ConfigError, MedrecConfig};
