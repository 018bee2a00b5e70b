//! Builders
//!
//! Fluent builder for provisioning configuration.

pub mod config;

pub use config::{bootstrap_config, BootstrapConfigBuilder};
