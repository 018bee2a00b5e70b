//! Provisioning Types
//!
//! Configuration, credential and desired-state types.

pub mod config;
pub mod representation;
pub mod resource;
pub mod token;

pub use config::*;
pub use representation::*;
pub use resource::*;
pub use token::*;
