//! Token Management
//!
//! Admin credential acquisition via the password grant.
//!
//! The credential is obtained once at the start of a run and shared by every
//! later request. It is never refreshed; an expired credential mid-run
//! surfaces as an ordinary failed step.

pub mod manager;

pub use manager::{AdminCredentials, PasswordGrantTokenManager, TokenManager};

#[cfg(test)]
pub use manager::MockTokenManager;
