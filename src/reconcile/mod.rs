//! Reconciliation
//!
//! Idempotent create-or-confirm of realms, clients, users and passwords.

pub mod reconciler;

pub use reconciler::ResourceReconciler;
