//! Core Components
//!
//! HTTP transport and admin API readiness probing.

pub mod readiness;
pub mod transport;

pub use readiness::*;
pub use transport::*;
