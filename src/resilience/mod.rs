//! Resilience
//!
//! Bounded retry with exponential backoff for requests that are safe to repeat.

pub mod retry;

pub use retry::{RetryConfig, RetryPolicy, RetryStats, DEFAULT_RETRY_STATUSES};
