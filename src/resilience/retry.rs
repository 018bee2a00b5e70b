//! Retry Logic
//!
//! Exponential backoff retry with jitter for admin API requests.
//!
//! A response is transient when its status is in the configured set; a
//! transport failure is transient when [`BootstrapError::is_retryable`] says
//! so. Conflicts and other 4xx answers are returned on the first attempt.

use std::future::Future;
use std::sync::Mutex;
use std::time::Duration;

use crate::core::{HttpRequest, HttpResponse, HttpTransport};
use crate::error::BootstrapError;

/// Statuses retried by default.
pub const DEFAULT_RETRY_STATUSES: [u16; 4] = [500, 502, 503, 504];

/// Retry configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct RetryConfig {
    /// Total attempts, the first one included.
    pub max_attempts: u32,
    /// Initial delay before first retry.
    pub initial_delay: Duration,
    /// Maximum delay between retries.
    pub max_delay: Duration,
    /// Backoff multiplier.
    pub multiplier: f64,
    /// Jitter factor (0.0-1.0).
    pub jitter: f64,
    /// Response statuses treated as transient.
    pub retry_statuses: Vec<u16>,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_attempts: 3,
            initial_delay: Duration::from_millis(300),
            max_delay: Duration::from_secs(10),
            multiplier: 2.0,
            jitter: 0.1,
            retry_statuses: DEFAULT_RETRY_STATUSES.to_vec(),
        }
    }
}

/// Retry statistics.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RetryStats {
    pub total_attempts: u32,
    pub retries: u32,
    pub exhausted: u32,
}

/// Retry policy for admin API requests.
pub struct RetryPolicy {
    config: RetryConfig,
    stats: Mutex<RetryStats>,
}

impl RetryPolicy {
    /// Create new retry policy.
    pub fn new(config: RetryConfig) -> Self {
        Self {
            config,
            stats: Mutex::new(RetryStats::default()),
        }
    }

    /// Configuration in use.
    pub fn config(&self) -> &RetryConfig {
        &self.config
    }

    /// Whether a response status is transient.
    pub fn is_transient_status(&self, status: u16) -> bool {
        self.config.retry_statuses.contains(&status)
    }

    /// Send `request` through `transport`, retrying transient failures.
    pub async fn send<T: HttpTransport + ?Sized>(
        &self,
        transport: &T,
        request: HttpRequest,
    ) -> Result<HttpResponse, BootstrapError> {
        self.execute(|| transport.send(request.clone())).await
    }

    /// Run `operation` until it yields a non-transient result or the attempt
    /// budget is spent. The last result is returned unchanged.
    pub async fn execute<F, Fut>(&self, operation: F) -> Result<HttpResponse, BootstrapError>
    where
        F: Fn() -> Fut,
        Fut: Future<Output = Result<HttpResponse, BootstrapError>>,
    {
        let max_attempts = self.config.max_attempts.max(1);
        let mut attempt = 0;

        loop {
            attempt += 1;
            self.stats.lock().unwrap().total_attempts += 1;

            let result = operation().await;
            let transient = match &result {
                Ok(response) => self.is_transient_status(response.status),
                Err(error) => error.is_retryable(),
            };

            if !transient {
                return result;
            }

            if attempt >= max_attempts {
                self.stats.lock().unwrap().exhausted += 1;
                tracing::warn!(attempts = attempt, "retry budget exhausted");
                return result;
            }

            self.stats.lock().unwrap().retries += 1;
            let delay = self.calculate_delay(attempt - 1);
            match &result {
                Ok(response) => tracing::warn!(
                    attempt,
                    status = response.status,
                    delay_ms = delay.as_millis() as u64,
                    "transient response, retrying"
                ),
                Err(error) => tracing::warn!(
                    attempt,
                    error = %error,
                    delay_ms = delay.as_millis() as u64,
                    "transient failure, retrying"
                ),
            }
            tokio::time::sleep(delay).await;
        }
    }

    /// Get retry statistics.
    pub fn get_stats(&self) -> RetryStats {
        self.stats.lock().unwrap().clone()
    }

    fn calculate_delay(&self, retry: u32) -> Duration {
        let base_delay = self.config.initial_delay.as_millis() as f64
            * self.config.multiplier.powi(retry as i32);

        let capped_delay = base_delay.min(self.config.max_delay.as_millis() as f64);

        let jitter_range = capped_delay * self.config.jitter;
        let jitter = (rand::random::<f64>() - 0.5) * 2.0 * jitter_range;
        let final_delay = (capped_delay + jitter).max(0.0);

        Duration::from_millis(final_delay as u64)
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self::new(RetryConfig::default())
    }
}
