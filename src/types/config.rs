//! Configuration Types
//!
//! Provisioning run configuration types.

use secrecy::SecretString;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::resilience::RetryConfig;

/// Provisioning run configuration.
///
/// Passed explicitly to every component at construction; nothing here is
/// process-wide.
#[derive(Clone)]
pub struct BootstrapConfig {
    /// Admin API base URL, without trailing slash.
    pub base_url: String,
    /// Realm that owns the administrator account.
    pub admin_realm: String,
    /// Client used for the administrator password grant.
    pub admin_client_id: String,
    /// Administrator username.
    pub admin_username: String,
    /// Administrator password.
    pub admin_password: SecretString,
    /// HTTP transport settings.
    pub transport: TransportConfig,
    /// Retry settings for reconciliation requests.
    pub retry: RetryConfig,
    /// Per-step failure policy.
    pub policy: FailurePolicy,
}

impl BootstrapConfig {
    /// Password-grant token endpoint for the admin realm.
    pub fn token_endpoint(&self) -> String {
        format!(
            "{}/realms/{}/protocol/openid-connect/token",
            self.base_url, self.admin_realm
        )
    }
}

impl std::fmt::Debug for BootstrapConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BootstrapConfig")
            .field("base_url", &self.base_url)
            .field("admin_realm", &self.admin_realm)
            .field("admin_client_id", &self.admin_client_id)
            .field("admin_username", &self.admin_username)
            .field("admin_password", &"[REDACTED]")
            .field("transport", &self.transport)
            .field("retry", &self.retry)
            .field("policy", &self.policy)
            .finish()
    }
}

/// HTTP transport settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TransportConfig {
    /// Per-request timeout.
    pub timeout: Duration,
    /// Verify the server's TLS certificate.
    pub verify_tls: bool,
    /// Largest response body accepted, in bytes.
    pub max_response_size: usize,
}

impl Default for TransportConfig {
    fn default() -> Self {
        Self {
            timeout: Duration::from_millis(DEFAULT_TIMEOUT_MS),
            verify_tls: true,
            max_response_size: DEFAULT_MAX_RESPONSE_SIZE,
        }
    }
}

/// Which step failures end the run early.
///
/// Realm and user failures always abort: every later step depends on them.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct FailurePolicy {
    /// Abort when the client step fails instead of continuing to the user.
    pub abort_on_client_failure: bool,
    /// Abort when the password step fails instead of finishing degraded.
    pub abort_on_credential_failure: bool,
    /// Delete the realm before creating it.
    pub recreate_realm: bool,
}

/// Readiness polling settings.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReadinessConfig {
    /// Number of polls before giving up.
    pub attempts: u32,
    /// Pause between polls.
    pub interval: Duration,
    /// Timeout of a single poll.
    pub request_timeout: Duration,
    /// Path polled on the base URL.
    pub path: String,
}

impl Default for ReadinessConfig {
    fn default() -> Self {
        Self {
            attempts: 30,
            interval: Duration::from_secs(2),
            request_timeout: Duration::from_secs(5),
            path: "/realms/master".to_string(),
        }
    }
}

/// Default configuration values.
pub const DEFAULT_BASE_URL: &str = "http://localhost:8090";
pub const DEFAULT_ADMIN_REALM: &str = "master";
pub const DEFAULT_ADMIN_CLIENT_ID: &str = "admin-cli";
pub const DEFAULT_TIMEOUT_MS: u64 = 30000;
pub const DEFAULT_MAX_RESPONSE_SIZE: usize = 1048576;
