//! Configuration Builder
//!
//! Fluent builder for provisioning run configuration.

use std::time::Duration;
use url::Url;

use crate::error::{BootstrapError, ConfigurationError};
use crate::resilience::RetryConfig;
use crate::types::{
    BootstrapConfig, FailurePolicy, TransportConfig, DEFAULT_ADMIN_CLIENT_ID, DEFAULT_ADMIN_REALM,
    DEFAULT_BASE_URL,
};
use secrecy::SecretString;

/// Environment variable holding the admin API base URL.
pub const ENV_BASE_URL: &str = "KEYCLOAK_URL";
/// Environment variable holding the administrator username.
pub const ENV_ADMIN_USER: &str = "KEYCLOAK_ADMIN_USER";
/// Environment variable holding the administrator password.
pub const ENV_ADMIN_PASSWORD: &str = "KEYCLOAK_ADMIN_PASSWORD";
/// Environment variable toggling TLS verification.
pub const ENV_VERIFY_TLS: &str = "KEYCLOAK_VERIFY_TLS";

const DEFAULT_ADMIN_USER: &str = "admin";

/// Provisioning configuration builder.
#[derive(Default)]
pub struct BootstrapConfigBuilder {
    base_url: Option<String>,
    admin_realm: Option<String>,
    admin_client_id: Option<String>,
    admin_username: Option<String>,
    admin_password: Option<SecretString>,
    transport: TransportConfig,
    retry: RetryConfig,
    policy: FailurePolicy,
}

impl BootstrapConfigBuilder {
    /// Create new configuration builder.
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed from the process environment, falling back to development
    /// defaults.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Seed from an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut builder = Self::new()
            .base_url(lookup(ENV_BASE_URL).unwrap_or_else(|| DEFAULT_BASE_URL.to_string()))
            .admin_username(lookup(ENV_ADMIN_USER).unwrap_or_else(|| DEFAULT_ADMIN_USER.to_string()))
            .admin_password(
                lookup(ENV_ADMIN_PASSWORD).unwrap_or_else(|| DEFAULT_ADMIN_USER.to_string()),
            );

        if let Some(verify) = lookup(ENV_VERIFY_TLS).as_deref().and_then(parse_bool) {
            builder = builder.verify_tls(verify);
        }
        builder
    }

    /// Set admin API base URL.
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set realm that owns the administrator account.
    pub fn admin_realm(mut self, realm: impl Into<String>) -> Self {
        self.admin_realm = Some(realm.into());
        self
    }

    /// Set client used for the administrator password grant.
    pub fn admin_client_id(mut self, client_id: impl Into<String>) -> Self {
        self.admin_client_id = Some(client_id.into());
        self
    }

    /// Set administrator username.
    pub fn admin_username(mut self, username: impl Into<String>) -> Self {
        self.admin_username = Some(username.into());
        self
    }

    /// Set administrator password.
    pub fn admin_password(mut self, password: impl Into<String>) -> Self {
        self.admin_password = Some(SecretString::new(password.into()));
        self
    }

    /// Set request timeout.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.transport.timeout = timeout;
        self
    }

    /// Enable or disable TLS certificate verification.
    pub fn verify_tls(mut self, verify: bool) -> Self {
        self.transport.verify_tls = verify;
        self
    }

    /// Set total attempts per reconciliation request.
    pub fn max_attempts(mut self, attempts: u32) -> Self {
        self.retry.max_attempts = attempts;
        self
    }

    /// Set retry configuration.
    pub fn retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    /// Set failure policy.
    pub fn policy(mut self, policy: FailurePolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Abort when the client step fails.
    pub fn abort_on_client_failure(mut self, abort: bool) -> Self {
        self.policy.abort_on_client_failure = abort;
        self
    }

    /// Abort when the password step fails.
    pub fn abort_on_credential_failure(mut self, abort: bool) -> Self {
        self.policy.abort_on_credential_failure = abort;
        self
    }

    /// Delete the realm before creating it.
    pub fn recreate_realm(mut self, recreate: bool) -> Self {
        self.policy.recreate_realm = recreate;
        self
    }

    /// Build the configuration.
    pub fn build(self) -> Result<BootstrapConfig, BootstrapError> {
        let raw_url = self.base_url.ok_or_else(|| ConfigurationError::MissingRequired {
            field: "base_url".to_string(),
        })?;
        let base_url = validate_base_url(&raw_url)?;

        let admin_username = self
            .admin_username
            .filter(|name| !name.trim().is_empty())
            .ok_or_else(|| ConfigurationError::MissingRequired {
                field: "admin_username".to_string(),
            })?;

        let admin_password = self.admin_password.ok_or_else(|| {
            ConfigurationError::MissingRequired {
                field: "admin_password".to_string(),
            }
        })?;

        if self.retry.max_attempts == 0 {
            return Err(ConfigurationError::InvalidConfig {
                message: "max_attempts must be at least 1".to_string(),
            }
            .into());
        }

        Ok(BootstrapConfig {
            base_url,
            admin_realm: self
                .admin_realm
                .unwrap_or_else(|| DEFAULT_ADMIN_REALM.to_string()),
            admin_client_id: self
                .admin_client_id
                .unwrap_or_else(|| DEFAULT_ADMIN_CLIENT_ID.to_string()),
            admin_username,
            admin_password,
            transport: self.transport,
            retry: self.retry,
            policy: self.policy,
        })
    }
}

/// Create a new provisioning configuration builder.
pub fn bootstrap_config() -> BootstrapConfigBuilder {
    BootstrapConfigBuilder::new()
}

fn validate_base_url(raw: &str) -> Result<String, ConfigurationError> {
    let trimmed = raw.trim().trim_end_matches('/');
    let invalid = || ConfigurationError::InvalidEndpoint {
        url: raw.to_string(),
    };

    let url = Url::parse(trimmed).map_err(|_| invalid())?;
    if !matches!(url.scheme(), "http" | "https") || url.host_str().is_none() {
        return Err(invalid());
    }
    Ok(trimmed.to_string())
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
