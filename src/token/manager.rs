//! Token Manager
//!
//! Exchanges administrator credentials for a bearer credential.

use async_trait::async_trait;
use secrecy::{ExposeSecret, SecretString};
use std::sync::Arc;

use crate::core::{HttpRequest, HttpTransport};
use crate::error::{AuthError, BootstrapError, ProtocolError};
use crate::types::{BootstrapConfig, Credential, TokenResponse};

/// Token manager interface.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait TokenManager: Send + Sync {
    /// Perform one credential exchange. Never retried.
    async fn acquire(&self) -> Result<Credential, BootstrapError>;
}

/// Administrator account used for the password grant.
#[derive(Clone)]
pub struct AdminCredentials {
    /// Token endpoint URL.
    pub token_endpoint: String,
    /// Client the grant is issued for.
    pub client_id: String,
    /// Administrator username.
    pub username: String,
    /// Administrator password.
    pub password: SecretString,
}

impl AdminCredentials {
    /// Extract the admin account from a run configuration.
    pub fn from_config(config: &BootstrapConfig) -> Self {
        Self {
            token_endpoint: config.token_endpoint(),
            client_id: config.admin_client_id.clone(),
            username: config.admin_username.clone(),
            password: config.admin_password.clone(),
        }
    }
}

impl std::fmt::Debug for AdminCredentials {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AdminCredentials")
            .field("token_endpoint", &self.token_endpoint)
            .field("client_id", &self.client_id)
            .field("username", &self.username)
            .field("password", &"[REDACTED]")
            .finish()
    }
}

/// Password-grant token manager.
pub struct PasswordGrantTokenManager<T: HttpTransport> {
    credentials: AdminCredentials,
    transport: Arc<T>,
}

impl<T: HttpTransport> PasswordGrantTokenManager<T> {
    /// Create new token manager.
    pub fn new(credentials: AdminCredentials, transport: Arc<T>) -> Self {
        Self {
            credentials,
            transport,
        }
    }

    fn build_request(&self) -> HttpRequest {
        HttpRequest::form(
            self.credentials.token_endpoint.as_str(),
            &[
                ("grant_type", "password"),
                ("client_id", self.credentials.client_id.as_str()),
                ("username", self.credentials.username.as_str()),
                ("password", self.credentials.password.expose_secret().as_str()),
            ],
        )
    }
}

#[async_trait]
impl<T: HttpTransport> TokenManager for PasswordGrantTokenManager<T> {
    async fn acquire(&self) -> Result<Credential, BootstrapError> {
        tracing::debug!(
            endpoint = %self.credentials.token_endpoint,
            username = %self.credentials.username,
            "requesting admin token"
        );

        let response = self.transport.send(self.build_request()).await?;

        if response.status != 200 {
            return Err(AuthError::Rejected {
                status: response.status,
                body: response.body,
            }
            .into());
        }

        let token: TokenResponse = serde_json::from_str(&response.body).map_err(|e| {
            BootstrapError::Protocol(ProtocolError::InvalidJson {
                message: e.to_string(),
            })
        })?;

        match token.access_token {
            Some(access_token) if !access_token.is_empty() => {
                tracing::info!(expires_in = ?token.expires_in, "admin token obtained");
                Ok(Credential::new(access_token))
            }
            _ => Err(AuthError::MissingAccessToken {
                body: response.body,
            }
            .into()),
        }
    }
}
