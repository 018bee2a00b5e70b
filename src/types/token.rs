//! Token Types
//!
//! Admin bearer credential and token endpoint response.

use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;

/// Token response from the admin realm's token endpoint.
#[derive(Clone, Debug, Deserialize)]
pub struct TokenResponse {
    /// Access token.
    #[serde(default)]
    pub access_token: Option<String>,
    /// Token type (usually "Bearer").
    #[serde(default)]
    pub token_type: Option<String>,
    /// Expires in seconds. Informational only; credentials are never refreshed.
    #[serde(default)]
    pub expires_in: Option<u64>,
}

/// Opaque bearer credential, valid for the rest of one run.
#[derive(Clone)]
pub struct Credential(SecretString);

impl Credential {
    /// Wrap a raw access token.
    pub fn new(token: impl Into<String>) -> Self {
        Self(SecretString::new(token.into()))
    }

    /// Value for the `authorization` header.
    pub fn authorization_header(&self) -> String {
        format!("Bearer {}", self.0.expose_secret())
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential([REDACTED])")
    }
}
