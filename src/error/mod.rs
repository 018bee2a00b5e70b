//! Bootstrap Error Types
//!
//! Error hierarchy for realm provisioning.

use std::time::Duration;
use thiserror::Error;

use crate::types::ResourceKind;

/// Root error type for realm provisioning.
#[derive(Error, Debug)]
pub enum BootstrapError {
    #[error("Configuration error: {0}")]
    Configuration(#[from] ConfigurationError),

    #[error("Authentication error: {0}")]
    Auth(#[from] AuthError),

    #[error("Network error: {0}")]
    Network(#[from] NetworkError),

    #[error("Protocol error: {0}")]
    Protocol(#[from] ProtocolError),

    #[error("Reconcile error: {0}")]
    Reconcile(#[from] ReconcileError),

    #[error("Admin API not ready after {attempts} attempts")]
    NotReady { attempts: u32 },
}

impl BootstrapError {
    /// Get error code for telemetry.
    pub fn error_code(&self) -> &'static str {
        match self {
            Self::Configuration(_) => "BOOTSTRAP_CONFIG",
            Self::Auth(_) => "BOOTSTRAP_AUTH",
            Self::Network(_) => "BOOTSTRAP_NETWORK",
            Self::Protocol(_) => "BOOTSTRAP_PROTOCOL",
            Self::Reconcile(_) => "BOOTSTRAP_RECONCILE",
            Self::NotReady { .. } => "BOOTSTRAP_NOT_READY",
        }
    }

    /// Check if error is retryable.
    ///
    /// Only connectivity failures qualify. Authentication and application-level
    /// failures are never retried.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Network(e) => e.is_retryable(),
            _ => false,
        }
    }
}

/// Configuration error.
#[derive(Error, Debug)]
pub enum ConfigurationError {
    #[error("Invalid configuration: {message}")]
    InvalidConfig { message: String },

    #[error("Missing required field: {field}")]
    MissingRequired { field: String },

    #[error("Invalid endpoint URL: {url}")]
    InvalidEndpoint { url: String },

    #[error("Failed to read {path}: {message}")]
    UnreadableFile { path: String, message: String },
}

/// Admin credential exchange error.
#[derive(Error, Debug)]
pub enum AuthError {
    #[error("Token request rejected with HTTP {status}: {body}")]
    Rejected { status: u16, body: String },

    #[error("Token response did not contain an access_token: {body}")]
    MissingAccessToken { body: String },
}

/// Network/transport error.
#[derive(Error, Debug)]
pub enum NetworkError {
    #[error("Connection failed: {message}")]
    ConnectionFailed { message: String },

    #[error("Request timeout after {timeout:?}")]
    Timeout { timeout: Duration },

    #[error("TLS error: {message}")]
    TlsError { message: String },
}

impl NetworkError {
    /// Check if error is retryable.
    pub fn is_retryable(&self) -> bool {
        !matches!(self, Self::TlsError { .. })
    }
}

/// Protocol/response parsing error.
#[derive(Error, Debug)]
pub enum ProtocolError {
    #[error("Invalid response: {message}")]
    InvalidResponse { message: String },

    #[error("Unexpected redirect to: {location}")]
    UnexpectedRedirect { location: String },

    #[error("Response too large: {size} bytes")]
    ResponseTooLarge { size: usize },

    #[error("Invalid JSON: {message}")]
    InvalidJson { message: String },
}

/// A reconciliation step that could not establish its resource.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ReconcileError {
    #[error("{kind} reconciliation failed with HTTP {status}: {body}")]
    Failed {
        kind: ResourceKind,
        status: u16,
        body: String,
    },

    #[error("user '{username}' in realm '{realm}' conflicts on create but cannot be found by username")]
    LookupInconsistency { realm: String, username: String },
}

impl ReconcileError {
    /// HTTP status reported by the admin API, if the failure came from one.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Failed { status, .. } => Some(*status),
            Self::LookupInconsistency { .. } => None,
        }
    }

    /// Raw response body reported by the admin API.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Failed { body, .. } => Some(body),
            Self::LookupInconsistency { .. } => None,
        }
    }
}

/// Result type for provisioning operations.
pub type BootstrapResult<T> = Result<T, BootstrapError>;
