//! Admin API Representations
//!
//! Desired-state bodies for realms, clients, users and passwords.

use secrecy::{ExposeSecret, SecretString};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::collections::BTreeMap;
use std::path::Path;

use crate::error::{BootstrapError, ConfigurationError};

/// Desired realm.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RealmSpec {
    /// Realm name.
    pub realm: String,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ssl_required: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub registration_allowed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub login_with_email_allowed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duplicate_emails_allowed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reset_password_allowed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub edit_username_allowed: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub brute_force_protected: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub password_policy: Option<String>,
    /// Realm-level roles.
    #[serde(default, skip_serializing_if = "RealmRoles::is_empty")]
    pub roles: RealmRoles,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    /// Any other admin API field, passed through untouched.
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RealmSpec {
    /// Minimal enabled realm.
    pub fn new(realm: impl Into<String>) -> Self {
        Self {
            realm: realm.into(),
            enabled: true,
            ..Default::default()
        }
    }

    /// Add a realm role.
    pub fn with_role(mut self, name: impl Into<String>, description: impl Into<String>) -> Self {
        self.roles.realm.push(RoleSpec {
            name: name.into(),
            description: Some(description.into()),
            composite: false,
        });
        self
    }

    /// Load a full realm export document.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, BootstrapError> {
        let path = path.as_ref();
        let unreadable = |message: String| ConfigurationError::UnreadableFile {
            path: path.display().to_string(),
            message,
        };

        let raw = std::fs::read_to_string(path).map_err(|e| unreadable(e.to_string()))?;
        let spec: RealmSpec =
            serde_json::from_str(&raw).map_err(|e| unreadable(e.to_string()))?;

        if spec.realm.trim().is_empty() {
            return Err(ConfigurationError::MissingRequired {
                field: "realm".to_string(),
            }
            .into());
        }
        Ok(spec)
    }
}

/// Realm role container.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct RealmRoles {
    #[serde(default)]
    pub realm: Vec<RoleSpec>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl RealmRoles {
    fn is_empty(&self) -> bool {
        self.realm.is_empty() && self.extra.is_empty()
    }
}

/// Realm role.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RoleSpec {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default)]
    pub composite: bool,
}

/// Desired client application registration.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClientSpec {
    /// Natural key of the client within its realm.
    pub client_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub public_client: bool,
    #[serde(default = "default_true")]
    pub standard_flow_enabled: bool,
    #[serde(default)]
    pub implicit_flow_enabled: bool,
    #[serde(default)]
    pub direct_access_grants_enabled: bool,
    #[serde(default)]
    pub service_accounts_enabled: bool,
    #[serde(default = "default_protocol")]
    pub protocol: String,
    #[serde(default)]
    pub redirect_uris: Vec<String>,
    #[serde(default)]
    pub web_origins: Vec<String>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub attributes: BTreeMap<String, String>,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl ClientSpec {
    /// Enabled OpenID Connect client with the standard flow.
    pub fn new(client_id: impl Into<String>) -> Self {
        Self {
            client_id: client_id.into(),
            enabled: true,
            standard_flow_enabled: true,
            protocol: default_protocol(),
            ..Default::default()
        }
    }

    /// Public client that requires PKCE with S256.
    pub fn public_pkce(client_id: impl Into<String>) -> Self {
        let mut spec = Self::new(client_id);
        spec.public_client = true;
        spec.attributes.insert(
            "pkce.code.challenge.method".to_string(),
            "S256".to_string(),
        );
        spec
    }
}

/// Desired user.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserSpec {
    /// Natural key of the user within its realm.
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub first_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_name: Option<String>,
    #[serde(default = "default_true")]
    pub enabled: bool,
    #[serde(default)]
    pub email_verified: bool,
    #[serde(flatten)]
    pub extra: serde_json::Map<String, serde_json::Value>,
}

impl UserSpec {
    /// Enabled user with a verified email flag set.
    pub fn new(username: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            enabled: true,
            email_verified: true,
            ..Default::default()
        }
    }
}

/// Desired password for a user. Applied as a full overwrite.
#[derive(Clone)]
pub struct CredentialSpec {
    pub value: SecretString,
    pub temporary: bool,
}

impl CredentialSpec {
    /// Permanent password.
    pub fn password(value: impl Into<String>) -> Self {
        Self {
            value: SecretString::new(value.into()),
            temporary: false,
        }
    }
}

impl std::fmt::Debug for CredentialSpec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CredentialSpec")
            .field("value", &"[REDACTED]")
            .field("temporary", &self.temporary)
            .finish()
    }
}

impl Serialize for CredentialSpec {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("CredentialRepresentation", 3)?;
        state.serialize_field("type", "password")?;
        state.serialize_field("value", self.value.expose_secret())?;
        state.serialize_field("temporary", &self.temporary)?;
        state.end()
    }
}

/// User as returned by the username lookup.
#[derive(Clone, Debug, Deserialize)]
pub struct UserRepresentation {
    #[serde(default)]
    pub id: Option<String>,
    pub username: String,
}

fn default_true() -> bool {
    true
}

fn default_protocol() -> String {
    "openid-connect".to_string()
}
