//! Resource Types
//!
//! Tagged desired-state descriptions and reconciliation outcomes.

use serde::{Deserialize, Serialize};

use crate::error::ReconcileError;
use crate::types::{ClientSpec, CredentialSpec, RealmSpec, UserSpec};

/// Kind of admin API resource.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceKind {
    Realm,
    Client,
    User,
    Credential,
}

impl ResourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Realm => "realm",
            Self::Client => "client",
            Self::User => "user",
            Self::Credential => "credential",
        }
    }
}

impl std::fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Desired resource, tagged by kind.
///
/// Child kinds carry the name of their containing realm; a credential also
/// carries the owning user's id, so it cannot be built before that id is known.
#[derive(Clone, Debug)]
pub enum ResourceSpec {
    Realm(RealmSpec),
    Client {
        realm: String,
        spec: ClientSpec,
    },
    User {
        realm: String,
        spec: UserSpec,
    },
    Credential {
        realm: String,
        user_id: String,
        spec: CredentialSpec,
    },
}

impl ResourceSpec {
    /// Resource kind.
    pub fn kind(&self) -> ResourceKind {
        match self {
            Self::Realm(_) => ResourceKind::Realm,
            Self::Client { .. } => ResourceKind::Client,
            Self::User { .. } => ResourceKind::User,
            Self::Credential { .. } => ResourceKind::Credential,
        }
    }

    /// Human-readable natural key, used in events and logs.
    pub fn name(&self) -> &str {
        match self {
            Self::Realm(spec) => &spec.realm,
            Self::Client { spec, .. } => &spec.client_id,
            Self::User { spec, .. } => &spec.username,
            Self::Credential { user_id, .. } => user_id,
        }
    }
}

/// Result of one reconciliation.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ReconcileOutcome {
    /// The resource was created; id when the API made one locatable.
    Created(Option<String>),
    /// The resource was already present; treated as success.
    AlreadyExists(Option<String>),
    /// The resource could not be established.
    Failed(ReconcileError),
}

impl ReconcileOutcome {
    /// Resource id, if one was resolved.
    pub fn id(&self) -> Option<&str> {
        match self {
            Self::Created(id) | Self::AlreadyExists(id) => id.as_deref(),
            Self::Failed(_) => None,
        }
    }

    /// Short label for reports.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Created(_) => "created",
            Self::AlreadyExists(_) => "already_exists",
            Self::Failed(_) => "failed",
        }
    }
}
