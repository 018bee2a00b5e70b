//! Resource Reconciler
//!
//! Create-or-confirm-existing against the admin API collection endpoints.

use std::sync::Arc;
use url::Url;

use crate::core::{HttpMethod, HttpRequest, HttpResponse, HttpTransport};
use crate::error::{BootstrapError, ConfigurationError, ProtocolError, ReconcileError};
use crate::resilience::{RetryConfig, RetryPolicy};
use crate::types::{
    Credential, CredentialSpec, ReconcileOutcome, ResourceKind, ResourceSpec, UserRepresentation,
    UserSpec,
};

/// Result of looking a user up by username.
enum UserLookup {
    Found(String),
    Missing,
    Failed(HttpResponse),
}

/// Reconciles desired resources against the admin API.
///
/// `Err` is returned only for transport failures that outlived the retry
/// budget or for undecodable responses. Every HTTP-level answer becomes a
/// [`ReconcileOutcome`].
pub struct ResourceReconciler<T: HttpTransport> {
    base_url: Url,
    transport: Arc<T>,
    retry: RetryPolicy,
}

impl<T: HttpTransport> ResourceReconciler<T> {
    /// Create new reconciler.
    pub fn new(
        base_url: &str,
        transport: Arc<T>,
        retry: RetryConfig,
    ) -> Result<Self, BootstrapError> {
        let base_url = Url::parse(base_url).map_err(|_| ConfigurationError::InvalidEndpoint {
            url: base_url.to_string(),
        })?;
        if base_url.cannot_be_a_base() {
            return Err(ConfigurationError::InvalidEndpoint {
                url: base_url.to_string(),
            }
            .into());
        }

        Ok(Self {
            base_url,
            transport,
            retry: RetryPolicy::new(retry),
        })
    }

    /// Retry policy shared by every request this reconciler issues.
    pub fn retry_policy(&self) -> &RetryPolicy {
        &self.retry
    }

    /// Ensure `spec` exists.
    pub async fn reconcile(
        &self,
        spec: &ResourceSpec,
        credential: &Credential,
    ) -> Result<ReconcileOutcome, BootstrapError> {
        let outcome = match spec {
            ResourceSpec::Realm(realm) => {
                let url = self.endpoint(&["admin", "realms"]);
                self.create(ResourceKind::Realm, url, realm, credential)
                    .await?
            }
            ResourceSpec::Client { realm, spec } => {
                let url = self.endpoint(&["admin", "realms", realm, "clients"]);
                self.create(ResourceKind::Client, url, spec, credential)
                    .await?
            }
            ResourceSpec::User { realm, spec } => {
                self.reconcile_user(realm, spec, credential).await?
            }
            ResourceSpec::Credential {
                realm,
                user_id,
                spec,
            } => self.set_password(realm, user_id, spec, credential).await?,
        };

        match &outcome {
            ReconcileOutcome::Failed(error) => {
                tracing::warn!(kind = %spec.kind(), name = spec.name(), error = %error, "reconcile failed")
            }
            other => {
                tracing::info!(kind = %spec.kind(), name = spec.name(), outcome = other.label(), id = ?other.id(), "reconciled")
            }
        }
        Ok(outcome)
    }

    /// Delete a realm. `Ok(false)` when it did not exist.
    pub async fn delete_realm(
        &self,
        realm: &str,
        credential: &Credential,
    ) -> Result<bool, BootstrapError> {
        let url = self.endpoint(&["admin", "realms", realm]);
        let request = HttpRequest::new(HttpMethod::Delete, url.as_str()).with_bearer(credential);
        let response = self.retry.send(self.transport.as_ref(), request).await?;

        match response.status {
            204 | 200 => {
                tracing::info!(realm, "realm deleted");
                Ok(true)
            }
            404 => {
                tracing::info!(realm, "realm did not exist");
                Ok(false)
            }
            status => Err(ReconcileError::Failed {
                kind: ResourceKind::Realm,
                status,
                body: response.body,
            }
            .into()),
        }
    }

    async fn create<B: serde::Serialize + ?Sized>(
        &self,
        kind: ResourceKind,
        url: Url,
        body: &B,
        credential: &Credential,
    ) -> Result<ReconcileOutcome, BootstrapError> {
        let request = HttpRequest::json(HttpMethod::Post, url.as_str(), body)?.with_bearer(credential);
        let response = self.retry.send(self.transport.as_ref(), request).await?;
        Ok(classify_create(kind, response))
    }

    async fn reconcile_user(
        &self,
        realm: &str,
        spec: &UserSpec,
        credential: &Credential,
    ) -> Result<ReconcileOutcome, BootstrapError> {
        let url = self.endpoint(&["admin", "realms", realm, "users"]);
        let request = HttpRequest::json(HttpMethod::Post, url.as_str(), spec)?.with_bearer(credential);
        let response = self.retry.send(self.transport.as_ref(), request).await?;

        let located = location_id(&response);
        let created = match classify_create(ResourceKind::User, response) {
            ReconcileOutcome::Created(_) => true,
            ReconcileOutcome::AlreadyExists(_) => false,
            failed => return Ok(failed),
        };

        if created {
            if let Some(id) = located {
                return Ok(ReconcileOutcome::Created(Some(id)));
            }
            tracing::debug!(username = %spec.username, "no location on created user, looking up id");
        }

        let id = match self.find_user_id(realm, &spec.username, credential).await? {
            UserLookup::Found(id) => id,
            UserLookup::Missing => {
                return Ok(ReconcileOutcome::Failed(
                    ReconcileError::LookupInconsistency {
                        realm: realm.to_string(),
                        username: spec.username.clone(),
                    },
                ))
            }
            UserLookup::Failed(response) => {
                return Ok(ReconcileOutcome::Failed(ReconcileError::Failed {
                    kind: ResourceKind::User,
                    status: response.status,
                    body: response.body,
                }))
            }
        };

        Ok(if created {
            ReconcileOutcome::Created(Some(id))
        } else {
            ReconcileOutcome::AlreadyExists(Some(id))
        })
    }

    async fn find_user_id(
        &self,
        realm: &str,
        username: &str,
        credential: &Credential,
    ) -> Result<UserLookup, BootstrapError> {
        let mut url = self.endpoint(&["admin", "realms", realm, "users"]);
        url.query_pairs_mut()
            .append_pair("username", username)
            .append_pair("exact", "true");

        let request = HttpRequest::get(url.as_str()).with_bearer(credential);
        let response = self.retry.send(self.transport.as_ref(), request).await?;

        if response.status != 200 {
            return Ok(UserLookup::Failed(response));
        }

        let users: Vec<UserRepresentation> =
            serde_json::from_str(&response.body).map_err(|e| {
                BootstrapError::Protocol(ProtocolError::InvalidJson {
                    message: e.to_string(),
                })
            })?;

        // The server may lower-case usernames and may match on substrings.
        let wanted = username.to_lowercase();
        Ok(users
            .into_iter()
            .find(|user| user.username.to_lowercase() == wanted)
            .and_then(|user| user.id)
            .map(UserLookup::Found)
            .unwrap_or(UserLookup::Missing))
    }

    async fn set_password(
        &self,
        realm: &str,
        user_id: &str,
        spec: &CredentialSpec,
        credential: &Credential,
    ) -> Result<ReconcileOutcome, BootstrapError> {
        let url = self.endpoint(&["admin", "realms", realm, "users", user_id, "reset-password"]);
        let request = HttpRequest::json(HttpMethod::Put, url.as_str(), spec)?.with_bearer(credential);
        let response = self.retry.send(self.transport.as_ref(), request).await?;

        if response.is_success() {
            Ok(ReconcileOutcome::Created(Some(user_id.to_string())))
        } else {
            Ok(ReconcileOutcome::Failed(ReconcileError::Failed {
                kind: ResourceKind::Credential,
                status: response.status,
                body: response.body,
            }))
        }
    }

    /// Base URL extended with percent-encoded path segments.
    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.base_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }
}

fn classify_create(kind: ResourceKind, response: HttpResponse) -> ReconcileOutcome {
    match response.status {
        status if (200..300).contains(&status) => ReconcileOutcome::Created(None),
        409 => ReconcileOutcome::AlreadyExists(None),
        status => ReconcileOutcome::Failed(ReconcileError::Failed {
            kind,
            status,
            body: response.body,
        }),
    }
}

/// Last path segment of the `location` header.
fn location_id(response: &HttpResponse) -> Option<String> {
    response
        .header("location")
        .and_then(|location| location.trim_end_matches('/').rsplit('/').next())
        .filter(|id| !id.is_empty())
        .map(str::to_string)
}
