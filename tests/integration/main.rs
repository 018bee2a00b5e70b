//! Integration tests using WireMock
//!
//! These tests drive the real reqwest transport against a mock admin API and
//! verify the complete request sequence of a provisioning run.

mod provisioning;
mod readiness;
mod retry;
mod token;

use serde_json::json;
use std::sync::Arc;
use std::time::Duration;
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use realm_bootstrap::{
    bootstrap_config, BootstrapConfig, BootstrapPlan, ClientSpec, CredentialSpec,
    Orchestrator, PasswordGrantTokenManager, RealmSpec, ReqwestHttpTransport, RetryConfig,
    UserSpec,
};

pub const TOKEN_PATH: &str = "/realms/master/protocol/openid-connect/token";
pub const REALMS_PATH: &str = "/admin/realms";
pub const CLIENTS_PATH: &str = "/admin/realms/durval-crm/clients";
pub const USERS_PATH: &str = "/admin/realms/durval-crm/users";
pub const ADMIN_TOKEN: &str = "admin-token";

pub type TestOrchestrator =
    Orchestrator<ReqwestHttpTransport, PasswordGrantTokenManager<ReqwestHttpTransport>>;

/// Retry settings with negligible backoff.
pub fn fast_retry(max_attempts: u32) -> RetryConfig {
    RetryConfig {
        max_attempts,
        initial_delay: Duration::from_millis(1),
        max_delay: Duration::from_millis(5),
        jitter: 0.0,
        ..Default::default()
    }
}

pub fn config(server: &MockServer) -> BootstrapConfig {
    bootstrap_config()
        .base_url(server.uri())
        .admin_username("admin")
        .admin_password("admin")
        .retry(fast_retry(3))
        .build()
        .expect("valid config")
}

pub fn orchestrator(config: &BootstrapConfig) -> TestOrchestrator {
    let transport = Arc::new(ReqwestHttpTransport::new().expect("transport"));
    Orchestrator::from_config(config, transport).expect("orchestrator")
}

pub fn plan() -> BootstrapPlan {
    let mut client = ClientSpec::public_pkce("durvalcrm-app");
    client.redirect_uris = vec!["http://localhost:9080/crm/auth/callback".to_string()];
    client.web_origins = vec!["http://localhost:9080".to_string()];

    BootstrapPlan {
        realm: RealmSpec::new("durval-crm"),
        client: Some(client),
        user: UserSpec::new("tesouraria"),
        password: CredentialSpec::password("cairbar@2025"),
    }
}

/// Token endpoint that grants the admin token.
pub async fn mount_token(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=password"))
        .and(body_string_contains("client_id=admin-cli"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": ADMIN_TOKEN,
            "token_type": "Bearer",
            "expires_in": 60
        })))
        .mount(server)
        .await;
}

/// 201 with a Location header naming the new user.
pub fn user_created(server: &MockServer, id: &str) -> ResponseTemplate {
    ResponseTemplate::new(201).insert_header(
        "Location",
        format!("{}{}/{}", server.uri(), USERS_PATH, id).as_str(),
    )
}

/// Method and path of every request the server received, in order.
pub async fn received(server: &MockServer) -> Vec<(String, String)> {
    server
        .received_requests()
        .await
        .unwrap_or_default()
        .into_iter()
        .map(|request| (request.method.to_string(), request.url.path().to_string()))
        .collect()
}
