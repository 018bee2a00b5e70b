//! End-to-end provisioning runs

use super::*;
use realm_bootstrap::{FailurePolicy, InMemoryEventSink, RunState, Step, StepStatus};
use serde_json::json;
use wiremock::matchers::{body_json, body_partial_json, header, method, path, query_param};
use wiremock::{Mock, MockServer, ResponseTemplate};

const BEARER: &str = "Bearer admin-token";

#[tokio::test]
async fn test_fresh_server_provisions_everything() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path(REALMS_PATH))
        .and(header("authorization", BEARER))
        .and(body_partial_json(json!({"realm": "durval-crm", "enabled": true})))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLIENTS_PATH))
        .and(header("authorization", BEARER))
        .and(body_partial_json(json!({
            "clientId": "durvalcrm-app",
            "publicClient": true,
            "attributes": {"pkce.code.challenge.method": "S256"}
        })))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(USERS_PATH))
        .and(body_partial_json(json!({"username": "tesouraria", "enabled": true})))
        .respond_with(user_created(&server, "u-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/u-1/reset-password", USERS_PATH)))
        .and(header("authorization", BEARER))
        .and(body_json(json!({
            "type": "password",
            "value": "cairbar@2025",
            "temporary": false
        })))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let sink = Arc::new(InMemoryEventSink::new());
    let report = orchestrator(&config(&server))
        .with_event_sink(sink.clone())
        .run(&plan())
        .await;

    assert!(report.is_success(), "{:?}", report.failures);
    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.user_id.as_deref(), Some("u-1"));
    assert_eq!(
        sink.steps(),
        vec![
            Step::Authenticate,
            Step::Realm,
            Step::Client,
            Step::User,
            Step::Credential
        ]
    );

    let paths: Vec<String> = received(&server).await.into_iter().map(|(_, p)| p).collect();
    assert_eq!(
        paths,
        vec![
            TOKEN_PATH.to_string(),
            REALMS_PATH.to_string(),
            CLIENTS_PATH.to_string(),
            USERS_PATH.to_string(),
            format!("{}/u-1/reset-password", USERS_PATH),
        ]
    );
}

#[tokio::test]
async fn test_existing_resources_are_confirmed() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path(REALMS_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "errorMessage": "Conflict detected. See logs for details"
        })))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLIENTS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(USERS_PATH))
        .respond_with(ResponseTemplate::new(409).set_body_json(json!({
            "errorMessage": "User exists with same username"
        })))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(USERS_PATH))
        .and(query_param("username", "tesouraria"))
        .and(query_param("exact", "true"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!([
            {"id": "u-9", "username": "tesouraria", "enabled": true}
        ])))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/u-9/reset-password", USERS_PATH)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let report = orchestrator(&config(&server)).run(&plan()).await;

    assert_eq!(report.exit_code(), 0);
    assert_eq!(report.status_of(Step::Realm), Some(StepStatus::AlreadyExists));
    assert_eq!(report.status_of(Step::Client), Some(StepStatus::Created));
    assert_eq!(report.status_of(Step::User), Some(StepStatus::AlreadyExists));
    assert_eq!(report.status_of(Step::Credential), Some(StepStatus::Created));
    assert_eq!(report.user_id.as_deref(), Some("u-9"));
}

#[tokio::test]
async fn test_second_run_is_idempotent() {
    let server = MockServer::start().await;
    let config = config(&server);

    mount_token(&server).await;
    Mock::given(method("POST"))
        .and(path(REALMS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLIENTS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(USERS_PATH))
        .respond_with(user_created(&server, "u-1"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/u-1/reset-password", USERS_PATH)))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let first = orchestrator(&config).run(&plan()).await;
    assert!(first.is_success());

    // Everything now exists.
    server.reset().await;
    mount_token(&server).await;
    for collection in [REALMS_PATH, CLIENTS_PATH, USERS_PATH] {
        Mock::given(method("POST"))
            .and(path(collection))
            .respond_with(ResponseTemplate::new(409))
            .mount(&server)
            .await;
    }
    Mock::given(method("GET"))
        .and(path(USERS_PATH))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_json(json!([{"id": "u-1", "username": "tesouraria"}])),
        )
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/u-1/reset-password", USERS_PATH)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let second = orchestrator(&config).run(&plan()).await;

    assert_eq!(second.exit_code(), 0);
    assert_eq!(second.final_state, first.final_state);
    assert_eq!(second.user_id, first.user_id);
    for step in [Step::Realm, Step::Client, Step::User] {
        assert_eq!(second.status_of(step), Some(StepStatus::AlreadyExists));
    }
}

#[tokio::test]
async fn test_persistent_server_error_aborts_at_realm() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path(REALMS_PATH))
        .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
        .expect(3)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLIENTS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(USERS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let report = orchestrator(&config(&server)).run(&plan()).await;

    assert_eq!(report.final_state, RunState::Aborted);
    assert_eq!(report.exit_code(), 1);
    let failure = &report.failures[0];
    assert_eq!(failure.step, Step::Realm);
    assert_eq!(failure.http_status, Some(500));
    assert_eq!(failure.body.as_deref(), Some("internal error"));
}

#[tokio::test]
async fn test_client_rejection_does_not_block_user() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("POST"))
        .and(path(REALMS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLIENTS_PATH))
        .respond_with(
            ResponseTemplate::new(400)
                .set_body_json(json!({"errorMessage": "Invalid redirect uri"})),
        )
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(USERS_PATH))
        .respond_with(user_created(&server, "u-1"))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/u-1/reset-password", USERS_PATH)))
        .respond_with(ResponseTemplate::new(204))
        .expect(1)
        .mount(&server)
        .await;

    let report = orchestrator(&config(&server)).run(&plan()).await;

    assert_eq!(report.final_state, RunState::Done);
    assert!(report.is_degraded());
    assert_eq!(report.exit_code(), 2);
    assert_eq!(report.status_of(Step::Client), Some(StepStatus::Failed));
    assert_eq!(report.status_of(Step::User), Some(StepStatus::Created));
    assert_eq!(report.status_of(Step::Credential), Some(StepStatus::Created));

    let failure = &report.failures[0];
    assert_eq!(failure.step, Step::Client);
    assert_eq!(failure.http_status, Some(400));
    assert!(failure
        .body
        .as_deref()
        .is_some_and(|body| body.contains("Invalid redirect uri")));
}

#[tokio::test]
async fn test_rejected_admin_credentials_stop_the_run() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({
            "error": "invalid_grant",
            "error_description": "Invalid user credentials"
        })))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REALMS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(0)
        .mount(&server)
        .await;

    let report = orchestrator(&config(&server)).run(&plan()).await;

    assert_eq!(report.final_state, RunState::Aborted);
    assert_eq!(report.exit_code(), 1);
    assert_eq!(report.failures[0].step, Step::Authenticate);
    assert_eq!(report.failures[0].http_status, Some(401));
    assert_eq!(received(&server).await.len(), 1);
}

#[tokio::test]
async fn test_recreate_realm_deletes_before_create() {
    let server = MockServer::start().await;
    mount_token(&server).await;

    Mock::given(method("DELETE"))
        .and(path("/admin/realms/durval-crm"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REALMS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(CLIENTS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(USERS_PATH))
        .respond_with(user_created(&server, "u-1"))
        .mount(&server)
        .await;
    Mock::given(method("PUT"))
        .and(path(format!("{}/u-1/reset-password", USERS_PATH)))
        .respond_with(ResponseTemplate::new(204))
        .mount(&server)
        .await;

    let mut config = config(&server);
    config.policy = FailurePolicy {
        recreate_realm: true,
        ..Default::default()
    };
    let report = orchestrator(&config).run(&plan()).await;

    assert!(report.is_success());
    assert_eq!(report.status_of(Step::DeleteRealm), Some(StepStatus::Succeeded));

    let requests = received(&server).await;
    assert_eq!(requests[1], ("DELETE".to_string(), "/admin/realms/durval-crm".to_string()));
    assert_eq!(requests[2], ("POST".to_string(), REALMS_PATH.to_string()));
}
