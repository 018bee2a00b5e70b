//! Retry behavior over the real transport

use super::*;
use realm_bootstrap::{
    Credential, ReconcileOutcome, ResourceReconciler, ResourceSpec, RunState, Step,
};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn reconciler(server: &MockServer, max_attempts: u32) -> ResourceReconciler<ReqwestHttpTransport> {
    ResourceReconciler::new(
        &server.uri(),
        Arc::new(ReqwestHttpTransport::new().expect("transport")),
        fast_retry(max_attempts),
    )
    .expect("reconciler")
}

#[tokio::test]
async fn test_always_unavailable_makes_exactly_max_attempts() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REALMS_PATH))
        .respond_with(ResponseTemplate::new(503).set_body_string("unavailable"))
        .expect(4)
        .mount(&server)
        .await;

    let outcome = reconciler(&server, 4)
        .reconcile(
            &ResourceSpec::Realm(RealmSpec::new("durval-crm")),
            &Credential::new(ADMIN_TOKEN),
        )
        .await
        .expect("http-level failures are outcomes");

    match outcome {
        ReconcileOutcome::Failed(error) => {
            assert_eq!(error.status(), Some(503));
            assert_eq!(error.body(), Some("unavailable"));
        }
        other => panic!("expected failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_transient_error_then_success() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(REALMS_PATH))
        .respond_with(ResponseTemplate::new(502))
        .up_to_n_times(2)
        .expect(2)
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(REALMS_PATH))
        .respond_with(ResponseTemplate::new(201))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reconciler(&server, 3)
        .reconcile(
            &ResourceSpec::Realm(RealmSpec::new("durval-crm")),
            &Credential::new(ADMIN_TOKEN),
        )
        .await
        .unwrap();

    assert_eq!(outcome, ReconcileOutcome::Created(None));
}

#[tokio::test]
async fn test_conflict_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(CLIENTS_PATH))
        .respond_with(ResponseTemplate::new(409))
        .expect(1)
        .mount(&server)
        .await;

    let outcome = reconciler(&server, 5)
        .reconcile(
            &ResourceSpec::Client {
                realm: "durval-crm".to_string(),
                spec: ClientSpec::public_pkce("durvalcrm-app"),
            },
            &Credential::new(ADMIN_TOKEN),
        )
        .await
        .unwrap();

    assert_eq!(outcome, ReconcileOutcome::AlreadyExists(None));
}

#[tokio::test]
async fn test_token_acquisition_is_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(503))
        .expect(1)
        .mount(&server)
        .await;

    let report = orchestrator(&config(&server)).run(&plan()).await;

    assert_eq!(report.final_state, RunState::Aborted);
    assert_eq!(report.failures[0].step, Step::Authenticate);
}
