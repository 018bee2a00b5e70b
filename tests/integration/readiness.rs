//! Readiness wait

use super::*;
use realm_bootstrap::{wait_until_ready, BootstrapError, ReadinessConfig};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn readiness(attempts: u32) -> ReadinessConfig {
    ReadinessConfig {
        attempts,
        interval: Duration::from_millis(1),
        ..Default::default()
    }
}

#[tokio::test]
async fn test_waits_until_master_realm_answers() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/realms/master"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(2)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/realms/master"))
        .respond_with(ResponseTemplate::new(200))
        .mount(&server)
        .await;

    let transport = ReqwestHttpTransport::new().unwrap();
    wait_until_ready(&transport, &server.uri(), &readiness(5))
        .await
        .unwrap();

    assert_eq!(received(&server).await.len(), 3);
}

#[tokio::test]
async fn test_gives_up_after_attempt_budget() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/realms/master"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3)
        .mount(&server)
        .await;

    let transport = ReqwestHttpTransport::new().unwrap();
    let result = wait_until_ready(&transport, &server.uri(), &readiness(3)).await;

    assert!(matches!(result, Err(BootstrapError::NotReady { attempts: 3 })));
}
