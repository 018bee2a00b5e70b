//! Admin token acquisition

use super::*;
use realm_bootstrap::{
    AdminCredentials, AuthError, BootstrapError, PasswordGrantTokenManager, TokenManager,
};
use wiremock::matchers::{body_string_contains, header, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn manager(server: &MockServer) -> PasswordGrantTokenManager<ReqwestHttpTransport> {
    PasswordGrantTokenManager::new(
        AdminCredentials::from_config(&config(server)),
        Arc::new(ReqwestHttpTransport::new().unwrap()),
    )
}

#[tokio::test]
async fn test_password_grant_sends_form() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(header("content-type", "application/x-www-form-urlencoded"))
        .and(body_string_contains("username=admin"))
        .and(body_string_contains("password=admin"))
        .respond_with(
            ResponseTemplate::new(200).set_body_json(json!({"access_token": "abc"})),
        )
        .expect(1)
        .mount(&server)
        .await;

    let credential = manager(&server).acquire().await.unwrap();

    assert_eq!(credential.authorization_header(), "Bearer abc");
}

#[tokio::test]
async fn test_rejection_keeps_raw_body() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_string("{\"error\":\"invalid_grant\"}"))
        .mount(&server)
        .await;

    let error = manager(&server).acquire().await.unwrap_err();

    match error {
        BootstrapError::Auth(AuthError::Rejected { status, body }) => {
            assert_eq!(status, 401);
            assert_eq!(body, "{\"error\":\"invalid_grant\"}");
        }
        other => panic!("unexpected error: {:?}", other),
    }
}

#[tokio::test]
async fn test_missing_access_token_is_an_auth_failure() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "Bearer"})))
        .mount(&server)
        .await;

    let error = manager(&server).acquire().await.unwrap_err();

    assert!(matches!(
        error,
        BootstrapError::Auth(AuthError::MissingAccessToken { .. })
    ));
}
