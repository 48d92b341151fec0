use serde_json::json;
use url::Url;
use wiremock::matchers::{bearer_token, body_json, body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

use realm_user_api::services::auth::{
    PermissionService, UmaPermissionClient,
    permission::{PermissionError, PermissionRequest},
};

const TOKEN_PATH: &str = "/realms/acme/protocol/openid-connect/token";
const PERMISSION_PATH: &str = "/realms/acme/authz/protection/permission";

fn client(server: &MockServer) -> UmaPermissionClient {
    UmaPermissionClient::new(Url::parse(&server.uri()).unwrap(), "acme", "user-api", "s3cret")
}

async fn mount_token_endpoint(server: &MockServer) {
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .and(body_string_contains("grant_type=client_credentials"))
        .and(body_string_contains("client_id=user-api"))
        .and(body_string_contains("client_secret=s3cret"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "pat-token",
            "token_type": "Bearer",
            "expires_in": 300
        })))
        .mount(server)
        .await;
}

#[tokio::test]
async fn exchanges_permission_request_for_ticket() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path(PERMISSION_PATH))
        .and(bearer_token("pat-token"))
        .and(body_json(json!([
            {"resource_id": "addUser", "resource_scopes": ["add-user"]}
        ])))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ticket": "tkt-42"})))
        .expect(1)
        .mount(&server)
        .await;

    let response = client(&server)
        .create_ticket(&PermissionRequest::new("addUser", "add-user"))
        .await
        .unwrap();

    assert_eq!(response.ticket.as_deref(), Some("tkt-42"));
}

#[tokio::test]
async fn response_without_ticket_is_not_an_error() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path(PERMISSION_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;

    let response = client(&server)
        .create_ticket(&PermissionRequest::new("getUsers", "get-users"))
        .await
        .unwrap();

    assert!(response.ticket.is_none());
}

#[tokio::test]
async fn rejected_client_credentials_fail_before_permission_call() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(401).set_body_json(json!({"error": "unauthorized_client"})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(PERMISSION_PATH))
        .respond_with(ResponseTemplate::new(201).set_body_json(json!({"ticket": "tkt"})))
        .expect(0)
        .mount(&server)
        .await;

    let err = client(&server)
        .create_ticket(&PermissionRequest::new("addUser", "add-user"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PermissionError::Status {
            endpoint: "token",
            status: 401
        }
    ));
}

#[tokio::test]
async fn token_response_without_access_token_is_an_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path(TOKEN_PATH))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({"token_type": "Bearer"})))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_ticket(&PermissionRequest::new("addUser", "add-user"))
        .await
        .unwrap_err();

    assert!(matches!(err, PermissionError::MissingAccessToken));
}

#[tokio::test]
async fn permission_endpoint_errors_are_reported() {
    let server = MockServer::start().await;
    mount_token_endpoint(&server).await;
    Mock::given(method("POST"))
        .and(path(PERMISSION_PATH))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_resource_id"
        })))
        .mount(&server)
        .await;

    let err = client(&server)
        .create_ticket(&PermissionRequest::new("nope", "add-user"))
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        PermissionError::Status {
            endpoint: "permission",
            status: 400
        }
    ));
}

#[tokio::test]
async fn unreachable_service_is_a_transport_error() {
    // Nothing listens on the discard port.
    let client = UmaPermissionClient::new(
        Url::parse("http://127.0.0.1:9").unwrap(),
        "acme",
        "user-api",
        "s3cret",
    );

    let err = client
        .create_ticket(&PermissionRequest::new("addUser", "add-user"))
        .await
        .unwrap_err();

    assert!(matches!(err, PermissionError::Transport(_)));
}
