// Integration tests for the ingestion API
//
// The router is driven with tower's oneshot; a mockito server stands in for
// the Salesforce instance (token endpoint + sObject create endpoint).

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use forwarder::api::{create_router, ApiState};
use forwarder::registry::build_destinations;
use mockito::{Matcher, Server, ServerGuard};
use relay::config::RelayConfig;
use serde_json::{json, Value};
use tower::ServiceExt;

// ── Helpers ───────────────────────────────────────────────────────────────────

fn relay_config(endpoint: &str) -> RelayConfig {
    let config = format!(
        r#"
        [forwarding]
        max_session_retries = 1

        [salesforce]
        clientId = "client-id"
        clientSecret = "client-secret"
        username = "api@example.com"
        password = "pass"
        endpoint = "{endpoint}"

        [[salesforce.events.identify]]
        salesforce_object = "Lead"
        [salesforce.events.identify.map]
        firstName = "FirstName"
        lastName = "LastName"
        email = "Email"
        "traits.company.name" = "Company"

        [[salesforce.events.track]]
        salesforce_object = "Contact"
        event_name = "Sign Up"
        [salesforce.events.track.map]
        "properties.email" = "Email"
        "properties.lastName" = "LastName"
        "#
    );
    toml::from_str(&config).unwrap()
}

fn create_app(server: &ServerGuard) -> Router {
    let destinations = build_destinations(&relay_config(&server.url())).unwrap();
    create_router(ApiState::new(destinations))
}

async fn token_mock(server: &mut ServerGuard) -> mockito::Mock {
    server
        .mock("POST", "/services/oauth2/token")
        .match_body(Matcher::UrlEncoded("grant_type".into(), "password".into()))
        .with_status(200)
        .with_header("content-type", "application/json")
        .with_body(r#"{"access_token": "tok", "instance_url": "https://na1.salesforce.com"}"#)
        .create_async()
        .await
}

fn post(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header("Content-Type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str) -> Request<Body> {
    Request::builder().uri(uri).body(Body::empty()).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let body = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&body).unwrap()
}

// ── Tests ─────────────────────────────────────────────────────────────────────

/// identify with a matching rule → Lead created, 200
#[tokio::test]
async fn test_identify_is_forwarded() {
    let mut server = Server::new_async().await;
    let _token = token_mock(&mut server).await;
    let lead = server
        .mock("POST", "/services/data/v42.0/sobjects/Lead")
        .match_header("authorization", "Bearer tok")
        .match_body(Matcher::Json(json!({
            "FirstName": "Ada",
            "LastName": "Lovelace",
            "Email": "ada@example.com",
            "Company": "Astronomer"
        })))
        .with_status(201)
        .with_body(r#"{"id": "00Q1", "success": true, "errors": []}"#)
        .expect(1)
        .create_async()
        .await;

    let app = create_app(&server);
    let response = app
        .oneshot(post(
            "/api/events",
            json!({
                "type": "identify",
                "userId": "user-id",
                "traits": {
                    "firstName": "Ada",
                    "lastName": "Lovelace",
                    "email": "ada@example.com",
                    "company": {"name": "Astronomer"}
                }
            }),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["type"], "identify");
    assert_eq!(body["results"][0]["destination"], "salesforce");
    assert_eq!(body["results"][0]["status"], "forwarded");
    assert_eq!(body["results"][0]["response"]["body"]["id"], "00Q1");
    lead.assert_async().await;
}

/// track with no matching rule → skipped, nothing written
#[tokio::test]
async fn test_unmatched_track_is_skipped() {
    let mut server = Server::new_async().await;
    let _token = token_mock(&mut server).await;
    let contact = server
        .mock("POST", "/services/data/v42.0/sobjects/Contact")
        .expect(0)
        .create_async()
        .await;

    let app = create_app(&server);
    let response = app
        .oneshot(post("/api/track", json!({"event": "Login", "userId": "user-id"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["type"], "track");
    assert_eq!(body["results"][0]["status"], "skipped");
    contact.assert_async().await;
}

/// track without an event name → 400 before any outbound request
#[tokio::test]
async fn test_invalid_event_returns_400() {
    let mut server = Server::new_async().await;
    let token = server
        .mock("POST", "/services/oauth2/token")
        .expect(0)
        .create_async()
        .await;

    let app = create_app(&server);
    let response = app
        .oneshot(post("/api/events", json!({"type": "track", "userId": "user-id"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = json_body(response).await;
    assert_eq!(body["kind"], "validation");
    token.assert_async().await;
}

/// Unsupported call type → 400
#[tokio::test]
async fn test_unsupported_type_returns_400() {
    let server = Server::new_async().await;

    let app = create_app(&server);
    let response = app
        .oneshot(post("/api/events", json!({"type": "page", "name": "Home"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

/// Destination rejection → 422 with the error code, counted in /api/destinations
#[tokio::test]
async fn test_rejection_returns_422_and_is_counted() {
    let mut server = Server::new_async().await;
    let _token = token_mock(&mut server).await;
    let _contact = server
        .mock("POST", "/services/data/v42.0/sobjects/Contact")
        .with_status(400)
        .with_body(r#"[{"errorCode": "DUPLICATES_DETECTED", "message": "Use one of these records?"}]"#)
        .create_async()
        .await;

    let app = create_app(&server);
    let response = app
        .clone()
        .oneshot(post(
            "/api/track",
            json!({"event": "Sign Up", "properties": {"email": "grace@example.com"}}),
        ))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    let body = json_body(response).await;
    assert_eq!(body["results"][0]["status"], "failed");
    assert_eq!(body["results"][0]["error_kind"], "destination_rejected");
    assert!(body["results"][0]["error"]
        .as_str()
        .unwrap()
        .contains("DUPLICATES_DETECTED"));

    let response = app.oneshot(get("/api/destinations")).await.unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body[0]["name"], "salesforce");
    assert_eq!(body[0]["forwarded_count"], 0);
    assert_eq!(body[0]["error_count"], 1);
}

/// Token grant failure → 502
#[tokio::test]
async fn test_authentication_failure_returns_502() {
    let mut server = Server::new_async().await;
    let _token = server
        .mock("POST", "/services/oauth2/token")
        .with_status(400)
        .with_body(r#"{"error": "invalid_grant", "error_description": "authentication failure"}"#)
        .create_async()
        .await;

    let app = create_app(&server);
    let response = app
        .oneshot(post("/api/identify", json!({"userId": "user-id"})))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    let body = json_body(response).await;
    assert_eq!(body["results"][0]["error_kind"], "authentication");
}

#[tokio::test]
async fn test_health() {
    let server = Server::new_async().await;

    let app = create_app(&server);
    let response = app.oneshot(get("/health")).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(json_body(response).await, json!({"status": "ok"}));
}
