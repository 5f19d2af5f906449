//! Integration tests for the card registry HTTP API
//!
//! These drive the full router (request parsing -> registry -> store ->
//! snapshot files) with an in-memory issuer lookup.

use std::sync::Arc;

use axum::body::{to_bytes, Body};
use axum::http::{Request, StatusCode};
use axum::Router;
use card_registry::{api, IssuerDetails, Registry, SnapshotFiles, StaticLookup};
use serde_json::{json, Value};
use tempfile::TempDir;
use tower::ServiceExt;

fn lookup() -> Arc<StaticLookup> {
    Arc::new(
        StaticLookup::new()
            .with("411111111", IssuerDetails::for_country("Narnia"))
            .with("422222222", IssuerDetails::for_country("Mordor")),
    )
}

fn app(dir: &TempDir) -> Router {
    let registry = Registry::open(SnapshotFiles::in_dir(dir.path()), lookup()).unwrap();
    api::router(Arc::new(registry))
}

async fn send(app: &Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = serde_json::from_slice(&bytes).unwrap_or(Value::Null);
    (status, json)
}

async fn send_raw(app: &Router, uri: &str, body: &str) -> (StatusCode, Value) {
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json")
        .body(Body::from(body.to_string()))
        .unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

fn card_body(number: &str, holder: &str) -> Option<Value> {
    Some(json!({ "cardNumber": number, "cardHolder": holder }))
}

#[tokio::test]
async fn test_health() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(&app, "GET", "/api/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"], "OK");
}

#[tokio::test]
async fn test_card_lifecycle() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    // 1. Register a card
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/cards",
        card_body("4111 1111 1111 1111", "Lucy Pevensie"),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["success"], true);
    assert_eq!(body["data"]["cardNumber"], "4111111111111111");
    assert_eq!(body["data"]["isBanned"], false);
    assert_eq!(body["data"]["details"]["country"]["name"], "Narnia");
    let id = body["data"]["id"].as_str().unwrap().to_string();

    // 2. Fetch it back
    let (status, body) = send(&app, "GET", &format!("/api/v1/cards/{}", id), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["cardHolder"], "Lucy Pevensie");

    // 3. Ban its country: the card is flagged
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/countries/ban",
        Some(json!({ "countries": ["Narnia"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["banned"], json!(["Narnia"]));

    let (_, body) = send(&app, "GET", &format!("/api/v1/cards/{}", id), None).await;
    assert_eq!(body["data"]["isBanned"], true);

    // 4. Banning again reports nothing new
    let (_, body) = send(
        &app,
        "POST",
        "/api/v1/countries/ban",
        Some(json!({ "countries": ["narnia"] })),
    )
    .await;
    assert_eq!(body["data"]["banned"], json!([]));

    // 5. Unban clears the flag
    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/countries/unban",
        Some(json!({ "countries": ["NARNIA", "Atlantis"] })),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["data"]["unbanned"], json!(["Narnia"]));

    let (_, body) = send(&app, "GET", "/api/v1/cards", None).await;
    assert_eq!(body["data"].as_array().unwrap().len(), 1);
    assert_eq!(body["data"][0]["isBanned"], false);

    let (_, body) = send(&app, "GET", "/api/v1/countries/ban", None).await;
    assert_eq!(body["data"]["banned"], json!([]));
}

#[tokio::test]
async fn test_rejections() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        "POST",
        "/api/v1/cards",
        card_body("4111 1111 1111 111", "Short"),
    )
    .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["success"], false);
    assert_eq!(body["error"]["statusCode"], 422);

    send(&app, "POST", "/api/v1/cards", card_body("4111111111111111", "First")).await;
    let (status, _) = send(&app, "POST", "/api/v1/cards", card_body("4111111111111111", "Again")).await;
    assert_eq!(status, StatusCode::CONFLICT);

    send(
        &app,
        "POST",
        "/api/v1/countries/ban",
        Some(json!({ "countries": ["Mordor"] })),
    )
    .await;
    let (status, body) = send(&app, "POST", "/api/v1/cards", card_body("4222222222222222", "Sauron")).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert!(body["error"]["error"].as_str().unwrap().contains("Mordor"));

    // Unknown prefix: the lookup has no result
    let (status, _) = send(&app, "POST", "/api/v1/cards", card_body("5999999999999999", "Nobody")).await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}

#[tokio::test]
async fn test_malformed_requests() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send_raw(&app, "/api/v1/cards", "{not json").await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"]["statusCode"], 400);

    let (status, _) = send_raw(&app, "/api/v1/cards", r#"{"cardHolder":"No Number"}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_raw(
        &app,
        "/api/v1/cards",
        r#"{"cardNumber":"4111111111111111","cardHolder":"A","cvv":"123"}"#,
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send_raw(&app, "/api/v1/countries/ban", r#"{"names":["Oz"]}"#).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = send(&app, "GET", "/api/v1/cards/not-a-uuid", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_unknown_card_not_found() {
    let dir = TempDir::new().unwrap();
    let app = app(&dir);

    let (status, body) = send(
        &app,
        "GET",
        "/api/v1/cards/00000000-0000-4000-8000-000000000000",
        None,
    )
    .await;

    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"]["statusCode"], 404);
}

#[tokio::test]
async fn test_state_reloaded_after_restart() {
    let dir = TempDir::new().unwrap();

    let id = {
        let app = app(&dir);
        let (_, body) = send(&app, "POST", "/api/v1/cards", card_body("4222222222222222", "Sauron")).await;
        send(
            &app,
            "POST",
            "/api/v1/countries/ban",
            Some(json!({ "countries": ["Mordor", "Oz"] })),
        )
        .await;
        body["data"]["id"].as_str().unwrap().to_string()
    };

    let app = app(&dir);
    let (_, body) = send(&app, "GET", &format!("/api/v1/cards/{}", id), None).await;
    assert_eq!(body["data"]["cardHolder"], "Sauron");
    assert_eq!(body["data"]["isBanned"], true);

    let (_, body) = send(&app, "GET", "/api/v1/countries/ban", None).await;
    assert_eq!(body["data"]["banned"], json!(["Mordor", "Oz"]));
}
