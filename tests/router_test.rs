//! HTTP-surface tests driven through the router without a network socket.

mod common;

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use common::{test_config, TestPortal};
use guest_portal::middleware::rate_limit::create_ip_rate_limiter;
use guest_portal::{build_router, AppState};
use serde_json::{json, Value};
use tower::ServiceExt;

fn test_state(portal: &TestPortal) -> AppState {
    AppState {
        config: test_config(),
        store: portal.store.clone(),
        challenge: portal.challenge.clone(),
        registration: portal.service.clone(),
        register_rate_limiter: create_ip_rate_limiter(100, 60),
    }
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), 64 * 1024)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn health_reports_ok_with_reachable_store() {
    let portal = TestPortal::new();
    let app = build_router(test_state(&portal));

    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["store"], "ok");
}

#[tokio::test]
async fn challenge_endpoint_mints_an_id() {
    let portal = TestPortal::new();
    let app = build_router(test_state(&portal));

    let response = app
        .oneshot(Request::get("/api/v1/captcha").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["challenge_id"].as_str().unwrap().len(), 32);
}

#[tokio::test]
async fn rejected_registration_returns_400_with_field_errors() {
    let portal = TestPortal::new();
    let app = build_router(test_state(&portal));

    let payload = json!({
        "email": "bad-address",
        "challenge_id": "unknown",
        "challenge_answer": "123456",
        "tier": "self-service"
    });

    let response = app
        .oneshot(
            Request::post("/api/v1/register")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(payload.to_string()))
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert_eq!(body["accepted"], false);
    assert_eq!(body["field_errors"]["email"], "Invalid email address");
    assert!(portal.store.is_empty());
}

#[tokio::test]
async fn approve_with_unknown_token_returns_404() {
    let portal = TestPortal::new();
    let app = build_router(test_state(&portal));

    let response = app
        .oneshot(
            Request::get("/api/v1/approve?id=deadbeef")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    // Generic rejection: never distinguishes unknown from consumed tokens.
    assert_eq!(body["error"], "Invalid request");
}
