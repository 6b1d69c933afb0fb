//! HTTP contract tests, driven in-process through the router.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use http_body_util::BodyExt;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

use server::{build_router, ServerConfig, ServerState};

fn test_router() -> Router {
    let state = Arc::new(ServerState::new(ServerConfig::default()).unwrap());
    build_router(state)
}

async fn body_json(response: axum::response::Response) -> Value {
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    serde_json::from_slice(&bytes).unwrap()
}

fn detect_request(payload: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri("/detect")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(payload.to_string()))
        .unwrap()
}

#[tokio::test]
async fn health_returns_ok() {
    let app = test_router();
    let response = app
        .oneshot(Request::get("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
}

#[tokio::test]
async fn readiness_reports_components() {
    let app = test_router();
    let response = app
        .oneshot(Request::get("/ready").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ready");
    assert_eq!(body["components"]["index"], "ready");
}

#[tokio::test]
async fn root_lists_endpoints() {
    let app = test_router();
    let response = app
        .oneshot(Request::get("/").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert!(body["endpoints"]
        .as_array()
        .unwrap()
        .contains(&json!("/detect")));
}

#[tokio::test]
async fn unknown_route_returns_404_with_detail() {
    let app = test_router();
    let response = app
        .oneshot(Request::get("/nope").body(Body::empty()).unwrap())
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    let body = body_json(response).await;
    assert!(body["detail"].is_string());
}

#[tokio::test]
async fn first_submission_returns_created_with_no_matches() {
    let app = test_router();
    let response = app
        .oneshot(detect_request(json!({
            "student_id": "s-1",
            "assignment_id": "a-1",
            "code": "def f(x):\n    return x + 1"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::CREATED);
    let body = body_json(response).await;
    // Server generated an id since none was supplied.
    assert!(!body["submission_id"].as_str().unwrap().is_empty());
    assert_eq!(body["top_matches"], json!([]));
}

#[tokio::test]
async fn duplicate_submission_is_reported_over_http() {
    let app = test_router();
    let code = "def gcd(a, b):\n    while b:\n        a, b = b, a % b\n    return a";

    let response = app
        .clone()
        .oneshot(detect_request(json!({
            "student_id": "s-1",
            "assignment_id": "a-1",
            "submission_id": "first",
            "code": code
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = app
        .oneshot(detect_request(json!({
            "student_id": "s-2",
            "assignment_id": "a-1",
            "submission_id": "second",
            "code": code
        })))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["submission_id"], "second");
    let matches = body["top_matches"].as_array().unwrap();
    assert_eq!(matches.len(), 1);
    assert_eq!(matches[0]["submission_id"], "first");
    assert_eq!(matches[0]["clone_type"], "Type-1/2");
    assert_eq!(matches[0]["similarity"], 1.0);
}

#[tokio::test]
async fn empty_code_is_rejected_with_400() {
    let app = test_router();
    let response = app
        .oneshot(detect_request(json!({
            "student_id": "s-1",
            "assignment_id": "a-1",
            "code": "   \n  "
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    let body = body_json(response).await;
    assert!(body["detail"].as_str().unwrap().contains("code"));
}

#[tokio::test]
async fn blank_student_id_is_rejected_with_400() {
    let app = test_router();
    let response = app
        .oneshot(detect_request(json!({
            "student_id": "",
            "assignment_id": "a-1",
            "code": "def f():\n    return 1"
        })))
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}
