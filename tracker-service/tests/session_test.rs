//! Session gate tests, driven through the router with `oneshot`.

mod common;

use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
};
use common::{test_config, test_router, SESSION_COOKIE};
use serde_json::Value;
use tower::ServiceExt;

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

#[tokio::test]
async fn dashboard_routes_require_session() {
    let app = test_router(test_config());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/organizations?userId=user-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    let body = json_body(response).await;
    assert_eq!(body["error"], "Unauthorized");
}

#[tokio::test]
async fn session_cookie_opens_dashboard_routes() {
    let app = test_router(test_config());

    let response = app
        .oneshot(
            Request::builder()
                .uri("/api/v1/organizations?userId=user-123")
                .header(header::COOKIE, SESSION_COOKIE)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["data"], serde_json::json!([]));
}

#[tokio::test]
async fn public_paths_skip_the_gate() {
    for uri in ["/health", "/ready", "/metrics"] {
        let response = test_router(test_config())
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK, "{}", uri);
    }

    // Reaches the handler, which rejects the empty payload.
    let response = test_router(test_config())
        .oneshot(
            Request::builder()
                .method("POST")
                .uri("/api/v1/track")
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from("{}"))
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn hello_returns_session() {
    let response = test_router(test_config())
        .oneshot(
            Request::builder()
                .uri("/api")
                .header(header::COOKIE, "theme=dark; __Secure-next-auth.session-token=xyz")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let body = json_body(response).await;
    assert_eq!(body["message"], "Hello LLM Tracker");
    assert_eq!(
        body["session"]["cookie_name"],
        "__Secure-next-auth.session-token"
    );
}

#[tokio::test]
async fn disabled_gate_still_requires_session_for_hello() {
    let mut config = test_config();
    config.session.required = false;

    let response = test_router(config.clone())
        .oneshot(
            Request::builder()
                .uri("/api/v1/organizations?userId=user-123")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = test_router(config)
        .oneshot(Request::builder().uri("/api").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn cors_preflight_allows_configured_origin() {
    let response = test_router(test_config())
        .oneshot(
            Request::builder()
                .method("OPTIONS")
                .uri("/api/v1/projects")
                .header(header::ORIGIN, "http://localhost:3000")
                .header(header::ACCESS_CONTROL_REQUEST_METHOD, "POST")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(
        response
            .headers()
            .get(header::ACCESS_CONTROL_ALLOW_ORIGIN)
            .and_then(|v| v.to_str().ok()),
        Some("http://localhost:3000")
    );
}
