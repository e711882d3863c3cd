//! Router-level tests for the passcode endpoints and the edge gate.
//!
//! Requests are driven through the full router with `oneshot`; the upstream
//! is replaced by a recorder so forwarding can be asserted (or ruled out).

use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use axum::body::{Body, Bytes};
use axum::http::{header, HeaderMap, HeaderValue, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use tower::ServiceExt;

use mozi::config::Config;
use mozi::error::AppResult;
use mozi::gate::{ForwardRequest, ForwardResponse, Upstream};
use mozi::state::AppState;
use mozi::upstream::HttpUpstream;

const PASSCODE: &str = "Mozi2024";
const COOKIE: &str = "passcode_auth=true";

#[derive(Default)]
struct RecordingUpstream {
    requests: Mutex<Vec<ForwardRequest>>,
}

impl RecordingUpstream {
    fn requests(&self) -> Vec<ForwardRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Upstream for RecordingUpstream {
    async fn forward(&self, request: ForwardRequest) -> AppResult<ForwardResponse> {
        self.requests.lock().unwrap().push(request);

        let mut headers = HeaderMap::new();
        headers.insert(header::CONTENT_TYPE, HeaderValue::from_static("application/json"));
        headers.insert("x-upstream", HeaderValue::from_static("yes"));
        headers.insert(header::CONNECTION, HeaderValue::from_static("close"));
        Ok(ForwardResponse {
            status: StatusCode::CREATED,
            headers,
            body: Bytes::from_static(br#"{"ok":true}"#),
        })
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.auth.passcode = Some(PASSCODE.to_string());
    config.upstream.base_url = "http://backend:8000/api".to_string();
    config.upstream.api_key = "server-side-key".to_string();
    config
}

fn app_with(config: Config) -> (Router, Arc<RecordingUpstream>) {
    let upstream = Arc::new(RecordingUpstream::default());
    let state = AppState::new(config, upstream.clone());
    (mozi::routes::app(state), upstream)
}

fn app() -> (Router, Arc<RecordingUpstream>) {
    app_with(test_config())
}

async fn body_string(response: Response) -> String {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    String::from_utf8(bytes.to_vec()).unwrap()
}

fn verify_request(passcode: &str) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri("/auth/verify")
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(
            serde_json::json!({ "passcode": passcode }).to_string(),
        ))
        .unwrap()
}

// ============================================================================
// EDGE GATE
// ============================================================================

#[tokio::test]
async fn backend_call_without_cookie_is_rejected_and_not_forwarded() {
    let (app, upstream) = app();

    let response = app
        .oneshot(
            Request::builder()
                .uri("/backend/movies")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        response.headers().get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(
        body_string(response).await,
        r#"{"error":"Unauthorized: Passcode required"}"#
    );
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn bare_prefix_is_gated_too() {
    let (app, upstream) = app();
    let response = app
        .oneshot(Request::builder().uri("/backend").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn authenticated_call_is_rewritten_with_api_key() {
    let (app, upstream) = app();

    let response = app
        .oneshot(
            Request::builder()
                .method(Method::POST)
                .uri("/backend/favorites?source=web")
                .header(header::HOST, "mozi.example")
                .header(header::COOKIE, COOKIE)
                .header(header::CONTENT_TYPE, "application/json")
                .header("x-api-key", "forged-by-browser")
                .body(Body::from(r#"{"movie_title":"Bambi"}"#))
                .unwrap(),
        )
        .await
        .unwrap();

    let requests = upstream.requests();
    assert_eq!(requests.len(), 1);
    let forwarded = &requests[0];
    assert_eq!(forwarded.method, Method::POST);
    assert_eq!(
        forwarded.url.as_str(),
        "http://backend:8000/api/favorites?source=web"
    );
    assert_eq!(forwarded.headers.get("x-api-key").unwrap(), "server-side-key");
    assert!(forwarded.headers.get(header::HOST).is_none());
    assert_eq!(
        forwarded.headers.get(header::CONTENT_TYPE).unwrap(),
        "application/json"
    );
    assert_eq!(forwarded.body.as_ref(), br#"{"movie_title":"Bambi"}"#);

    assert_eq!(response.status(), StatusCode::CREATED);
    assert_eq!(response.headers().get("x-upstream").unwrap(), "yes");
    assert!(response.headers().get(header::CONNECTION).is_none());
    assert_eq!(body_string(response).await, r#"{"ok":true}"#);
}

#[tokio::test]
async fn encoded_titles_survive_the_rewrite() {
    let (app, upstream) = app();

    app.oneshot(
        Request::builder()
            .method(Method::DELETE)
            .uri("/backend/favorites/%C3%81gnes%20%2F%202")
            .header(header::COOKIE, COOKIE)
            .body(Body::empty())
            .unwrap(),
    )
    .await
    .unwrap();

    let requests = upstream.requests();
    assert_eq!(
        requests[0].url.path(),
        "/api/favorites/%C3%81gnes%20%2F%202"
    );
}

#[tokio::test]
async fn non_backend_paths_pass_through_untouched() {
    let (app, upstream) = app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);

    let response = app
        .oneshot(
            Request::builder()
                .uri("/backendish")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::NOT_FOUND);

    assert!(upstream.requests().is_empty());
}

#[tokio::test]
async fn unreachable_upstream_is_a_bad_gateway() {
    let mut config = test_config();
    config.upstream.base_url = "http://127.0.0.1:1/api".to_string();
    let upstream = HttpUpstream::new(Duration::from_secs(2)).unwrap();
    let app = mozi::routes::app(AppState::new(config, Arc::new(upstream)));

    let response = app
        .oneshot(
            Request::builder()
                .uri("/backend/status")
                .header(header::COOKIE, COOKIE)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    assert_eq!(
        body_string(response).await,
        r#"{"error":"Upstream unavailable"}"#
    );
}

// ============================================================================
// PASSCODE VERIFIER
// ============================================================================

#[tokio::test]
async fn correct_passcode_sets_session_cookie() {
    let (app, _) = app();

    let response = app.oneshot(verify_request(PASSCODE)).await.unwrap();

    assert_eq!(response.status(), StatusCode::OK);
    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    assert!(cookie.starts_with("passcode_auth=true;"));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("SameSite=Lax"));
    assert!(cookie.contains("Path=/"));
    assert!(cookie.contains("Max-Age=2592000"));
    assert!(!cookie.contains("Secure"));
    assert_eq!(body_string(response).await, r#"{"success":true}"#);
}

#[tokio::test]
async fn production_cookie_is_secure() {
    let mut config = test_config();
    config.server.production = true;
    let (app, _) = app_with(config);

    let response = app.oneshot(verify_request(PASSCODE)).await.unwrap();
    let cookie = response.headers().get(header::SET_COOKIE).unwrap();
    assert!(cookie.to_str().unwrap().contains("Secure"));
}

#[tokio::test]
async fn wrong_passcode_is_rejected_without_cookie() {
    let (app, _) = app();

    for attempt in ["mozi2024", " Mozi2024", "Mozi2024 ", ""] {
        let response = app.clone().oneshot(verify_request(attempt)).await.unwrap();
        assert_eq!(response.status(), StatusCode::OK);
        assert!(response.headers().get(header::SET_COOKIE).is_none());
        let body: serde_json::Value =
            serde_json::from_str(&body_string(response).await).unwrap();
        assert_eq!(body["success"], false);
        assert_eq!(body["error"], "Helytelen jelkód");
    }
}

#[tokio::test]
async fn missing_secret_reports_generic_configuration_error() {
    let mut config = test_config();
    config.auth.passcode = None;
    let (app, _) = app_with(config);

    let response = app.oneshot(verify_request(PASSCODE)).await.unwrap();

    assert!(response.headers().get(header::SET_COOKIE).is_none());
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Server configuration error");
}

#[tokio::test]
async fn logout_clears_cookie_even_without_session() {
    let (app, _) = app();

    for cookie in [Some(COOKIE), None] {
        let mut request = Request::builder().method(Method::POST).uri("/auth/logout");
        if let Some(cookie) = cookie {
            request = request.header(header::COOKIE, cookie);
        }
        let response = app
            .clone()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::NO_CONTENT);
        let set_cookie = response.headers().get(header::SET_COOKIE).unwrap();
        assert!(set_cookie.to_str().unwrap().contains("Max-Age=0"));
    }
}

#[tokio::test]
async fn check_reports_cookie_presence() {
    let (app, _) = app();

    let response = app
        .clone()
        .oneshot(Request::builder().uri("/auth/check").body(Body::empty()).unwrap())
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["authenticated"], false);
    assert_eq!(body["app_name"], "Mi megy a moziba?");

    let response = app
        .oneshot(
            Request::builder()
                .uri("/auth/check")
                .header(header::COOKIE, COOKIE)
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();
    let body: serde_json::Value = serde_json::from_str(&body_string(response).await).unwrap();
    assert_eq!(body["authenticated"], true);
}
