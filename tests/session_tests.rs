//! Session and gate integration tests: cookie issue/clear and the
//! authentication + admin role chain in front of `GET /users`.

use axum::body::Body;
use axum::http::{header, Request, StatusCode};
use axum::Router;
use chrono::{Duration, Utc};
use serde_json::{json, Map, Value};
use tower::ServiceExt;

use techhub::config::{Config, Environment};
use techhub::identity::TokenSigner;
use techhub::server::{router, AppState};
use techhub::storage::into_document;

const SECRET: &str = "session-test-secret";

fn test_state() -> AppState {
    AppState::new(Config::with_secret(SECRET)).unwrap()
}

fn seed_user(state: &AppState, user: Value) {
    state.users.collection().insert_one(into_document(user).unwrap()).unwrap();
}

fn post_json(uri: &str, body: Value) -> Request<Body> {
    Request::builder()
        .method("POST")
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get_with_cookie(uri: &str, token: &str) -> Request<Body> {
    Request::builder()
        .uri(uri)
        .header(header::COOKIE, format!("token={token}"))
        .body(Body::empty())
        .unwrap()
}

fn set_cookie(resp: &axum::response::Response) -> String {
    resp.headers()
        .get(header::SET_COOKIE)
        .expect("set-cookie header")
        .to_str()
        .unwrap()
        .to_string()
}

async fn body_json(resp: axum::response::Response) -> Value {
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Log in through `POST /jwt` and return the raw token value from the cookie.
async fn login(app: &Router, email: &str) -> String {
    let resp = app.clone().oneshot(post_json("/jwt", json!({ "email": email }))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = set_cookie(&resp);
    let pair = cookie.split(';').next().unwrap();
    pair.strip_prefix("token=").unwrap().to_string()
}

#[tokio::test]
async fn root_reports_running() {
    let app = router(test_state());
    let resp = app.oneshot(Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await.unwrap();
    assert_eq!(&bytes[..], b"TechHub SERVER IS RUNNING");
}

#[tokio::test]
async fn jwt_sets_http_only_strict_cookie_outside_production() {
    let app = router(test_state());
    let resp = app.oneshot(post_json("/jwt", json!({ "email": "a@x.com", "name": "A" }))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = set_cookie(&resp);
    assert!(cookie.starts_with("token="), "{cookie}");
    assert!(cookie.contains("HttpOnly"), "{cookie}");
    assert!(cookie.contains("SameSite=Strict"), "{cookie}");
    assert!(!cookie.contains("Secure"), "{cookie}");
    assert_eq!(body_json(resp).await, json!({ "success": true }));
}

#[tokio::test]
async fn jwt_cookie_is_cross_site_in_production() {
    let mut config = Config::with_secret(SECRET);
    config.environment = Environment::Production;
    let app = router(AppState::new(config).unwrap());

    let resp = app.oneshot(post_json("/jwt", json!({ "email": "a@x.com" }))).await.unwrap();
    let cookie = set_cookie(&resp);
    assert!(cookie.contains("SameSite=None"), "{cookie}");
    assert!(cookie.contains("Secure"), "{cookie}");
    assert!(cookie.contains("HttpOnly"), "{cookie}");
}

#[tokio::test]
async fn issued_token_carries_submitted_claims() {
    let state = test_state();
    let signer = TokenSigner::new(SECRET.as_bytes(), Duration::days(365)).unwrap();
    let app = router(state);

    let resp = app
        .clone()
        .oneshot(post_json("/jwt", json!({ "email": "a@x.com", "name": "Alice" })))
        .await
        .unwrap();
    let cookie = set_cookie(&resp);
    let token = cookie.split(';').next().unwrap().trim_start_matches("token=");
    let claims = signer.verify(token).unwrap();
    assert_eq!(claims.email, "a@x.com");
    assert_eq!(claims.extra["name"], "Alice");
    assert!(claims.exp > Utc::now().timestamp());
}

#[tokio::test]
async fn login_with_audience_claim_still_passes_the_admin_gate() {
    let state = test_state();
    seed_user(&state, json!({ "email": "admin@x.com", "role": "admin" }));
    let app = router(state);

    let resp = app
        .clone()
        .oneshot(post_json("/jwt", json!({ "email": "admin@x.com", "aud": "web", "iss": "spa" })))
        .await
        .unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let cookie = set_cookie(&resp);
    let token = cookie.split(';').next().unwrap().trim_start_matches("token=");

    let resp = app.oneshot(get_with_cookie("/users", token)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
}

#[tokio::test]
async fn jwt_without_email_is_bad_request() {
    let app = router(test_state());
    let resp = app.oneshot(post_json("/jwt", json!({ "name": "anon" }))).await.unwrap();
    assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    assert!(resp.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(body_json(resp).await["code"], "missing_email");
}

#[tokio::test]
async fn logout_expires_cookie_even_without_session() {
    let app = router(test_state());
    let resp = app.oneshot(Request::builder().uri("/logout").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);

    let cookie = set_cookie(&resp);
    assert!(cookie.starts_with("token=;"), "{cookie}");
    assert!(cookie.contains("Max-Age=0"), "{cookie}");
    assert!(cookie.contains("HttpOnly"), "{cookie}");
    assert_eq!(body_json(resp).await, json!({ "success": true }));
}

#[tokio::test]
async fn users_without_cookie_is_401_and_never_reaches_the_store() {
    let state = test_state();
    seed_user(&state, json!({ "email": "admin@x.com", "role": "admin" }));
    let before = state.store.operations();
    let app = router(state.clone());

    let resp = app.oneshot(Request::builder().uri("/users").body(Body::empty()).unwrap()).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(resp).await["message"], "unauthorized access");
    assert_eq!(state.store.operations(), before);
}

#[tokio::test]
async fn forged_or_expired_tokens_are_401() {
    let state = test_state();
    seed_user(&state, json!({ "email": "admin@x.com", "role": "admin" }));
    let app = router(state);

    let foreign = TokenSigner::new(b"some-other-secret", Duration::days(1)).unwrap();
    let forged = foreign.issue("admin@x.com", Map::new()).unwrap();
    let resp = app.clone().oneshot(get_with_cookie("/users", &forged)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let ours = TokenSigner::new(SECRET.as_bytes(), Duration::days(1)).unwrap();
    let expired = ours.issue_at("admin@x.com", Map::new(), Utc::now() - Duration::days(2)).unwrap();
    let resp = app.clone().oneshot(get_with_cookie("/users", &expired)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

    let resp = app.oneshot(get_with_cookie("/users", "garbage")).await.unwrap();
    assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn valid_token_without_user_record_is_forbidden() {
    let app = router(test_state());
    let token = login(&app, "ghost@x.com").await;
    let resp = app.oneshot(get_with_cookie("/users", &token)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);
    assert_eq!(body_json(resp).await["message"], "unauthorized access!!");
}

#[tokio::test]
async fn host_is_forbidden_and_admin_lists_users() {
    let state = test_state();
    seed_user(&state, json!({ "email": "admin@x.com", "role": "admin" }));
    seed_user(&state, json!({ "email": "host@x.com", "role": "host" }));
    let app = router(state);

    let host = login(&app, "host@x.com").await;
    let resp = app.clone().oneshot(get_with_cookie("/users", &host)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::FORBIDDEN);

    let admin = login(&app, "admin@x.com").await;
    let resp = app.oneshot(get_with_cookie("/users", &admin)).await.unwrap();
    assert_eq!(resp.status(), StatusCode::OK);
    let users = body_json(resp).await;
    assert_eq!(users.as_array().map(Vec::len), Some(2));
}
