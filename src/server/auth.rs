use axum::extract::State;
use axum::Json;
use axum_extra::extract::CookieJar;
use serde_json::{json, Value};
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::storage::Document;

use super::extract::JsonBody;
use super::AppState;

pub async fn root() -> &'static str {
    "TechHub SERVER IS RUNNING"
}

/// `POST /jwt`: sign the submitted claims and set them as the session cookie.
pub async fn issue_token(
    State(state): State<AppState>,
    jar: CookieJar,
    JsonBody(body): JsonBody<Document>,
) -> AppResult<(CookieJar, Json<Value>)> {
    let Some(email) = body.get("email").and_then(Value::as_str).map(str::to_string) else {
        return Err(AppError::bad_request("missing_email", "token request needs an email"));
    };
    let token = state.signer.issue(&email, body)?;
    debug!(target: "session", email = %email, "session token issued");
    let jar = jar.add(state.cookies.session_cookie(token));
    Ok((jar, Json(json!({ "success": true }))))
}

/// `GET /logout`: expire the session cookie. No server-side state to clear.
pub async fn logout(State(state): State<AppState>, jar: CookieJar) -> (CookieJar, Json<Value>) {
    let jar = jar.add(state.cookies.removal_cookie());
    info!(target: "session", "Logout successful");
    (jar, Json(json!({ "success": true })))
}
