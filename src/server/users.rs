use axum::extract::{Path, State};
use axum::Json;

use crate::directory::LoginOutcome;
use crate::error::AppResult;
use crate::storage::{Document, UpdateResult};

use super::extract::JsonBody;
use super::{blocking, AppState};

/// `PUT /user`: login-time upsert.
pub async fn upsert_user(
    State(state): State<AppState>,
    JsonBody(user): JsonBody<Document>,
) -> AppResult<Json<LoginOutcome>> {
    let users = state.users;
    Ok(Json(blocking(move || users.upsert_login(user)).await?))
}

pub async fn get_user(State(state): State<AppState>, Path(email): Path<String>) -> Json<Option<Document>> {
    Json(state.users.find_by_email(&email))
}

/// `GET /users`; mounted behind the admin gate.
pub async fn list_users(State(state): State<AppState>) -> Json<Vec<Document>> {
    Json(state.users.list_all())
}

// TODO: confirm whether this should sit behind the admin gate; as mounted, any caller can change any user's role
pub async fn update_user(
    State(state): State<AppState>,
    Path(email): Path<String>,
    JsonBody(fields): JsonBody<Document>,
) -> AppResult<Json<UpdateResult>> {
    let users = state.users;
    Ok(Json(blocking(move || users.update_user(&email, fields)).await?))
}
