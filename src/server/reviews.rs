use axum::extract::State;
use axum::Json;

use crate::error::AppResult;
use crate::storage::{Document, InsertOneResult};

use super::extract::JsonBody;
use super::{blocking, AppState};

pub async fn list_reviews(State(state): State<AppState>) -> Json<Vec<Document>> {
    Json(state.reviews.find_all())
}

pub async fn add_review(
    State(state): State<AppState>,
    JsonBody(review): JsonBody<Document>,
) -> AppResult<Json<InsertOneResult>> {
    let reviews = state.reviews;
    Ok(Json(blocking(move || Ok(reviews.insert_one(review)?)).await?))
}
