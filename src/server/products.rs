//! Product endpoints. Each handler is one store operation whose result is
//! returned as-is.

use axum::extract::{Path, Query, State};
use axum::Json;
use serde::Deserialize;

use crate::error::AppResult;
use crate::storage::{DeleteResult, Document, Filter, InsertOneResult, SortOrder};

use super::extract::JsonBody;
use super::{blocking, AppState};

pub const CREATED_AT: &str = "createdAt";
pub const UPVOTE_COUNT: &str = "upvote_count";
pub const TAGS: &str = "tags";
/// Owner email on a product document.
pub const OWNER_EMAIL: &str = "email";

/// Newest first.
pub async fn featured(State(state): State<AppState>) -> Json<Vec<Document>> {
    Json(state.products.find_sorted(&Filter::All, CREATED_AT, SortOrder::Descending))
}

/// Most upvoted first.
pub async fn trending(State(state): State<AppState>) -> Json<Vec<Document>> {
    Json(state.products.find_sorted(&Filter::All, UPVOTE_COUNT, SortOrder::Descending))
}

pub async fn details(State(state): State<AppState>, Path(id): Path<String>) -> Json<Option<Document>> {
    Json(state.products.find_one(&Filter::id(&id)))
}

#[derive(Debug, Deserialize)]
pub struct SearchParams {
    #[serde(default)]
    pub search: Option<String>,
}

/// Case-insensitive pattern over `tags`. No `search` parameter matches every product with tags.
pub async fn search(State(state): State<AppState>, Query(params): Query<SearchParams>) -> AppResult<Json<Vec<Document>>> {
    let filter = Filter::regex_ci(TAGS, params.search.as_deref().unwrap_or(""))?;
    Ok(Json(state.products.find(&filter)))
}

pub async fn add_product(
    State(state): State<AppState>,
    JsonBody(product): JsonBody<Document>,
) -> AppResult<Json<InsertOneResult>> {
    let products = state.products;
    Ok(Json(blocking(move || Ok(products.insert_one(product)?)).await?))
}

pub async fn my_products(State(state): State<AppState>, Path(email): Path<String>) -> Json<Vec<Document>> {
    Json(state.products.find(&Filter::eq(OWNER_EMAIL, email)))
}

pub async fn delete_product(State(state): State<AppState>, Path(id): Path<String>) -> AppResult<Json<DeleteResult>> {
    let products = state.products;
    Ok(Json(blocking(move || Ok(products.delete_one(&Filter::id(&id))?)).await?))
}
