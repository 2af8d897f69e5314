use axum::extract::FromRequest;

use crate::error::AppError;

/// `Json` request body whose rejections render as an `AppError` body.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct JsonBody<T>(pub T);
