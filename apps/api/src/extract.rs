use axum::extract::FromRequest;

use crate::errors::AppError;

/// `axum::Json` whose rejections render as `AppError` (400 with a JSON body)
/// instead of axum's plain-text 415/422 responses.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct AppJson<T>(pub T);
