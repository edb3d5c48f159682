//! Request extractors whose rejections render as [`AppError`] JSON.

use axum::extract::{rejection::JsonRejection, rejection::PathRejection, FromRequest, FromRequestParts};

use super::error::AppError;

/// `axum::Json` with body errors reported in the crate's error shape.
#[derive(Debug, FromRequest)]
#[from_request(via(axum::Json), rejection(AppError))]
pub struct ApiJson<T>(pub T);

/// `axum::extract::Path` with malformed segments reported as a bad request.
#[derive(Debug, FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(AppError))]
pub struct ApiPath<T>(pub T);

impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        match rejection {
            // Well-formed JSON whose values have the wrong type
            JsonRejection::JsonDataError(err) => AppError::InvalidBody(err.body_text()),
            other => AppError::BadRequest(other.body_text()),
        }
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        AppError::BadRequest(rejection.body_text())
    }
}
