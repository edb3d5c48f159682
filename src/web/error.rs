//! Mapping of fleet errors onto HTTP responses.

use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use tracing::error;

use crate::error::Error;

/// Path of the login endpoint unauthenticated callers are sent to.
pub const LOGIN_PATH: &str = "/login";

/// Error type returned by every handler.
#[derive(Debug)]
pub enum AppError {
    /// An error from the core library.
    Core(Error),
    /// No valid session; redirect to login and come back to `next`.
    LoginRequired { next: String },
    /// Login attempt with a bad username/password.
    InvalidCredentials,
    /// Authenticated, but not allowed to do this.
    Forbidden(String),
    /// Requested page number is outside the list.
    PageNotFound(usize),
    /// Request body or path could not be parsed.
    BadRequest(String),
    /// Body parsed as JSON but a value had the wrong type.
    InvalidBody(String),
}

/// Error response body.
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error flag.
    pub error: bool,
    /// Machine readable code.
    pub code: &'static str,
    /// Human readable message.
    pub message: String,
    /// Offending field, for validation failures.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl ErrorResponse {
    fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            error: true,
            code,
            message: message.into(),
            field: None,
        }
    }
}

/// `303 See Other` to the login page, remembering where the caller was going.
pub fn login_redirect(next: &str) -> Response {
    let location = format!("{LOGIN_PATH}?next={}", urlencoding::encode(next));
    (StatusCode::SEE_OTHER, [(header::LOCATION, location)]).into_response()
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = match self {
            AppError::LoginRequired { next } => return login_redirect(&next),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                ErrorResponse::new("INVALID_CREDENTIALS", "invalid username or password"),
            ),
            AppError::Forbidden(message) => {
                (StatusCode::FORBIDDEN, ErrorResponse::new("FORBIDDEN", message))
            }
            AppError::BadRequest(message) => (
                StatusCode::BAD_REQUEST,
                ErrorResponse::new("BAD_REQUEST", message),
            ),
            AppError::InvalidBody(message) => (
                StatusCode::UNPROCESSABLE_ENTITY,
                ErrorResponse::new("VALIDATION", message),
            ),
            AppError::PageNotFound(page) => (
                StatusCode::NOT_FOUND,
                ErrorResponse::new("NOT_FOUND", format!("page {page} does not exist")),
            ),
            AppError::Core(err) => match err {
                Error::Validation { field, message } => (
                    StatusCode::UNPROCESSABLE_ENTITY,
                    ErrorResponse {
                        field: Some(field),
                        ..ErrorResponse::new("VALIDATION", message)
                    },
                ),
                Error::NotFound { .. } => (
                    StatusCode::NOT_FOUND,
                    ErrorResponse::new("NOT_FOUND", err.to_string()),
                ),
                Error::Conflict { message } => {
                    (StatusCode::CONFLICT, ErrorResponse::new("CONFLICT", message))
                }
                Error::Unauthorized => return login_redirect("/"),
                other => {
                    error!(error = %other, "request failed");
                    (
                        StatusCode::INTERNAL_SERVER_ERROR,
                        ErrorResponse::new("INTERNAL_ERROR", "internal server error"),
                    )
                }
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<Error> for AppError {
    fn from(err: Error) -> Self {
        AppError::Core(err)
    }
}
