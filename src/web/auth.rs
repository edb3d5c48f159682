//! Session-cookie authentication.
//!
//! Any handler that takes a [`CurrentUser`] is login-protected: a missing or
//! unknown session cookie turns into a redirect to `/login?next=<path>`.

use axum::{
    async_trait,
    extract::{FromRequestParts, Query, State},
    http::{header, request::Parts, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Form, Json, Router,
};
use serde::{Deserialize, Serialize};
use tracing::info;

use super::error::{AppError, LOGIN_PATH};
use super::AppState;
use crate::error::Error;
use crate::identity;
use crate::session::{self, SESSION_COOKIE};

pub fn routes() -> Router<AppState> {
    Router::new()
        .route(LOGIN_PATH, get(login_form).post(login))
        .route("/logout", post(logout))
}

/// The authenticated caller.
#[derive(Debug, Clone)]
pub struct CurrentUser {
    pub identity_id: i64,
    pub session_token: String,
}

/// Read the session token from the `Cookie` header(s).
pub fn session_token(headers: &HeaderMap) -> Option<String> {
    headers
        .get_all(header::COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(name, _)| *name == SESSION_COOKIE)
        .map(|(_, value)| value.to_string())
        .filter(|value| !value.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let next = parts
            .uri
            .path_and_query()
            .map(|pq| pq.as_str().to_string())
            .unwrap_or_else(|| "/".to_string());

        let Some(token) = session_token(&parts.headers) else {
            return Err(AppError::LoginRequired { next });
        };

        match state.db.read(|conn| session::resolve_session(conn, &token))? {
            Some(session) => Ok(CurrentUser {
                identity_id: session.identity_id,
                session_token: session.token,
            }),
            None => Err(AppError::LoginRequired { next }),
        }
    }
}

/// Only same-site absolute paths are accepted as redirect targets.
fn safe_next(next: Option<&str>) -> String {
    match next {
        Some(path) if path.starts_with('/') && !path.starts_with("//") => path.to_string(),
        _ => "/".to_string(),
    }
}

fn session_cookie(token: &str) -> String {
    format!("{SESSION_COOKIE}={token}; Path=/; HttpOnly; SameSite=Lax")
}

fn expired_session_cookie() -> String {
    format!("{SESSION_COOKIE}=; Path=/; HttpOnly; SameSite=Lax; Max-Age=0")
}

#[derive(Debug, Deserialize)]
pub struct NextQuery {
    pub next: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct LoginForm {
    pub username: String,
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

#[derive(Debug, Serialize)]
struct LoginFormDescription {
    action: &'static str,
    fields: [&'static str; 2],
    next: String,
}

/// GET /login - describe the login form.
async fn login_form(Query(query): Query<NextQuery>) -> Json<LoginFormDescription> {
    Json(LoginFormDescription {
        action: LOGIN_PATH,
        fields: ["username", "password"],
        next: safe_next(query.next.as_deref()),
    })
}

/// POST /login - check credentials, open a session, redirect to `next`.
async fn login(
    State(state): State<AppState>,
    Query(query): Query<NextQuery>,
    Form(form): Form<LoginForm>,
) -> Result<Response, AppError> {
    let session = state
        .db
        .write(|tx| {
            let identity = identity::authenticate(tx, &form.username, &form.password)?;
            session::create_session(tx, identity.id)
        })
        .map_err(|err| match err {
            Error::Unauthorized => AppError::InvalidCredentials,
            other => AppError::Core(other),
        })?;

    info!(identity_id = session.identity_id, "user logged in");

    let next = safe_next(form.next.as_deref().or(query.next.as_deref()));
    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, next),
            (header::SET_COOKIE, session_cookie(&session.token)),
        ],
    )
        .into_response())
}

/// POST /logout - end the session and clear the cookie.
async fn logout(State(state): State<AppState>, user: CurrentUser) -> Result<Response, AppError> {
    state
        .db
        .write(|tx| session::end_session(tx, &user.session_token))?;
    info!(identity_id = user.identity_id, "user logged out");

    Ok((
        StatusCode::SEE_OTHER,
        [
            (header::LOCATION, LOGIN_PATH.to_string()),
            (header::SET_COOKIE, expired_session_cookie()),
        ],
    )
        .into_response())
}
