use std::sync::Arc;

use axum::{Json, extract::State, http::HeaderMap, response::IntoResponse};

use super::accounts::CREDENTIALS_MISSING;
use crate::auth::{RequireSession, SESSION_TOKEN_HEADER, basic_credentials_from_headers};
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::MessageResponse;
use crate::server::response::ApiError;
use crate::service::auth;

/// Logs in with the Basic auth header. The session token is returned in the
/// `X-Session-Token` response header.
pub async fn login(State(state): State<Arc<AppState>>, headers: HeaderMap) -> impl IntoResponse {
    let (username, password) = basic_credentials_from_headers(&headers)
        .map_err(|_| ApiError::bad_request(CREDENTIALS_MISSING))?;

    let (user, token) = auth::login(state.store.as_ref(), &state.sessions, &username, &password)
        .map_err(|e| match e {
            Error::Unauthorized => ApiError::unauthorized("Username or Password incorrect"),
            e => ApiError::from(e),
        })?;

    Ok::<_, ApiError>(([(SESSION_TOKEN_HEADER, token)], Json(user)))
}

pub async fn logout(
    session: RequireSession,
    State(state): State<Arc<AppState>>,
) -> impl IntoResponse {
    auth::logout(state.store.as_ref(), &state.sessions, &session.session)?;

    Ok::<_, ApiError>(Json(MessageResponse::new("Logged out")))
}

pub async fn me(session: RequireSession) -> impl IntoResponse {
    Json(session.user)
}
