use std::sync::Arc;

use axum::{
    Json,
    extract::FromRequestParts,
    http::{HeaderValue, StatusCode, header::WWW_AUTHENTICATE, request::Parts},
    response::{IntoResponse, Response},
};
use serde_json::json;

use super::helpers::{CredentialsError, extract_session_token};
use crate::error::Error;
use crate::server::AppState;
use crate::types::{Session, User};

/// Extractor that requires a live session
pub struct RequireSession {
    pub session: Session,
    pub user: User,
}

#[derive(Debug)]
pub enum AuthError {
    MissingAuth,
    InvalidScheme,
    InvalidToken,
    SessionExpired,
    InternalError,
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            AuthError::MissingAuth => (StatusCode::UNAUTHORIZED, "Authentication required"),
            AuthError::InvalidScheme => (StatusCode::UNAUTHORIZED, "Invalid authorization scheme"),
            AuthError::InvalidToken => (StatusCode::UNAUTHORIZED, "Invalid session token"),
            AuthError::SessionExpired => (StatusCode::UNAUTHORIZED, "Session expired"),
            AuthError::InternalError => {
                (StatusCode::INTERNAL_SERVER_ERROR, "Internal server error")
            }
        };

        let mut response = (status, Json(json!({ "error": message }))).into_response();

        if status == StatusCode::UNAUTHORIZED {
            response.headers_mut().insert(
                WWW_AUTHENTICATE,
                HeaderValue::from_static("Bearer realm=\"shopfront\""),
            );
        }

        response
    }
}

impl FromRequestParts<Arc<AppState>> for RequireSession {
    type Rejection = AuthError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let raw_token = extract_session_token(&parts.headers)
            .map_err(|e| match e {
                CredentialsError::InvalidScheme => AuthError::InvalidScheme,
                CredentialsError::Missing | CredentialsError::Malformed => AuthError::InvalidToken,
            })?
            .ok_or(AuthError::MissingAuth)?;

        let (session, user) = state
            .sessions
            .validate(state.store.as_ref(), &raw_token)
            .map_err(|e| match e {
                Error::InvalidTokenFormat | Error::Unauthorized => AuthError::InvalidToken,
                Error::SessionExpired => AuthError::SessionExpired,
                e => {
                    tracing::error!("Failed to validate session: {e}");
                    AuthError::InternalError
                }
            })?;

        Ok(RequireSession { session, user })
    }
}
