//! JSON-bodied register and login, answering with message objects.

use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
    routing::post,
};

use crate::auth::SESSION_TOKEN_HEADER;
use crate::error::Error;
use crate::server::AppState;
use crate::server::dto::{CredentialsRequest, MessageResponse};
use crate::server::response::ApiError;
use crate::server::validation::validate_username;
use crate::service::{auth, user};

pub fn auth_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/auth/register", post(register))
        .route("/api/auth/login", post(login))
}

fn credentials(
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> Result<(String, String), ApiError> {
    let req = payload.map(|Json(req)| req).unwrap_or_default();

    match (req.username, req.password) {
        (Some(username), Some(password)) if !username.is_empty() && !password.is_empty() => {
            Ok((username, password))
        }
        _ => Err(ApiError::bad_request("Username or Password missing")),
    }
}

async fn register(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (username, password) = credentials(payload)?;
    validate_username(&username).map_err(ApiError::bad_request)?;

    user::register(state.store.as_ref(), &username, &password)
        .map_err(|e| ApiError::from(e).conflict_as_bad_request())?;

    Ok::<_, ApiError>((
        StatusCode::CREATED,
        Json(MessageResponse::new("User created successfully!")),
    ))
}

async fn login(
    State(state): State<Arc<AppState>>,
    payload: Result<Json<CredentialsRequest>, JsonRejection>,
) -> impl IntoResponse {
    let (username, password) = credentials(payload)?;

    let (_, token) = auth::login(state.store.as_ref(), &state.sessions, &username, &password)
        .map_err(|e| match e {
            Error::Unauthorized => ApiError::unauthorized("Invalid username or password"),
            e => ApiError::from(e),
        })?;

    Ok::<_, ApiError>((
        [(SESSION_TOKEN_HEADER, token)],
        Json(MessageResponse::new("Logged in successfully!")),
    ))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_credentials_requires_both_fields() {
        let full = Ok(Json(CredentialsRequest {
            username: Some("alice".to_string()),
            password: Some("pw".to_string()),
        }));
        assert_eq!(
            credentials(full).unwrap(),
            ("alice".to_string(), "pw".to_string())
        );

        let blank = Ok(Json(CredentialsRequest {
            username: Some("alice".to_string()),
            password: Some(String::new()),
        }));
        assert_eq!(credentials(blank).unwrap_err().status, StatusCode::BAD_REQUEST);

        let missing = Ok(Json(CredentialsRequest::default()));
        assert_eq!(
            credentials(missing).unwrap_err().message,
            "Username or Password missing"
        );
    }
}
