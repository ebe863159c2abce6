use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
};

use crate::auth::basic_credentials_from_headers;
use crate::server::AppState;
use crate::server::dto::{MessageResponse, UpdateUserRequest};
use crate::server::response::{ApiError, StoreOptionExt};
use crate::server::validation::validate_username;
use crate::service::user;

pub(super) const CREDENTIALS_MISSING: &str = "Username or Password missing";

/// Registers a user from the Basic auth header.
pub async fn register(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let (username, password) = basic_credentials_from_headers(&headers)
        .map_err(|_| ApiError::bad_request(CREDENTIALS_MISSING))?;

    validate_username(&username).map_err(ApiError::bad_request)?;

    let user = user::register(state.store.as_ref(), &username, &password)?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(user)))
}

pub async fn list_users(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let users = user::list(state.store.as_ref())?;

    Ok::<_, ApiError>(Json(users))
}

pub async fn get_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let user = user::get(state.store.as_ref(), id)?.or_not_found("User not found")?;

    Ok::<_, ApiError>(Json(user))
}

pub async fn update_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<UpdateUserRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = payload.map_err(|_| ApiError::bad_request("Invalid user data"))?;

    if req.password.is_empty() {
        return Err(ApiError::bad_request("Invalid user data"));
    }
    validate_username(&req.username).map_err(ApiError::bad_request)?;

    let user = user::update(state.store.as_ref(), id, &req.username, &req.password)?;

    Ok(Json(user))
}

pub async fn delete_user(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    user::delete(state.store.as_ref(), id)?;

    Ok::<_, ApiError>(Json(MessageResponse::new("User deleted")))
}
