use std::sync::Arc;

use axum::{
    Json,
    extract::{Path, State, rejection::JsonRejection},
    http::StatusCode,
    response::IntoResponse,
};

use crate::server::AppState;
use crate::server::dto::{AddCartItemRequest, MessageResponse, RemoveCartItemRequest};
use crate::server::response::{ApiError, StoreOptionExt};
use crate::service::cart;

pub async fn list_carts(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    let carts = cart::list(state.store.as_ref())?;

    Ok::<_, ApiError>(Json(carts))
}

pub async fn get_cart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let cart = cart::get(state.store.as_ref(), id)?
        .or_not_found(format!("Cart with id {id} not found"))?;

    Ok::<_, ApiError>(Json(cart))
}

/// Creates the cart of user `id`. An existing cart is reported as 400.
pub async fn create_cart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    let cart = cart::create(state.store.as_ref(), id)
        .map_err(|e| ApiError::from(e).conflict_as_bad_request())?;

    Ok::<_, ApiError>((StatusCode::CREATED, Json(cart)))
}

pub async fn delete_cart(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
) -> impl IntoResponse {
    cart::delete(state.store.as_ref(), id)?;

    Ok::<_, ApiError>(Json(MessageResponse::new("cart deleted")))
}

pub async fn add_cart_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<AddCartItemRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(format!("Invalid cart item: {e}")))?;

    let cart = cart::add_item(state.store.as_ref(), id, req.item_id, req.quantity)?;

    Ok::<_, ApiError>(Json(cart))
}

pub async fn remove_cart_item(
    State(state): State<Arc<AppState>>,
    Path(id): Path<i64>,
    payload: Result<Json<RemoveCartItemRequest>, JsonRejection>,
) -> impl IntoResponse {
    let Json(req) = payload.map_err(|e| ApiError::bad_request(format!("Invalid cart item: {e}")))?;

    let cart = cart::remove_item(state.store.as_ref(), id, req.item_id)?;

    Ok::<_, ApiError>(Json(cart))
}
