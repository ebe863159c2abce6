mod handlers;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, put},
};

use crate::server::AppState;

pub fn cart_router() -> Router<Arc<AppState>> {
    Router::new()
        .route("/api/cart/", get(handlers::list_carts))
        .route(
            "/api/cart/{id}/",
            get(handlers::get_cart)
                .post(handlers::create_cart)
                .delete(handlers::delete_cart),
        )
        .route(
            "/api/cart/item/{id}/",
            put(handlers::add_cart_item).delete(handlers::remove_cart_item),
        )
}
