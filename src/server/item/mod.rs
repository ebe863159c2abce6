mod handlers;

use std::sync::Arc;

use axum::{Router, extract::DefaultBodyLimit, routing::get};

use crate::server::AppState;

pub fn item_router() -> Router<Arc<AppState>> {
    Router::new()
        .route(
            "/api/item/",
            get(handlers::list_items).post(handlers::create_item),
        )
        .route(
            "/api/item/{id}/",
            get(handlers::get_item)
                .put(handlers::update_item)
                .delete(handlers::delete_item),
        )
        .route(
            "/api/item/image/{id}/",
            get(handlers::get_item_image).put(handlers::update_item_image),
        )
        // Leave headroom for the multipart framing around an image.
        .layer(DefaultBodyLimit::max(handlers::MAX_IMAGE_SIZE + 64 * 1024))
}
