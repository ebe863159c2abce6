use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::Request;
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::{Router, routing::get};

use super::auth::auth_router;
use super::cart::cart_router;
use super::item::item_router;
use super::user::user_router;
use crate::auth::SessionManager;
use crate::images::ImageStorage;
use crate::store::Store;

pub struct AppState {
    pub store: Arc<dyn Store>,
    pub images: ImageStorage,
    pub sessions: SessionManager,
}

impl AppState {
    pub fn new(store: Arc<dyn Store>, data_dir: &Path, sessions: SessionManager) -> Self {
        Self {
            store,
            images: ImageStorage::new(data_dir),
            sessions,
        }
    }
}

async fn health() -> &'static str {
    "OK"
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let uri = request.uri().clone();
    let start = Instant::now();

    let response = next.run(request).await;

    let latency = start.elapsed();
    let status = response.status();

    tracing::info!(
        "{} {} {} {}ms",
        method,
        uri.path(),
        status.as_u16(),
        latency.as_millis()
    );

    response
}

pub fn create_router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .merge(user_router())
        .merge(auth_router())
        .merge(item_router())
        .merge(cart_router())
        .layer(middleware::from_fn(log_request))
        .with_state(state)
}
