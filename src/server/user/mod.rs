mod accounts;
mod session;

use std::sync::Arc;

use axum::{
    Router,
    routing::{get, post},
};

use crate::server::AppState;

pub fn user_router() -> Router<Arc<AppState>> {
    Router::new()
        // Accounts
        .route(
            "/api/user/",
            get(accounts::list_users).post(accounts::register),
        )
        .route(
            "/api/user/{id}/",
            get(accounts::get_user)
                .put(accounts::update_user)
                .delete(accounts::delete_user),
        )
        // Sessions
        .route("/api/user/login/", post(session::login))
        .route("/api/user/logout/", post(session::logout))
        .route("/api/user/me/", get(session::me))
}
