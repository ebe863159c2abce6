//! # Shopfront
//!
//! A small shop backend (user accounts, an item catalog and per-user carts)
//! served as a JSON API. Usable both as a standalone binary and as a library.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! shopfront = { version = "0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::path::Path;
//! use std::sync::Arc;
//! use shopfront::auth::SessionManager;
//! use shopfront::server::{AppState, create_router};
//! use shopfront::store::{SqliteStore, Store};
//!
//! let store = SqliteStore::new("./data/shopfront.db").unwrap();
//! store.initialize().unwrap();
//!
//! let sessions = SessionManager::new("change-me", 86_400).unwrap();
//! let state = Arc::new(AppState::new(Arc::new(store), Path::new("./data"), sessions));
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `shopfront` binary. Disable with `default-features = false`.

pub mod auth;
pub mod config;
pub mod error;
pub mod images;
pub mod server;
pub mod service;
pub mod store;
pub mod types;
