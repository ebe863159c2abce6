mod auth;
mod cart;
pub mod dto;
mod item;
pub mod response;
mod router;
mod user;
pub mod validation;

pub use router::{AppState, create_router};
