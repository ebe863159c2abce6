//! Business rules. Each operation takes its dependencies explicitly and
//! reports failures through [`crate::error::Error`].

pub mod auth;
pub mod cart;
pub mod item;
pub mod user;

pub use item::{ImageContent, ImageUpload};
