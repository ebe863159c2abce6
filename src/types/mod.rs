mod models;
mod price;

pub use models::*;
pub use price::Price;
