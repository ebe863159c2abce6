mod schema;
mod sqlite;

pub use sqlite::SqliteStore;

use chrono::{DateTime, Utc};

use crate::error::Result;
use crate::types::*;

/// Store defines the database interface.
///
/// Every write refreshes the touched rows' `updated_at`. Uniqueness
/// violations surface as `Error::Conflict`, and writes that reference a
/// missing parent row surface as `Error::NotFound`.
pub trait Store: Send + Sync {
    fn initialize(&self) -> Result<()>;

    // User operations
    fn create_user(&self, username: &str, password_hash: &str) -> Result<User>;
    fn get_user(&self, id: i64) -> Result<Option<User>>;
    fn get_user_by_username(&self, username: &str) -> Result<Option<User>>;
    fn list_users(&self) -> Result<Vec<User>>;
    fn update_user(&self, user: &User) -> Result<User>;
    /// Deletes the user together with their cart, cart items and sessions.
    fn delete_user(&self, id: i64) -> Result<bool>;

    // Item operations
    fn create_item(&self, data: &ItemData, image_url: Option<&str>) -> Result<Item>;
    fn get_item(&self, id: i64) -> Result<Option<Item>>;
    fn list_items(&self) -> Result<Vec<Item>>;
    fn update_item(&self, item: &Item) -> Result<Item>;
    fn delete_item(&self, id: i64) -> Result<bool>;

    // Cart operations (cart id == owning user id)
    fn create_cart(&self, user_id: i64) -> Result<Cart>;
    fn get_cart(&self, id: i64) -> Result<Option<Cart>>;
    fn list_carts(&self) -> Result<Vec<Cart>>;
    /// Deletes every line item of the cart, then the cart, in one transaction.
    fn delete_cart(&self, id: i64) -> Result<bool>;

    // Cart line operations
    /// Inserts the line or adds `quantity` to the existing one, atomically.
    /// A total that would overflow is rejected with `Error::BadRequest`.
    fn add_cart_item(&self, cart_id: i64, item_id: i64, quantity: i64) -> Result<CartItem>;
    fn remove_cart_item(&self, cart_id: i64, item_id: i64) -> Result<bool>;

    // Session operations
    fn create_session(&self, session: &Session) -> Result<()>;
    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>>;
    fn delete_session(&self, id: &str) -> Result<bool>;
    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize>;
}
