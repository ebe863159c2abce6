use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::Cart;

fn cart_not_found(id: i64) -> Error {
    Error::NotFound(format!("Cart with id {id} not found"))
}

fn item_not_found(id: i64) -> Error {
    Error::NotFound(format!("Item with id {id} not found"))
}

pub fn get(store: &dyn Store, id: i64) -> Result<Option<Cart>> {
    store.get_cart(id)
}

pub fn list(store: &dyn Store) -> Result<Vec<Cart>> {
    store.list_carts()
}

/// Creates the cart of user `user_id`. The cart shares the user's id.
pub fn create(store: &dyn Store, user_id: i64) -> Result<Cart> {
    if store.get_cart(user_id)?.is_some() {
        return Err(Error::Conflict(format!(
            "Cart with id {user_id} already exists"
        )));
    }
    if store.get_user(user_id)?.is_none() {
        return Err(Error::NotFound(format!("User with id {user_id} not found")));
    }

    store.create_cart(user_id)
}

pub fn delete(store: &dyn Store, id: i64) -> Result<()> {
    if !store.delete_cart(id)? {
        return Err(cart_not_found(id));
    }
    Ok(())
}

/// Adds `quantity` units of an item to the cart, merging with an existing
/// line for the same item. Returns the updated cart.
pub fn add_item(store: &dyn Store, cart_id: i64, item_id: i64, quantity: i64) -> Result<Cart> {
    if quantity < 1 {
        return Err(Error::BadRequest(
            "Quantity must be greater than 0".to_string(),
        ));
    }
    if store.get_item(item_id)?.is_none() {
        return Err(item_not_found(item_id));
    }
    if store.get_cart(cart_id)?.is_none() {
        return Err(cart_not_found(cart_id));
    }

    store.add_cart_item(cart_id, item_id, quantity)?;

    store.get_cart(cart_id)?.ok_or_else(|| cart_not_found(cart_id))
}

/// Removes the item's line from the cart. Removing an item that is not in
/// the cart leaves it unchanged.
pub fn remove_item(store: &dyn Store, cart_id: i64, item_id: i64) -> Result<Cart> {
    if store.get_item(item_id)?.is_none() {
        return Err(item_not_found(item_id));
    }
    if store.get_cart(cart_id)?.is_none() {
        return Err(cart_not_found(cart_id));
    }

    store.remove_cart_item(cart_id, item_id)?;

    store.get_cart(cart_id)?.ok_or_else(|| cart_not_found(cart_id))
}
