//! Account management: registration, credential checks, and user CRUD.

use crate::auth::{hash_password, verify_password};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::User;

const USERNAME_TAKEN: &str = "Username already exists";

fn not_found() -> Error {
    Error::NotFound("User not found".to_string())
}

pub fn register(store: &dyn Store, username: &str, password: &str) -> Result<User> {
    if store.get_user_by_username(username)?.is_some() {
        return Err(Error::Conflict(USERNAME_TAKEN.to_string()));
    }

    let password_hash = hash_password(password)?;
    let user = store.create_user(username, &password_hash)?;

    tracing::info!(user_id = user.id, username = %user.username, "user registered");
    Ok(user)
}

/// Returns the user when the password matches. An unknown username and a
/// wrong password both yield `Unauthorized`.
pub fn login(store: &dyn Store, username: &str, password: &str) -> Result<User> {
    let user = store
        .get_user_by_username(username)?
        .ok_or(Error::Unauthorized)?;

    if !verify_password(password, &user.password_hash)? {
        return Err(Error::Unauthorized);
    }

    Ok(user)
}

pub fn get(store: &dyn Store, id: i64) -> Result<Option<User>> {
    store.get_user(id)
}

pub fn list(store: &dyn Store) -> Result<Vec<User>> {
    store.list_users()
}

pub fn update(store: &dyn Store, id: i64, username: &str, password: &str) -> Result<User> {
    let mut user = store.get_user(id)?.ok_or_else(not_found)?;

    if user.username != username {
        if let Some(existing) = store.get_user_by_username(username)? {
            if existing.id != id {
                return Err(Error::Conflict(USERNAME_TAKEN.to_string()));
            }
        }
    }

    user.username = username.to_string();
    user.password_hash = hash_password(password)?;

    store.update_user(&user)
}

/// Deletes the user along with their cart and sessions.
pub fn delete(store: &dyn Store, id: i64) -> Result<()> {
    if !store.delete_user(id)? {
        return Err(not_found());
    }
    tracing::info!(user_id = id, "user deleted");
    Ok(())
}
