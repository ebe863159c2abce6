use crate::server::response::ApiError;
use crate::types::ItemData;

const MAX_USERNAME_LEN: usize = 20;
const MAX_ITEM_NAME_LEN: usize = 255;

pub fn validate_username(username: &str) -> Result<(), String> {
    if username.is_empty() {
        return Err("Username cannot be empty".to_string());
    }
    if username.chars().count() > MAX_USERNAME_LEN {
        return Err(format!(
            "Username cannot exceed {MAX_USERNAME_LEN} characters"
        ));
    }
    // ':' would be ambiguous inside a Basic auth header.
    if username.chars().any(|c| c.is_whitespace() || c.is_control() || c == ':') {
        return Err("Username cannot contain whitespace or ':'".to_string());
    }
    Ok(())
}

pub fn validate_item_name(name: &str) -> Result<(), String> {
    if name.trim().is_empty() {
        return Err("Item name cannot be empty".to_string());
    }
    if name.chars().count() > MAX_ITEM_NAME_LEN {
        return Err(format!(
            "Item name cannot exceed {MAX_ITEM_NAME_LEN} characters"
        ));
    }
    if name.chars().any(char::is_control) {
        return Err("Item name cannot contain control characters".to_string());
    }
    Ok(())
}

pub fn validate_item_data(data: &ItemData) -> Result<(), ApiError> {
    validate_item_name(&data.name).map_err(ApiError::bad_request)?;
    if data.stock < 0 {
        return Err(ApiError::bad_request("Stock cannot be negative"));
    }
    Ok(())
}
