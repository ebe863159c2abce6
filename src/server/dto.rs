use serde::{Deserialize, Serialize};

#[derive(Debug, Deserialize)]
pub struct UpdateUserRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Deserialize)]
pub struct AddCartItemRequest {
    pub item_id: i64,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RemoveCartItemRequest {
    pub item_id: i64,
}

/// Body of the JSON register and login endpoints. Both fields are optional
/// so that a missing one yields the "missing" message instead of a parse error.
#[derive(Debug, Default, Deserialize)]
pub struct CredentialsRequest {
    #[serde(default)]
    pub username: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MessageResponse {
    pub message: String,
}

impl MessageResponse {
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}
