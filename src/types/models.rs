use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::Price;

/// A registered account. Serializes to `{id, username}`.
#[derive(Debug, Clone, Serialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    #[serde(skip)]
    pub password_hash: String,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

/// A catalog entry.
#[derive(Debug, Clone, Serialize)]
pub struct Item {
    pub id: i64,
    pub name: String,
    pub description: Option<String>,
    pub price: Price,
    /// Path of the stored image relative to the data directory.
    pub image_url: Option<String>,
    pub category: Option<String>,
    pub size: Option<String>,
    pub color: Option<String>,
    pub stock: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

/// The client-supplied fields of an item, used for both creation and updates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ItemData {
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub price: Price,
    #[serde(default)]
    pub category: Option<String>,
    #[serde(default)]
    pub size: Option<String>,
    #[serde(default)]
    pub color: Option<String>,
    #[serde(default)]
    pub stock: i64,
}

/// A user's cart. Its id is the owning user's id.
#[derive(Debug, Clone, Serialize)]
pub struct Cart {
    pub id: i64,
    pub items: Vec<CartItem>,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize)]
pub struct CartItem {
    pub id: i64,
    pub item_id: i64,
    pub cart_id: i64,
    pub quantity: i64,
    #[serde(skip)]
    pub created_at: DateTime<Utc>,
    #[serde(skip)]
    pub updated_at: DateTime<Utc>,
}

/// A login session. Only the keyed hash of the token is persisted.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub token_hash: String,
    pub token_lookup: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_user_serialization_hides_password() {
        let now = Utc::now();
        let user = User {
            id: 3,
            username: "alice".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&user).unwrap();
        assert_eq!(value, json!({"id": 3, "username": "alice"}));
    }

    #[test]
    fn test_item_serialization_keeps_null_fields() {
        let now = Utc::now();
        let item = Item {
            id: 1,
            name: "Shirt".to_string(),
            description: None,
            price: Price::from_cents(1000),
            image_url: None,
            category: None,
            size: Some("M".to_string()),
            color: None,
            stock: 5,
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&item).unwrap();
        assert_eq!(
            value,
            json!({
                "id": 1,
                "name": "Shirt",
                "description": null,
                "price": 10.0,
                "image_url": null,
                "category": null,
                "size": "M",
                "color": null,
                "stock": 5
            })
        );
    }

    #[test]
    fn test_item_data_defaults() {
        let data: ItemData =
            serde_json::from_value(json!({"name": "Mug", "price": "4.50"})).unwrap();
        assert_eq!(data.name, "Mug");
        assert_eq!(data.price, Price::from_cents(450));
        assert_eq!(data.stock, 0);
        assert!(data.description.is_none());
    }

    #[test]
    fn test_item_data_requires_name_and_price() {
        assert!(serde_json::from_value::<ItemData>(json!({"price": 1})).is_err());
        assert!(serde_json::from_value::<ItemData>(json!({"name": "Mug"})).is_err());
    }

    #[test]
    fn test_cart_serialization() {
        let now = Utc::now();
        let cart = Cart {
            id: 7,
            items: vec![CartItem {
                id: 1,
                item_id: 2,
                cart_id: 7,
                quantity: 3,
                created_at: now,
                updated_at: now,
            }],
            created_at: now,
            updated_at: now,
        };

        let value = serde_json::to_value(&cart).unwrap();
        assert_eq!(
            value,
            json!({"id": 7, "items": [{"id": 1, "item_id": 2, "cart_id": 7, "quantity": 3}]})
        );
    }
}
