use std::collections::HashMap;
use std::path::Path;
use std::sync::Mutex;

use chrono::{DateTime, SecondsFormat, Utc};
use rusqlite::{Connection, ErrorCode, OptionalExtension, Row, ffi, params};

use super::Store;
use super::schema::SCHEMA;
use crate::error::{Error, Result};
use crate::types::*;

const USER_COLUMNS: &str = "id, username, password_hash, created_at, updated_at";
const ITEM_COLUMNS: &str =
    "id, name, description, price_cents, image_url, category, size, color, stock, created_at, updated_at";
const CART_ITEM_COLUMNS: &str = "id, cart_id, item_id, quantity, created_at, updated_at";
const SESSION_COLUMNS: &str = "id, token_hash, token_lookup, user_id, created_at, expires_at";

pub struct SqliteStore {
    conn: Mutex<Connection>,
}

impl SqliteStore {
    pub fn new<P: AsRef<Path>>(db_path: P) -> Result<Self> {
        let conn = Connection::open(db_path)?;

        conn.pragma_update(None, "foreign_keys", "ON")?;
        conn.pragma_update(None, "journal_mode", "WAL")?;

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn conn(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn.lock().unwrap_or_else(|e| e.into_inner())
    }

    /// Returns a guard to the underlying database connection.
    /// This allows consuming applications to execute custom SQL.
    pub fn connection(&self) -> std::sync::MutexGuard<'_, Connection> {
        self.conn()
    }
}

fn parse_datetime(s: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .or_else(|_| {
            // Handle SQLite's default datetime format: "YYYY-MM-DD HH:MM:SS"
            chrono::NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S").map(|ndt| ndt.and_utc())
        })
        .unwrap_or_else(|e| {
            tracing::error!("Invalid datetime in database: '{}' - {}", s, e);
            Utc::now()
        })
}

// Fixed width so that stored timestamps compare correctly as text.
fn format_datetime(dt: &DateTime<Utc>) -> String {
    dt.to_rfc3339_opts(SecondsFormat::Micros, true)
}

fn user_not_found() -> Error {
    Error::NotFound("User not found".to_string())
}

fn item_not_found() -> Error {
    Error::NotFound("Item not found".to_string())
}

fn map_constraint(e: rusqlite::Error, conflict: &str) -> Error {
    let extended_code = match &e {
        rusqlite::Error::SqliteFailure(err, _) if err.code == ErrorCode::ConstraintViolation => {
            Some(err.extended_code)
        }
        _ => None,
    };

    match extended_code {
        Some(ffi::SQLITE_CONSTRAINT_FOREIGNKEY) => {
            Error::NotFound("Referenced record not found".to_string())
        }
        Some(ffi::SQLITE_CONSTRAINT_UNIQUE | ffi::SQLITE_CONSTRAINT_PRIMARYKEY) => {
            Error::Conflict(conflict.to_string())
        }
        _ => Error::from(e),
    }
}

fn user_from_row(row: &Row<'_>) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        username: row.get(1)?,
        password_hash: row.get(2)?,
        created_at: parse_datetime(&row.get::<_, String>(3)?),
        updated_at: parse_datetime(&row.get::<_, String>(4)?),
    })
}

fn item_from_row(row: &Row<'_>) -> rusqlite::Result<Item> {
    Ok(Item {
        id: row.get(0)?,
        name: row.get(1)?,
        description: row.get(2)?,
        price: Price::from_cents(row.get(3)?),
        image_url: row.get(4)?,
        category: row.get(5)?,
        size: row.get(6)?,
        color: row.get(7)?,
        stock: row.get(8)?,
        created_at: parse_datetime(&row.get::<_, String>(9)?),
        updated_at: parse_datetime(&row.get::<_, String>(10)?),
    })
}

fn cart_item_from_row(row: &Row<'_>) -> rusqlite::Result<CartItem> {
    Ok(CartItem {
        id: row.get(0)?,
        cart_id: row.get(1)?,
        item_id: row.get(2)?,
        quantity: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        updated_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn session_from_row(row: &Row<'_>) -> rusqlite::Result<Session> {
    Ok(Session {
        id: row.get(0)?,
        token_hash: row.get(1)?,
        token_lookup: row.get(2)?,
        user_id: row.get(3)?,
        created_at: parse_datetime(&row.get::<_, String>(4)?),
        expires_at: parse_datetime(&row.get::<_, String>(5)?),
    })
}

fn query_user(conn: &Connection, id: i64) -> Result<Option<User>> {
    conn.query_row(
        &format!("SELECT {USER_COLUMNS} FROM users WHERE id = ?1"),
        params![id],
        user_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn query_item(conn: &Connection, id: i64) -> Result<Option<Item>> {
    conn.query_row(
        &format!("SELECT {ITEM_COLUMNS} FROM items WHERE id = ?1"),
        params![id],
        item_from_row,
    )
    .optional()
    .map_err(Error::from)
}

fn query_cart_items(conn: &Connection, cart_id: i64) -> Result<Vec<CartItem>> {
    let mut stmt = conn.prepare(&format!(
        "SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE cart_id = ?1 ORDER BY id"
    ))?;

    let rows = stmt.query_map(params![cart_id], cart_item_from_row)?;

    rows.collect::<std::result::Result<Vec<_>, _>>()
        .map_err(Error::from)
}

fn query_cart(conn: &Connection, id: i64) -> Result<Option<Cart>> {
    let cart = conn
        .query_row(
            "SELECT id, created_at, updated_at FROM carts WHERE id = ?1",
            params![id],
            |row| {
                Ok(Cart {
                    id: row.get(0)?,
                    items: Vec::new(),
                    created_at: parse_datetime(&row.get::<_, String>(1)?),
                    updated_at: parse_datetime(&row.get::<_, String>(2)?),
                })
            },
        )
        .optional()?;

    match cart {
        Some(mut cart) => {
            cart.items = query_cart_items(conn, cart.id)?;
            Ok(Some(cart))
        }
        None => Ok(None),
    }
}

impl Store for SqliteStore {
    fn initialize(&self) -> Result<()> {
        self.conn().execute_batch(SCHEMA)?;
        Ok(())
    }

    // User operations

    fn create_user(&self, username: &str, password_hash: &str) -> Result<User> {
        let conn = self.conn();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO users (username, password_hash, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?3)",
            params![username, password_hash, format_datetime(&now)],
        )
        .map_err(|e| map_constraint(e, "Username already exists"))?;

        Ok(User {
            id: conn.last_insert_rowid(),
            username: username.to_string(),
            password_hash: password_hash.to_string(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_user(&self, id: i64) -> Result<Option<User>> {
        query_user(&self.conn(), id)
    }

    fn get_user_by_username(&self, username: &str) -> Result<Option<User>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {USER_COLUMNS} FROM users WHERE username = ?1"),
            params![username],
            user_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn list_users(&self) -> Result<Vec<User>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {USER_COLUMNS} FROM users ORDER BY id"))?;

        let rows = stmt.query_map([], user_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_user(&self, user: &User) -> Result<User> {
        let conn = self.conn();
        let rows = conn
            .execute(
                "UPDATE users SET username = ?1, password_hash = ?2, updated_at = ?3 WHERE id = ?4",
                params![
                    user.username,
                    user.password_hash,
                    format_datetime(&Utc::now()),
                    user.id
                ],
            )
            .map_err(|e| map_constraint(e, "Username already exists"))?;

        if rows == 0 {
            return Err(user_not_found());
        }
        query_user(&conn, user.id)?.ok_or_else(user_not_found)
    }

    fn delete_user(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM cart_items WHERE cart_id = ?1", params![id])?;
        tx.execute("DELETE FROM carts WHERE id = ?1", params![id])?;
        tx.execute("DELETE FROM sessions WHERE user_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM users WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Item operations

    fn create_item(&self, data: &ItemData, image_url: Option<&str>) -> Result<Item> {
        let conn = self.conn();
        let now = format_datetime(&Utc::now());
        conn.execute(
            "INSERT INTO items (name, description, price_cents, image_url, category, size, color, stock, created_at, updated_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
            params![
                data.name,
                data.description,
                data.price.cents(),
                image_url,
                data.category,
                data.size,
                data.color,
                data.stock,
                now,
            ],
        )
        .map_err(|e| map_constraint(e, "Item already exists"))?;

        let id = conn.last_insert_rowid();
        query_item(&conn, id)?.ok_or_else(item_not_found)
    }

    fn get_item(&self, id: i64) -> Result<Option<Item>> {
        query_item(&self.conn(), id)
    }

    fn list_items(&self) -> Result<Vec<Item>> {
        let conn = self.conn();
        let mut stmt = conn.prepare(&format!("SELECT {ITEM_COLUMNS} FROM items ORDER BY id"))?;

        let rows = stmt.query_map([], item_from_row)?;

        rows.collect::<std::result::Result<Vec<_>, _>>()
            .map_err(Error::from)
    }

    fn update_item(&self, item: &Item) -> Result<Item> {
        let conn = self.conn();
        let rows = conn
            .execute(
                "UPDATE items SET name = ?1, description = ?2, price_cents = ?3, image_url = ?4,
                    category = ?5, size = ?6, color = ?7, stock = ?8, updated_at = ?9
                 WHERE id = ?10",
                params![
                    item.name,
                    item.description,
                    item.price.cents(),
                    item.image_url,
                    item.category,
                    item.size,
                    item.color,
                    item.stock,
                    format_datetime(&Utc::now()),
                    item.id,
                ],
            )
            .map_err(|e| map_constraint(e, "Item already exists"))?;

        if rows == 0 {
            return Err(item_not_found());
        }
        query_item(&conn, item.id)?.ok_or_else(item_not_found)
    }

    fn delete_item(&self, id: i64) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM items WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    // Cart operations

    fn create_cart(&self, user_id: i64) -> Result<Cart> {
        let conn = self.conn();
        let now = Utc::now();
        conn.execute(
            "INSERT INTO carts (id, created_at, updated_at) VALUES (?1, ?2, ?2)",
            params![user_id, format_datetime(&now)],
        )
        .map_err(|e| map_constraint(e, "Cart already exists"))?;

        Ok(Cart {
            id: user_id,
            items: Vec::new(),
            created_at: now,
            updated_at: now,
        })
    }

    fn get_cart(&self, id: i64) -> Result<Option<Cart>> {
        query_cart(&self.conn(), id)
    }

    fn list_carts(&self) -> Result<Vec<Cart>> {
        let conn = self.conn();

        let mut lines: HashMap<i64, Vec<CartItem>> = HashMap::new();
        {
            let mut stmt = conn.prepare(&format!(
                "SELECT {CART_ITEM_COLUMNS} FROM cart_items ORDER BY id"
            ))?;
            for line in stmt.query_map([], cart_item_from_row)? {
                let line = line?;
                lines.entry(line.cart_id).or_default().push(line);
            }
        }

        let mut stmt = conn.prepare("SELECT id, created_at, updated_at FROM carts ORDER BY id")?;
        let rows = stmt.query_map([], |row| {
            Ok(Cart {
                id: row.get(0)?,
                items: Vec::new(),
                created_at: parse_datetime(&row.get::<_, String>(1)?),
                updated_at: parse_datetime(&row.get::<_, String>(2)?),
            })
        })?;

        let mut carts = rows.collect::<std::result::Result<Vec<_>, _>>()?;
        for cart in &mut carts {
            cart.items = lines.remove(&cart.id).unwrap_or_default();
        }
        Ok(carts)
    }

    fn delete_cart(&self, id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM cart_items WHERE cart_id = ?1", params![id])?;
        let rows = tx.execute("DELETE FROM carts WHERE id = ?1", params![id])?;

        tx.commit()?;
        Ok(rows > 0)
    }

    // Cart line operations

    fn add_cart_item(&self, cart_id: i64, item_id: i64, quantity: i64) -> Result<CartItem> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;
        let now = format_datetime(&Utc::now());

        // SQLite turns an overflowing integer sum into a REAL, so the merge
        // is skipped instead when the total would not fit.
        let rows = tx
            .execute(
                "INSERT INTO cart_items (cart_id, item_id, quantity, created_at, updated_at)
                 VALUES (?1, ?2, ?3, ?4, ?4)
                 ON CONFLICT(cart_id, item_id) DO UPDATE SET
                    quantity = quantity + excluded.quantity,
                    updated_at = excluded.updated_at
                 WHERE cart_items.quantity <= ?5 - excluded.quantity",
                params![cart_id, item_id, quantity, now, i64::MAX],
            )
            .map_err(|e| map_constraint(e, "Cart item already exists"))?;
        if rows == 0 {
            return Err(Error::BadRequest("Quantity is too large".to_string()));
        }

        tx.execute(
            "UPDATE carts SET updated_at = ?1 WHERE id = ?2",
            params![now, cart_id],
        )?;

        let line = tx.query_row(
            &format!("SELECT {CART_ITEM_COLUMNS} FROM cart_items WHERE cart_id = ?1 AND item_id = ?2"),
            params![cart_id, item_id],
            cart_item_from_row,
        )?;

        tx.commit()?;
        Ok(line)
    }

    fn remove_cart_item(&self, cart_id: i64, item_id: i64) -> Result<bool> {
        let mut conn = self.conn();
        let tx = conn.transaction()?;

        let rows = tx.execute(
            "DELETE FROM cart_items WHERE cart_id = ?1 AND item_id = ?2",
            params![cart_id, item_id],
        )?;
        if rows > 0 {
            tx.execute(
                "UPDATE carts SET updated_at = ?1 WHERE id = ?2",
                params![format_datetime(&Utc::now()), cart_id],
            )?;
        }

        tx.commit()?;
        Ok(rows > 0)
    }

    // Session operations

    fn create_session(&self, session: &Session) -> Result<()> {
        let result = self.conn().execute(
            "INSERT INTO sessions (id, token_hash, token_lookup, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
            params![
                session.id,
                session.token_hash,
                session.token_lookup,
                session.user_id,
                format_datetime(&session.created_at),
                format_datetime(&session.expires_at),
            ],
        );

        match result {
            Ok(_) => Ok(()),
            Err(e) => match map_constraint(e, "session lookup collision") {
                Error::Conflict(_) => Err(Error::TokenLookupCollision),
                other => Err(other),
            },
        }
    }

    fn get_session_by_lookup(&self, lookup: &str) -> Result<Option<Session>> {
        let conn = self.conn();
        conn.query_row(
            &format!("SELECT {SESSION_COLUMNS} FROM sessions WHERE token_lookup = ?1"),
            params![lookup],
            session_from_row,
        )
        .optional()
        .map_err(Error::from)
    }

    fn delete_session(&self, id: &str) -> Result<bool> {
        let rows = self
            .conn()
            .execute("DELETE FROM sessions WHERE id = ?1", params![id])?;
        Ok(rows > 0)
    }

    fn delete_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let rows = self.conn().execute(
            "DELETE FROM sessions WHERE expires_at <= ?1",
            params![format_datetime(&now)],
        )?;
        Ok(rows)
    }
}
