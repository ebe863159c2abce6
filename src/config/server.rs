use std::env;
use std::net::SocketAddr;
use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const DEFAULT_SESSION_TTL_SECONDS: i64 = 24 * 60 * 60;
const DB_FILE_NAME: &str = "shopfront.db";

#[derive(Debug, Clone)]
pub struct ServerConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    /// SQLite database file. Falls back to `<data_dir>/shopfront.db`.
    pub database_path: Option<PathBuf>,
    /// Keys the session token hashes. Rotating it invalidates every session.
    pub secret_key: Option<String>,
    pub session_ttl_seconds: i64,
}

impl ServerConfig {
    /// Builds a config from the process environment, reading `.env` first if present.
    pub fn from_env() -> Result<Self> {
        dotenvy::dotenv().ok();

        let mut config = Self::default();

        if let Ok(host) = env::var("HOST") {
            config.host = host;
        }
        if let Ok(port) = env::var("PORT") {
            config.port = port
                .parse()
                .map_err(|e| Error::Config(format!("invalid PORT '{port}': {e}")))?;
        }
        if let Ok(data_dir) = env::var("DATA_DIR") {
            config.data_dir = PathBuf::from(data_dir);
        }
        if let Ok(url) = env::var("DATABASE_URL") {
            config.database_path = Some(parse_database_url(&url)?);
        }
        if let Ok(secret) = env::var("SECRET_KEY") {
            config.secret_key = Some(secret);
        }
        if let Ok(ttl) = env::var("SESSION_TTL_SECONDS") {
            config.session_ttl_seconds = ttl
                .parse()
                .map_err(|e| Error::Config(format!("invalid SESSION_TTL_SECONDS '{ttl}': {e}")))?;
        }

        Ok(config)
    }

    pub fn socket_addr(&self) -> std::result::Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }

    #[must_use]
    pub fn db_path(&self) -> PathBuf {
        self.database_path
            .clone()
            .unwrap_or_else(|| self.data_dir.join(DB_FILE_NAME))
    }

    /// Returns the secret key, rejecting a missing or blank one.
    pub fn require_secret_key(&self) -> Result<&str> {
        match self.secret_key.as_deref() {
            Some(key) if !key.trim().is_empty() => Ok(key),
            _ => Err(Error::Config(
                "SECRET_KEY must be set to a non-empty value".to_string(),
            )),
        }
    }
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 8080,
            data_dir: PathBuf::from("./data"),
            database_path: None,
            secret_key: None,
            session_ttl_seconds: DEFAULT_SESSION_TTL_SECONDS,
        }
    }
}

/// Accepts a bare file path or a `sqlite://` / `sqlite:` URL.
pub fn parse_database_url(url: &str) -> Result<PathBuf> {
    let path = url
        .strip_prefix("sqlite://")
        .or_else(|| url.strip_prefix("sqlite:"))
        .unwrap_or(url);

    if path.is_empty() {
        return Err(Error::Config("DATABASE_URL cannot be empty".to_string()));
    }
    if url.contains("://") && !url.starts_with("sqlite://") {
        return Err(Error::Config(format!(
            "unsupported DATABASE_URL scheme in '{url}', only sqlite is supported"
        )));
    }

    Ok(Path::new(path).to_path_buf())
}
