mod server;

pub use server::{DEFAULT_SESSION_TTL_SECONDS, ServerConfig, parse_database_url};
