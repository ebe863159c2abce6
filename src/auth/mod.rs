mod helpers;
mod middleware;
mod password;
mod session;
mod token;

pub use helpers::{
    CredentialsError, SESSION_TOKEN_HEADER, basic_credentials_from_headers,
    extract_basic_credentials, extract_session_token,
};
pub use middleware::{AuthError, RequireSession};
pub use password::{hash_password, verify_password};
pub use session::SessionManager;
pub use token::{SessionTokens, parse_token};
