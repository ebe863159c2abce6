use axum::http::{HeaderMap, header::AUTHORIZATION};
use base64::Engine;
use base64::engine::general_purpose::STANDARD;

/// Header carrying a session token for clients that cannot set `Authorization`.
pub const SESSION_TOKEN_HEADER: &str = "x-session-token";

#[derive(Debug, PartialEq, Eq)]
pub enum CredentialsError {
    Missing,
    InvalidScheme,
    Malformed,
}

/// Decodes `Basic base64(username:password)`.
///
/// The password may itself contain `:`; only the first one separates the two.
pub fn extract_basic_credentials(header: &str) -> Option<(String, String)> {
    let encoded = header.strip_prefix("Basic ")?;
    let decoded = STANDARD.decode(encoded.trim()).ok()?;
    let credentials = String::from_utf8(decoded).ok()?;

    let (username, password) = credentials.split_once(':')?;

    Some((username.to_string(), password.to_string()))
}

/// Reads username and password from the request's Basic auth header.
pub fn basic_credentials_from_headers(
    headers: &HeaderMap,
) -> Result<(String, String), CredentialsError> {
    let header = headers
        .get(AUTHORIZATION)
        .ok_or(CredentialsError::Missing)?
        .to_str()
        .map_err(|_| CredentialsError::Malformed)?;

    if !header.starts_with("Basic ") {
        return Err(CredentialsError::InvalidScheme);
    }

    let (username, password) =
        extract_basic_credentials(header).ok_or(CredentialsError::Malformed)?;
    if username.is_empty() || password.is_empty() {
        return Err(CredentialsError::Missing);
    }

    Ok((username, password))
}

/// Extracts a session token from `Authorization: Bearer` or the
/// `X-Session-Token` header, preferring the former.
/// Returns None if neither header is present.
pub fn extract_session_token(headers: &HeaderMap) -> Result<Option<String>, CredentialsError> {
    if let Some(value) = headers.get(AUTHORIZATION) {
        let header = value.to_str().map_err(|_| CredentialsError::Malformed)?;
        return match header.strip_prefix("Bearer ") {
            Some(token) => Ok(Some(token.trim().to_string())),
            None => Err(CredentialsError::InvalidScheme),
        };
    }

    match headers.get(SESSION_TOKEN_HEADER) {
        Some(value) => value
            .to_str()
            .map(|token| Some(token.trim().to_string()))
            .map_err(|_| CredentialsError::Malformed),
        None => Ok(None),
    }
}
