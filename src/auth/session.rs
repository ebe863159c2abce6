use chrono::{Duration, Utc};
use uuid::Uuid;

use super::token::{SessionTokens, parse_token};
use crate::error::{Error, Result};
use crate::store::Store;
use crate::types::{Session, User};

const MAX_RETRIES: u32 = 3;

/// Issues, validates and revokes login sessions.
pub struct SessionManager {
    tokens: SessionTokens,
    ttl: Duration,
}

impl SessionManager {
    pub fn new(server_secret: &str, ttl_seconds: i64) -> Result<Self> {
        if server_secret.is_empty() {
            return Err(Error::Config("secret key must not be empty".to_string()));
        }
        if ttl_seconds <= 0 {
            return Err(Error::Config(
                "session lifetime must be positive".to_string(),
            ));
        }

        Ok(Self {
            tokens: SessionTokens::new(server_secret)?,
            ttl: Duration::seconds(ttl_seconds),
        })
    }

    /// Creates a session for `user_id` and returns the raw token. The raw
    /// token is never stored and cannot be recovered later.
    pub fn issue(&self, store: &dyn Store, user_id: i64) -> Result<String> {
        for _ in 0..MAX_RETRIES {
            let (raw_token, lookup, hash) = self.tokens.generate()?;

            let now = Utc::now();
            let session = Session {
                id: Uuid::new_v4().to_string(),
                token_hash: hash,
                token_lookup: lookup,
                user_id,
                created_at: now,
                expires_at: now + self.ttl,
            };

            match store.create_session(&session) {
                Ok(()) => {
                    tracing::debug!(user_id, session = %session.id, "session issued");
                    return Ok(raw_token);
                }
                Err(Error::TokenLookupCollision) => continue,
                Err(e) => return Err(e),
            }
        }

        Err(Error::Internal(
            "failed to issue session after retries".to_string(),
        ))
    }

    /// Resolves a raw token to its live session and user.
    pub fn validate(&self, store: &dyn Store, raw_token: &str) -> Result<(Session, User)> {
        let (lookup, _secret) = parse_token(raw_token)?;

        let session = store
            .get_session_by_lookup(&lookup)?
            .ok_or(Error::Unauthorized)?;

        if !self.tokens.verify(raw_token, &session.token_hash)? {
            return Err(Error::Unauthorized);
        }

        if session.expires_at <= Utc::now() {
            return Err(Error::SessionExpired);
        }

        let user = store
            .get_user(session.user_id)?
            .ok_or(Error::Unauthorized)?;

        Ok((session, user))
    }

    pub fn revoke(&self, store: &dyn Store, session: &Session) -> Result<()> {
        store.delete_session(&session.id)?;
        Ok(())
    }
}
