use chrono::Utc;

use super::user;
use crate::auth::SessionManager;
use crate::error::Result;
use crate::store::Store;
use crate::types::{Session, User};

/// Checks the credentials and opens a session. Returns the user and the raw
/// session token.
pub fn login(
    store: &dyn Store,
    sessions: &SessionManager,
    username: &str,
    password: &str,
) -> Result<(User, String)> {
    let user = user::login(store, username, password)?;
    let token = sessions.issue(store, user.id)?;

    tracing::info!(user_id = user.id, "user logged in");
    Ok((user, token))
}

pub fn logout(store: &dyn Store, sessions: &SessionManager, session: &Session) -> Result<()> {
    sessions.revoke(store, session)?;
    tracing::info!(user_id = session.user_id, "user logged out");
    Ok(())
}

/// Removes every session whose lifetime has ended.
pub fn purge_expired_sessions(store: &dyn Store) -> Result<usize> {
    store.delete_expired_sessions(Utc::now())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;
    use crate::store::SqliteStore;
    use tempfile::TempDir;

    fn setup() -> (TempDir, SqliteStore, SessionManager) {
        let temp_dir = TempDir::new().unwrap();
        let store = SqliteStore::new(temp_dir.path().join("test.db")).unwrap();
        store.initialize().unwrap();
        let sessions = SessionManager::new("test-secret", 3600).unwrap();
        (temp_dir, store, sessions)
    }

    #[test]
    fn test_login_issues_usable_token() {
        let (_dir, store, sessions) = setup();
        user::register(&store, "alice", "pw").unwrap();

        let (user, token) = login(&store, &sessions, "alice", "pw").unwrap();
        let (_, session_user) = sessions.validate(&store, &token).unwrap();

        assert_eq!(session_user.id, user.id);
    }

    #[test]
    fn test_login_with_bad_password_issues_nothing() {
        let (_dir, store, sessions) = setup();
        user::register(&store, "alice", "pw").unwrap();

        assert!(matches!(
            login(&store, &sessions, "alice", "nope"),
            Err(Error::Unauthorized)
        ));
        assert_eq!(purge_expired_sessions(&store).unwrap(), 0);
    }

    #[test]
    fn test_logout_invalidates_token() {
        let (_dir, store, sessions) = setup();
        user::register(&store, "alice", "pw").unwrap();
        let (_, token) = login(&store, &sessions, "alice", "pw").unwrap();
        let (session, _) = sessions.validate(&store, &token).unwrap();

        logout(&store, &sessions, &session).unwrap();

        assert!(sessions.validate(&store, &token).is_err());
    }

    #[test]
    fn test_deleting_user_ends_sessions() {
        let (_dir, store, sessions) = setup();
        let alice = user::register(&store, "alice", "pw").unwrap();
        let (_, token) = login(&store, &sessions, "alice", "pw").unwrap();

        user::delete(&store, alice.id).unwrap();

        assert!(matches!(
            sessions.validate(&store, &token),
            Err(Error::Unauthorized)
        ));
    }

    #[test]
    fn test_purge_expired_sessions() {
        let (_dir, store, sessions) = setup();
        let alice = user::register(&store, "alice", "pw").unwrap();
        sessions.issue(&store, alice.id).unwrap();
        sessions.issue(&store, alice.id).unwrap();
        store
            .connection()
            .execute(
                "UPDATE sessions SET expires_at = '2000-01-01T00:00:00.000000Z'
                 WHERE rowid = (SELECT MIN(rowid) FROM sessions)",
                [],
            )
            .unwrap();

        assert_eq!(purge_expired_sessions(&store).unwrap(), 1);
    }
}
