/// Account record owned by the account store.

use std::fmt;

use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::auth::refresh_token::digests_match;

/// A registered account.
///
/// `refresh_session` is `None` while the account has no active session.
#[derive(Clone, PartialEq, Eq)]
pub struct Account {
    pub id: Uuid,
    pub name: String,
    /// Normalized (trimmed, lower-cased) email
    pub email: String,
    /// bcrypt hash with embedded salt
    pub password_hash: String,
    pub refresh_session: Option<RefreshSession>,
    pub created_at: DateTime<Utc>,
}

impl fmt::Debug for Account {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Account")
            .field("id", &self.id)
            .field("name", &self.name)
            .field("email", &self.email)
            .field("has_session", &self.refresh_session.is_some())
            .field("created_at", &self.created_at)
            .finish_non_exhaustive()
    }
}

/// Input for creating an account. The email is already normalized and the
/// password already hashed.
#[derive(Clone)]
pub struct NewAccount {
    pub id: Uuid,
    pub name: String,
    pub email: String,
    pub password_hash: String,
}

/// The single live refresh secret of an account.
///
/// Only the SHA-256 digest of the secret is kept; the plaintext goes to the
/// client and nowhere else.
#[derive(Clone, PartialEq, Eq)]
pub struct RefreshSession {
    pub token_hash: String,
    pub expires_at: DateTime<Utc>,
}

impl RefreshSession {
    pub fn new(token_hash: String, expires_at: DateTime<Utc>) -> Self {
        Self {
            token_hash,
            expires_at,
        }
    }

    /// Constant-time comparison against the digest of a presented token
    pub fn matches(&self, presented_hash: &str) -> bool {
        digests_match(&self.token_hash, presented_hash)
    }

    pub fn is_live_at(&self, now: DateTime<Utc>) -> bool {
        self.expires_at > now
    }
}

impl fmt::Debug for RefreshSession {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RefreshSession")
            .field("expires_at", &self.expires_at)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_liveness() {
        let now = Utc::now();
        let session = RefreshSession::new("abc".to_string(), now + Duration::seconds(1));

        assert!(session.is_live_at(now));
        assert!(!session.is_live_at(now + Duration::seconds(1)));
    }

    #[test]
    fn test_session_matching() {
        let session = RefreshSession::new("abc".to_string(), Utc::now());

        assert!(session.matches("abc"));
        assert!(!session.matches("abd"));
        assert!(!session.matches("ab"));
    }

    #[test]
    fn test_debug_hides_secrets() {
        let account = Account {
            id: Uuid::new_v4(),
            name: "Alice".to_string(),
            email: "alice@x.com".to_string(),
            password_hash: "$2b$04$secrethash".to_string(),
            refresh_session: Some(RefreshSession::new("digest".to_string(), Utc::now())),
            created_at: Utc::now(),
        };
        let rendered = format!("{:?}", account);

        assert!(!rendered.contains("secrethash"));
        assert!(!rendered.contains("digest"));
        assert!(rendered.contains("has_session: true"));
    }
}
