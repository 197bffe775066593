/// Refresh Token Generation
///
/// Refresh tokens are:
/// - 64 bytes from the operating system CSPRNG, base64 encoded (88 chars)
/// - Opaque to the client and not self-describing
/// - Hashed with SHA-256 before storage (never store plaintext)
/// - Bound to one account and replaced on every successful refresh

use base64::{engine::general_purpose::STANDARD, Engine};
use chrono::{DateTime, Duration, Utc};
use rand::rngs::OsRng;
use rand::RngCore;
use sha2::{Digest, Sha256};
use subtle::ConstantTimeEq;

use crate::account::RefreshSession;

/// Raw entropy per refresh token
pub const REFRESH_TOKEN_BYTES: usize = 64;

/// Encoded length of a refresh token
pub const REFRESH_TOKEN_LENGTH: usize = 88;

/// Refresh tokens live 7 days from issuance
pub const REFRESH_TOKEN_LIFETIME_SECS: i64 = 7 * 24 * 60 * 60;

/// Generate a new cryptographically secure refresh token.
///
/// The token is returned in plaintext (this is what the client stores).
pub fn generate_refresh_token() -> String {
    let mut bytes = [0u8; REFRESH_TOKEN_BYTES];
    OsRng.fill_bytes(&mut bytes);
    STANDARD.encode(bytes)
}

/// Hash a refresh token using SHA-256, hex encoded
pub fn hash_refresh_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}

/// Constant-time digest comparison
pub fn digests_match(stored: &str, presented: &str) -> bool {
    stored.as_bytes().ct_eq(presented.as_bytes()).into()
}

/// Session record for a freshly generated token, expiring 7 days after `issued_at`
pub fn session_for(token: &str, issued_at: DateTime<Utc>) -> RefreshSession {
    RefreshSession::new(
        hash_refresh_token(token),
        issued_at + Duration::seconds(REFRESH_TOKEN_LIFETIME_SECS),
    )
}
