/// JWT Claims structure
///
/// Represents the payload of an access token: the account identity plus the
/// registered claims (RFC 7519) checked on validation.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AuthError;

/// JWT Claims for access tokens
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    /// Subject (account ID as UUID string)
    pub sub: String,
    /// Account email
    pub email: String,
    /// Issuer
    pub iss: String,
    /// Audience
    pub aud: String,
    /// Issued at (Unix timestamp)
    pub iat: i64,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
}

impl Claims {
    /// Create claims for an account, valid for `lifetime_secs` after `issued_at`
    pub fn new(
        account_id: Uuid,
        email: &str,
        issuer: &str,
        audience: &str,
        issued_at: DateTime<Utc>,
        lifetime_secs: i64,
    ) -> Self {
        let iat = issued_at.timestamp();
        Self {
            sub: account_id.to_string(),
            email: email.to_string(),
            iss: issuer.to_string(),
            aud: audience.to_string(),
            iat,
            exp: iat + lifetime_secs,
        }
    }

    /// Extract account ID from claims
    ///
    /// # Errors
    /// A subject that is not a UUID makes the whole token invalid
    pub fn account_id(&self) -> Result<Uuid, AuthError> {
        Uuid::parse_str(&self.sub).map_err(|_| AuthError::InvalidToken)
    }
}

/// The authenticated caller, derived from validated claims.
///
/// Protected handlers receive this through request extensions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Principal {
    pub account_id: Uuid,
    pub email: String,
}

impl TryFrom<Claims> for Principal {
    type Error = AuthError;

    fn try_from(claims: Claims) -> Result<Self, Self::Error> {
        Ok(Self {
            account_id: claims.account_id()?,
            email: claims.email,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn claims_for(account_id: Uuid, issued_at: DateTime<Utc>) -> Claims {
        Claims::new(
            account_id,
            "test@example.com",
            "issuer",
            "audience",
            issued_at,
            7200,
        )
    }

    #[test]
    fn test_claims_creation() {
        let account_id = Uuid::new_v4();
        let now = Utc::now();
        let claims = claims_for(account_id, now);

        assert_eq!(claims.sub, account_id.to_string());
        assert_eq!(claims.email, "test@example.com");
        assert_eq!(claims.iss, "issuer");
        assert_eq!(claims.aud, "audience");
        assert_eq!(claims.exp - claims.iat, 7200);
    }

    #[test]
    fn test_principal_from_claims() {
        let account_id = Uuid::new_v4();
        let principal = Principal::try_from(claims_for(account_id, Utc::now())).unwrap();

        assert_eq!(principal.account_id, account_id);
        assert_eq!(principal.email, "test@example.com");
    }

    #[test]
    fn test_invalid_account_id() {
        let mut claims = claims_for(Uuid::new_v4(), Utc::now());
        claims.sub = "invalid-uuid".to_string();

        assert_eq!(claims.account_id(), Err(AuthError::InvalidToken));
        assert!(Principal::try_from(claims).is_err());
    }
}
