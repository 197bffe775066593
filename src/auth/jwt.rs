/// JWT Token Generation and Validation
///
/// Access tokens are HS256-signed JWTs living two hours. HS256 is the only
/// algorithm ever accepted; a token declaring anything else is rejected
/// before its signature is considered.

use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use uuid::Uuid;

use crate::auth::claims::{Claims, Principal};
use crate::configuration::JwtSettings;
use crate::error::{AppError, AuthError};

/// Access tokens live 2 hours from issuance
pub const ACCESS_TOKEN_LIFETIME_SECS: i64 = 2 * 60 * 60;

const ALGORITHM: Algorithm = Algorithm::HS256;

/// Whether validation enforces the `exp` claim.
///
/// `Ignore` is used only by the refresh flow, which expects an expired token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExpiryPolicy {
    Enforce,
    Ignore,
}

/// Mints and validates access tokens with a key fixed at construction
#[derive(Clone)]
pub struct AccessTokenIssuer {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    issuer: String,
    audience: String,
}

impl AccessTokenIssuer {
    pub fn new(settings: &JwtSettings) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(settings.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(settings.secret.as_bytes()),
            issuer: settings.issuer.clone(),
            audience: settings.audience.clone(),
        }
    }

    /// Generate a new access token for an account
    ///
    /// # Errors
    /// Returns error if token encoding fails
    pub fn issue(&self, account_id: Uuid, email: &str) -> Result<String, AppError> {
        self.issue_at(account_id, email, Utc::now())
    }

    /// Generate an access token as if issued at `issued_at`
    pub fn issue_at(
        &self,
        account_id: Uuid,
        email: &str,
        issued_at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        let claims = Claims::new(
            account_id,
            email,
            &self.issuer,
            &self.audience,
            issued_at,
            ACCESS_TOKEN_LIFETIME_SECS,
        );

        encode(&Header::new(ALGORITHM), &claims, &self.encoding_key)
            .map_err(|e| AppError::Internal(format!("Token generation failed: {}", e)))
    }

    /// Validate a token and extract the principal it asserts
    ///
    /// Signature, issuer, audience and algorithm are always checked; expiry
    /// only under `ExpiryPolicy::Enforce`, with no leeway.
    ///
    /// # Errors
    /// `AuthError::InvalidToken` for any structural or cryptographic failure
    pub fn validate(&self, token: &str, expiry: ExpiryPolicy) -> Result<Principal, AuthError> {
        let mut validation = Validation::new(ALGORITHM);
        validation.set_issuer(&[&self.issuer]);
        validation.set_audience(&[&self.audience]);
        validation.set_required_spec_claims(&["exp", "iss", "aud", "sub"]);
        validation.leeway = 0;
        validation.validate_exp = expiry == ExpiryPolicy::Enforce;

        let claims = decode::<Claims>(token, &self.decoding_key, &validation)
            .map(|data| data.claims)
            .map_err(|e| {
                tracing::warn!(error = %e, "Access token rejected");
                AuthError::InvalidToken
            })?;

        Principal::try_from(claims)
    }
}
