/// Authentication module
///
/// Password hashing, access-token issuance and validation, refresh-token
/// generation, and the credential service that ties them to the account store.

mod claims;
mod jwt;
mod password;
pub(crate) mod refresh_token;
mod service;

pub use claims::{Claims, Principal};
pub use jwt::{AccessTokenIssuer, ExpiryPolicy, ACCESS_TOKEN_LIFETIME_SECS};
pub use password::{hash_password, validate_password_strength, verify_password};
pub use refresh_token::{
    generate_refresh_token, hash_refresh_token, REFRESH_TOKEN_BYTES, REFRESH_TOKEN_LENGTH,
    REFRESH_TOKEN_LIFETIME_SECS,
};
pub use service::{CredentialService, TokenPair};
