/// Password Hashing and Verification
///
/// Handles password hashing with bcrypt and the registration password policy.

use bcrypt::{hash, verify};

use crate::auth::refresh_token::generate_refresh_token;
use crate::error::{AppError, ValidationError};

const MIN_PASSWORD_LENGTH: usize = 8;
/// bcrypt only reads the first 72 bytes of its input
const MAX_PASSWORD_BYTES: usize = 72;

/// Hash a password using bcrypt
///
/// Every call draws a fresh salt, which bcrypt embeds in the returned string.
///
/// # Errors
/// Returns error if:
/// - Password fails the strength policy
/// - Bcrypt hashing fails
pub fn hash_password(password: &str, cost: u32) -> Result<String, AppError> {
    validate_password_strength(password)?;

    hash(password, cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Verify a password against its hash
///
/// A wrong password and an unreadable stored hash both yield `false`.
/// bcrypt compares the computed digest in constant time.
pub fn verify_password(password: &str, hash: &str) -> bool {
    match verify(password, hash) {
        Ok(valid) => valid,
        Err(e) => {
            tracing::warn!(error = %e, "Stored password hash could not be verified");
            false
        }
    }
}

/// Hash of an unguessable throwaway secret, verified against when a login
/// names an unknown email so both paths pay the same bcrypt cost.
pub fn dummy_hash(cost: u32) -> Result<String, AppError> {
    hash(generate_refresh_token(), cost)
        .map_err(|e| AppError::Internal(format!("Password hashing failed: {}", e)))
}

/// Validate password strength requirements
///
/// Requirements:
/// - Minimum 8 characters
/// - Maximum 72 bytes
/// - At least one uppercase letter
/// - At least one digit
/// - At least one character that is not an ASCII letter or digit
pub fn validate_password_strength(password: &str) -> Result<(), ValidationError> {
    if password.is_empty() {
        return Err(ValidationError::EmptyField("password"));
    }

    if password.chars().count() < MIN_PASSWORD_LENGTH {
        return Err(ValidationError::TooShort("password", MIN_PASSWORD_LENGTH));
    }

    if password.len() > MAX_PASSWORD_BYTES {
        return Err(ValidationError::TooLong("password", MAX_PASSWORD_BYTES));
    }

    if !password.chars().any(|c| c.is_uppercase()) {
        return Err(ValidationError::WeakPassword("uppercase letter"));
    }

    if !password.chars().any(|c| c.is_ascii_digit()) {
        return Err(ValidationError::WeakPassword("digit"));
    }

    if password.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(ValidationError::WeakPassword("special character"));
    }

    Ok(())
}
