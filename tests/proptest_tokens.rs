//! Property-based tests for token handling and input validation
//!
//! These tests verify:
//! - Malformed access tokens never cause panics and are always rejected
//! - Tampering with any part of a real token is detected
//! - Refresh tokens always carry 64 bytes of entropy
//! - Email validation never panics and accepts only normalized output

mod common;

use authgate::auth::{
    generate_refresh_token, hash_refresh_token, AccessTokenIssuer, ExpiryPolicy,
    REFRESH_TOKEN_BYTES, REFRESH_TOKEN_LENGTH,
};
use authgate::error::AuthError;
use authgate::validators::is_valid_email;
use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine};
use proptest::prelude::*;

fn issuer() -> AccessTokenIssuer {
    AccessTokenIssuer::new(&common::jwt_settings())
}

/// Strings shaped more or less like a JWT
fn arb_malformed_token() -> impl Strategy<Value = String> {
    prop_oneof![
        "[a-zA-Z0-9_-]{0,60}",
        "[a-zA-Z0-9_-]{1,30}\\.[a-zA-Z0-9_-]{1,30}\\.[a-zA-Z0-9_-]{1,43}",
        Just("..".to_string()),
        Just("".to_string()),
        "[!@#$%^&*()]{10,30}\\.[a-zA-Z0-9_-]{20,40}\\.x",
        any::<[u8; 32]>().prop_map(|bytes| {
            let part = URL_SAFE_NO_PAD.encode(bytes);
            format!("{part}.{part}.{part}")
        }),
        ".*",
    ]
}

proptest! {
    #[test]
    fn malformed_tokens_are_rejected(token in arb_malformed_token()) {
        let issuer = issuer();
        for policy in [ExpiryPolicy::Enforce, ExpiryPolicy::Ignore] {
            prop_assert_eq!(issuer.validate(&token, policy).unwrap_err(), AuthError::InvalidToken);
        }
    }

    #[test]
    fn flipping_any_token_byte_is_detected(index in any::<prop::sample::Index>(), replacement in "[a-zA-Z0-9_-]") {
        let issuer = issuer();
        let token = issuer.issue(uuid::Uuid::new_v4(), "alice@x.com").unwrap();

        let position = index.index(token.len());
        let original = &token[position..position + 1];
        // The last char may only carry base64 filler bits
        prop_assume!(original != "." && original != replacement && position != token.len() - 1);

        let mut tampered = token.clone();
        tampered.replace_range(position..position + 1, &replacement);

        prop_assert!(issuer.validate(&tampered, ExpiryPolicy::Ignore).is_err());
    }

    #[test]
    fn refresh_tokens_carry_full_entropy(_round in 0u8..32) {
        let token = generate_refresh_token();

        prop_assert_eq!(token.len(), REFRESH_TOKEN_LENGTH);
        let decoded = base64::engine::general_purpose::STANDARD.decode(&token).unwrap();
        prop_assert_eq!(decoded.len(), REFRESH_TOKEN_BYTES);
        prop_assert_eq!(hash_refresh_token(&token).len(), 64);
    }

    #[test]
    fn email_validation_never_panics(input in ".{0,300}") {
        if let Ok(email) = is_valid_email(&input) {
            prop_assert_eq!(email.clone(), email.to_lowercase());
            prop_assert_eq!(email.trim(), email.as_str());
            prop_assert!(email.contains('@'));
        }
    }

    #[test]
    fn well_formed_emails_are_accepted(local in "[a-z0-9._+-]{1,20}", domain in "[a-z0-9-]{1,20}", tld in "[a-z]{2,6}") {
        let email = format!("{local}@{domain}.{tld}");
        prop_assert_eq!(is_valid_email(&email.to_uppercase()).unwrap(), email);
    }
}
