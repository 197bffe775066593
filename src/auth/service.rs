/// Credential Lifecycle Service
///
/// Registration, login, refresh-token rotation and logout on top of an
/// `AccountStore`. No session state lives here: every call reads the account,
/// decides, and writes at most once.

use std::fmt;
use std::sync::Arc;

use chrono::Utc;
use serde::Serialize;
use uuid::Uuid;

use crate::account::{Account, NewAccount};
use crate::auth::claims::Principal;
use crate::auth::jwt::{AccessTokenIssuer, ExpiryPolicy, ACCESS_TOKEN_LIFETIME_SECS};
use crate::auth::password::{dummy_hash, hash_password, verify_password};
use crate::auth::refresh_token::{generate_refresh_token, hash_refresh_token, session_for};
use crate::configuration::{JwtSettings, PasswordSettings};
use crate::error::{AppError, AuthError};
use crate::store::{AccountStore, StoreError};
use crate::validators::{is_valid_email, is_valid_name, normalize_email};

/// Credentials handed to the client after login or refresh
#[derive(Clone, Serialize)]
pub struct TokenPair {
    pub account_id: Uuid,
    pub email: String,
    pub access_token: String,
    pub refresh_token: String,
    pub token_type: &'static str,
    /// Access token lifetime in seconds
    pub expires_in: i64,
}

impl fmt::Debug for TokenPair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenPair")
            .field("account_id", &self.account_id)
            .field("email", &self.email)
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

#[derive(Clone)]
pub struct CredentialService {
    store: Arc<dyn AccountStore>,
    issuer: AccessTokenIssuer,
    hash_cost: u32,
    dummy_hash: Arc<str>,
}

impl CredentialService {
    /// # Errors
    /// Fails on invalid settings or if the bcrypt dummy hash cannot be built
    pub fn new(
        store: Arc<dyn AccountStore>,
        jwt: &JwtSettings,
        password: &PasswordSettings,
    ) -> Result<Self, AppError> {
        jwt.validate()?;
        password.validate()?;

        Ok(Self {
            store,
            issuer: AccessTokenIssuer::new(jwt),
            hash_cost: password.hash_cost,
            dummy_hash: dummy_hash(password.hash_cost)?.into(),
        })
    }

    pub fn issuer(&self) -> &AccessTokenIssuer {
        &self.issuer
    }

    /// Create an account.
    ///
    /// A taken email is reported as `EmailTaken` before the password is even
    /// looked at.
    #[tracing::instrument(name = "Register account", skip(self, name, password))]
    pub async fn register(
        &self,
        name: &str,
        email: &str,
        password: &str,
    ) -> Result<Account, AppError> {
        let name = is_valid_name(name)?;
        let email = is_valid_email(email)?;

        if self.store.find_by_email(&email).await?.is_some() {
            tracing::info!("Registration rejected: email already registered");
            return Err(AuthError::EmailTaken.into());
        }

        let cost = self.hash_cost;
        let password = password.to_owned();
        let password_hash = spawn_blocking_with_tracing(move || hash_password(&password, cost))
            .await??;

        let account = self
            .store
            .create(NewAccount {
                id: Uuid::new_v4(),
                name,
                email,
                password_hash,
            })
            .await
            .map_err(|e| match e {
                StoreError::DuplicateEmail => AppError::from(AuthError::EmailTaken),
                other => other.into(),
            })?;

        tracing::info!(account_id = %account.id, "Account registered");
        Ok(account)
    }

    /// Check a password against an account's stored hash off the async executor
    pub async fn verify_password(&self, account: &Account, password: &str) -> Result<bool, AppError> {
        let password = password.to_owned();
        let hash = account.password_hash.clone();
        spawn_blocking_with_tracing(move || verify_password(&password, &hash)).await
    }

    /// Authenticate with email and password and start a new session,
    /// replacing any previous one.
    #[tracing::instrument(name = "Login", skip(self, password))]
    pub async fn login(&self, email: &str, password: &str) -> Result<TokenPair, AppError> {
        let email = normalize_email(email);

        let account = match self.store.find_by_email(&email).await? {
            Some(account) => account,
            None => {
                // Same bcrypt cost as a real account, so timing does not leak existence
                let hash = self.dummy_hash.clone();
                let password = password.to_owned();
                spawn_blocking_with_tracing(move || verify_password(&password, &hash)).await?;
                tracing::warn!("Login failed: unknown email");
                return Err(AuthError::InvalidCredentials.into());
            }
        };

        if !self.verify_password(&account, password).await? {
            tracing::warn!(account_id = %account.id, "Login failed: wrong password");
            return Err(AuthError::InvalidCredentials.into());
        }

        let now = Utc::now();
        let access_token = self.issuer.issue_at(account.id, &account.email, now)?;
        let refresh_token = generate_refresh_token();

        self.store
            .set_refresh_session(account.id, session_for(&refresh_token, now))
            .await?;

        tracing::info!(account_id = %account.id, "Account logged in");
        Ok(self.pair(&account, access_token, refresh_token))
    }

    /// Exchange an (expired) access token and the current refresh token for
    /// a new pair. The presented refresh token is unusable afterwards.
    #[tracing::instrument(name = "Refresh token pair", skip_all)]
    pub async fn refresh(
        &self,
        access_token: &str,
        refresh_token: &str,
    ) -> Result<TokenPair, AppError> {
        // 1. The access token must be genuine; only its expiry is ignored
        let principal = self.issuer.validate(access_token, ExpiryPolicy::Ignore)?;

        // 2. It must name an existing account
        let account = match self.store.find_by_email(&principal.email).await? {
            Some(account) if account.id == principal.account_id => account,
            _ => {
                tracing::warn!(account_id = %principal.account_id, "Refresh for unknown account");
                return Err(AuthError::InvalidRefreshToken.into());
            }
        };

        // 3. The refresh token must be the account's live one
        let now = Utc::now();
        let presented_hash = hash_refresh_token(refresh_token);
        let live = account
            .refresh_session
            .as_ref()
            .is_some_and(|s| s.matches(&presented_hash) && s.is_live_at(now));
        if !live {
            tracing::warn!(account_id = %account.id, "Refresh rejected: stale or unknown refresh token");
            return Err(AuthError::InvalidRefreshToken.into());
        }

        // 4. Rotate, conditional on nobody having rotated since step 3
        let new_access_token = self.issuer.issue_at(account.id, &account.email, now)?;
        let new_refresh_token = generate_refresh_token();
        let rotated = self
            .store
            .rotate_refresh_session(
                account.id,
                &presented_hash,
                session_for(&new_refresh_token, now),
            )
            .await?;
        if !rotated {
            tracing::warn!(account_id = %account.id, "Refresh rejected: token rotated concurrently");
            return Err(AuthError::InvalidRefreshToken.into());
        }

        tracing::info!(account_id = %account.id, "Token pair rotated");
        Ok(self.pair(&account, new_access_token, new_refresh_token))
    }

    /// Validate a bearer token for a protected request. Expired tokens are
    /// rejected.
    pub fn authenticate(&self, access_token: &str) -> Result<Principal, AuthError> {
        self.issuer.validate(access_token, ExpiryPolicy::Enforce)
    }

    /// Load the account behind an authenticated principal
    pub async fn current_account(&self, principal: &Principal) -> Result<Account, AppError> {
        self.store
            .find_by_id(principal.account_id)
            .await?
            .ok_or_else(|| AuthError::InvalidToken.into())
    }

    /// End the account's session; its refresh token stops working at once
    #[tracing::instrument(name = "Logout", skip_all, fields(account_id = %principal.account_id))]
    pub async fn logout(&self, principal: &Principal) -> Result<(), AppError> {
        match self.store.clear_refresh_session(principal.account_id).await {
            Ok(()) => {
                tracing::info!("Session cleared");
                Ok(())
            }
            Err(StoreError::NotFound(_)) => Err(AuthError::InvalidToken.into()),
            Err(e) => Err(e.into()),
        }
    }

    fn pair(&self, account: &Account, access_token: String, refresh_token: String) -> TokenPair {
        TokenPair {
            account_id: account.id,
            email: account.email.clone(),
            access_token,
            refresh_token,
            token_type: "Bearer",
            expires_in: ACCESS_TOKEN_LIFETIME_SECS,
        }
    }
}

/// Run CPU-heavy work (bcrypt) on the blocking pool, inside the caller's span
async fn spawn_blocking_with_tracing<F, R>(f: F) -> Result<R, AppError>
where
    F: FnOnce() -> R + Send + 'static,
    R: Send + 'static,
{
    let span = tracing::Span::current();
    tokio::task::spawn_blocking(move || span.in_scope(f))
        .await
        .map_err(|e| AppError::Internal(format!("Blocking task failed: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::InMemoryAccountStore;

    fn service() -> (CredentialService, InMemoryAccountStore) {
        let store = InMemoryAccountStore::new();
        let jwt = JwtSettings {
            secret: "test-secret-key-at-least-32-characters-long".to_string(),
            issuer: "test-issuer".to_string(),
            audience: "test-audience".to_string(),
        };
        let service =
            CredentialService::new(Arc::new(store.clone()), &jwt, &PasswordSettings { hash_cost: 4 })
                .unwrap();
        (service, store)
    }

    #[tokio::test]
    async fn test_register_hashes_password() {
        let (service, _) = service();
        let account = service
            .register("Alice", "alice@x.com", "P@ssw0rd1")
            .await
            .unwrap();

        assert_ne!(account.password_hash, "P@ssw0rd1");
        assert!(service.verify_password(&account, "P@ssw0rd1").await.unwrap());
        assert!(!service.verify_password(&account, "P@ssw0rd2").await.unwrap());
    }

    #[tokio::test]
    async fn test_taken_email_wins_over_weak_password() {
        let (service, _) = service();
        service.register("Alice", "alice@x.com", "P@ssw0rd1").await.unwrap();

        let err = service.register("Eve", "alice@x.com", "weak").await.unwrap_err();
        assert_eq!(err.auth_error(), Some(AuthError::EmailTaken));
    }

    #[tokio::test]
    async fn test_weak_password_on_fresh_email_is_validation_error() {
        let (service, store) = service();
        let err = service.register("Alice", "alice@x.com", "weak").await.unwrap_err();

        assert!(matches!(err, AppError::Validation(_)));
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn test_login_persists_session() {
        let (service, store) = service();
        let account = service.register("Alice", "alice@x.com", "P@ssw0rd1").await.unwrap();

        let pair = service.login("alice@x.com", "P@ssw0rd1").await.unwrap();

        let stored = store.find_by_id(account.id).await.unwrap().unwrap();
        let session = stored.refresh_session.expect("login creates a session");
        assert!(session.matches(&hash_refresh_token(&pair.refresh_token)));
        assert_eq!(pair.account_id, account.id);
        assert_eq!(pair.expires_in, 7200);
    }

    #[tokio::test]
    async fn test_second_login_replaces_session() {
        let (service, _) = service();
        service.register("Alice", "alice@x.com", "P@ssw0rd1").await.unwrap();

        let first = service.login("alice@x.com", "P@ssw0rd1").await.unwrap();
        let second = service.login("alice@x.com", "P@ssw0rd1").await.unwrap();

        let err = service
            .refresh(&first.access_token, &first.refresh_token)
            .await
            .unwrap_err();
        assert_eq!(err.auth_error(), Some(AuthError::InvalidRefreshToken));
        assert!(service
            .refresh(&second.access_token, &second.refresh_token)
            .await
            .is_ok());
    }

    #[tokio::test]
    async fn test_refresh_with_forged_token_never_reaches_store() {
        let (service, _) = service();
        service.register("Alice", "alice@x.com", "P@ssw0rd1").await.unwrap();
        let pair = service.login("alice@x.com", "P@ssw0rd1").await.unwrap();

        let forged = format!("{}x", pair.access_token);
        let err = service.refresh(&forged, &pair.refresh_token).await.unwrap_err();

        assert_eq!(err.auth_error(), Some(AuthError::InvalidToken));
    }

    #[tokio::test]
    async fn test_token_pair_debug_hides_tokens() {
        let (service, _) = service();
        service.register("Alice", "alice@x.com", "P@ssw0rd1").await.unwrap();
        let pair = service.login("alice@x.com", "P@ssw0rd1").await.unwrap();

        let debug = format!("{:?}", pair);
        assert!(!debug.contains(&pair.access_token));
        assert!(!debug.contains(&pair.refresh_token));
        assert!(debug.contains("alice@x.com"));
    }

    #[tokio::test]
    async fn test_authenticate_rejects_expired_token() {
        let (service, _) = service();
        let account = service.register("Alice", "alice@x.com", "P@ssw0rd1").await.unwrap();
        let stale = service
            .issuer()
            .issue_at(account.id, &account.email, Utc::now() - chrono::Duration::hours(3))
            .unwrap();

        assert_eq!(service.authenticate(&stale), Err(AuthError::InvalidToken));
        let fresh = service.issuer().issue(account.id, &account.email).unwrap();
        assert_eq!(service.authenticate(&fresh).unwrap().account_id, account.id);
    }

    #[tokio::test]
    async fn test_logout_unknown_account() {
        let (service, _) = service();
        let principal = Principal {
            account_id: Uuid::new_v4(),
            email: "ghost@x.com".to_string(),
        };

        let err = service.logout(&principal).await.unwrap_err();
        assert_eq!(err.auth_error(), Some(AuthError::InvalidToken));
    }
}
