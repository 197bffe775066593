/// Account persistence
///
/// The credential service only ever reads an account, creates one, or
/// replaces its refresh session. `AccountStore` is that contract;
/// implementations must make `create` reject a duplicate email and
/// `rotate_refresh_session` a single atomic compare-and-swap.

mod memory;
mod postgres;

use async_trait::async_trait;
use uuid::Uuid;

use crate::account::{Account, NewAccount, RefreshSession};

pub use memory::InMemoryAccountStore;
pub use postgres::PgAccountStore;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("an account with this email already exists")]
    DuplicateEmail,
    #[error("account {0} not found")]
    NotFound(Uuid),
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait AccountStore: Send + Sync {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>>;

    /// Lookup by normalized email
    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>>;

    /// Insert a new account without a session.
    ///
    /// Fails with `StoreError::DuplicateEmail` when the email is taken, even
    /// if a concurrent registration slipped past the caller's own check.
    async fn create(&self, account: NewAccount) -> StoreResult<Account>;

    /// Unconditionally replace the account's session (login)
    async fn set_refresh_session(&self, id: Uuid, session: RefreshSession) -> StoreResult<()>;

    /// Replace the session only if the stored digest still equals
    /// `expected_hash` and the stored session has not expired.
    ///
    /// Returns whether the swap happened. Of several concurrent calls with the
    /// same `expected_hash`, at most one returns `true`.
    async fn rotate_refresh_session(
        &self,
        id: Uuid,
        expected_hash: &str,
        next: RefreshSession,
    ) -> StoreResult<bool>;

    /// Drop the account's session, if any (logout)
    async fn clear_refresh_session(&self, id: Uuid) -> StoreResult<()>;
}
