use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use dashmap::mapref::entry::Entry;
use dashmap::DashMap;
use uuid::Uuid;

use super::{AccountStore, StoreError, StoreResult};
use crate::account::{Account, NewAccount, RefreshSession};

/// Process-local account store.
///
/// The email index entry is held while the account is inserted, which makes
/// email uniqueness atomic. Session writes happen under the account's shard
/// lock, which makes rotation atomic.
#[derive(Default, Clone)]
pub struct InMemoryAccountStore {
    accounts: Arc<DashMap<Uuid, Account>>,
    by_email: Arc<DashMap<String, Uuid>>,
}

impl InMemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.accounts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.accounts.is_empty()
    }
}

#[async_trait]
impl AccountStore for InMemoryAccountStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        Ok(self.accounts.get(&id).map(|r| r.value().clone()))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let id = match self.by_email.get(email) {
            Some(id) => *id.value(),
            None => return Ok(None),
        };
        Ok(self.accounts.get(&id).map(|r| r.value().clone()))
    }

    async fn create(&self, new: NewAccount) -> StoreResult<Account> {
        match self.by_email.entry(new.email.clone()) {
            Entry::Occupied(_) => Err(StoreError::DuplicateEmail),
            Entry::Vacant(slot) => {
                let account = Account {
                    id: new.id,
                    name: new.name,
                    email: new.email,
                    password_hash: new.password_hash,
                    refresh_session: None,
                    created_at: Utc::now(),
                };
                self.accounts.insert(account.id, account.clone());
                slot.insert(account.id);
                Ok(account)
            }
        }
    }

    async fn set_refresh_session(&self, id: Uuid, session: RefreshSession) -> StoreResult<()> {
        let mut account = self.accounts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        account.refresh_session = Some(session);
        Ok(())
    }

    async fn rotate_refresh_session(
        &self,
        id: Uuid,
        expected_hash: &str,
        next: RefreshSession,
    ) -> StoreResult<bool> {
        let mut account = match self.accounts.get_mut(&id) {
            Some(account) => account,
            None => return Ok(false),
        };

        let current_is_expected = account
            .refresh_session
            .as_ref()
            .is_some_and(|s| s.matches(expected_hash) && s.is_live_at(Utc::now()));

        if current_is_expected {
            account.refresh_session = Some(next);
        }
        Ok(current_is_expected)
    }

    async fn clear_refresh_session(&self, id: Uuid) -> StoreResult<()> {
        let mut account = self.accounts.get_mut(&id).ok_or(StoreError::NotFound(id))?;
        account.refresh_session = None;
        Ok(())
    }
}
