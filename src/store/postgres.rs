use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use super::{AccountStore, StoreError, StoreResult};
use crate::account::{Account, NewAccount, RefreshSession};

/// Postgres error code for `unique_violation`
const UNIQUE_VIOLATION: &str = "23505";

type AccountRow = (
    Uuid,
    String,
    String,
    String,
    Option<String>,
    Option<DateTime<Utc>>,
    DateTime<Utc>,
);

const SELECT_ACCOUNT: &str = r#"
    SELECT id, name, email, password_hash, refresh_token_hash, refresh_token_expires_at, created_at
    FROM accounts
"#;

/// Account store backed by the `accounts` table.
///
/// The `UNIQUE` constraint on `email` backs registration, and rotation is a
/// single conditional `UPDATE`.
#[derive(Clone)]
pub struct PgAccountStore {
    pool: PgPool,
}

impl PgAccountStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

fn into_account(row: AccountRow) -> Account {
    let (id, name, email, password_hash, token_hash, expires_at, created_at) = row;
    let refresh_session = match (token_hash, expires_at) {
        (Some(token_hash), Some(expires_at)) => Some(RefreshSession::new(token_hash, expires_at)),
        _ => None,
    };
    Account {
        id,
        name,
        email,
        password_hash,
        refresh_session,
        created_at,
    }
}

fn map_insert_error(err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some(UNIQUE_VIOLATION) {
            return StoreError::DuplicateEmail;
        }
    }
    StoreError::Database(err)
}

fn require_row(id: Uuid, rows_affected: u64) -> StoreResult<()> {
    if rows_affected == 0 {
        return Err(StoreError::NotFound(id));
    }
    Ok(())
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn find_by_id(&self, id: Uuid) -> StoreResult<Option<Account>> {
        let row = sqlx::query_as::<_, AccountRow>(&format!("{} WHERE id = $1", SELECT_ACCOUNT))
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;
        Ok(row.map(into_account))
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Account>> {
        let row =
            sqlx::query_as::<_, AccountRow>(&format!("{} WHERE email = $1", SELECT_ACCOUNT))
                .bind(email)
                .fetch_optional(&self.pool)
                .await?;
        Ok(row.map(into_account))
    }

    async fn create(&self, new: NewAccount) -> StoreResult<Account> {
        let row = sqlx::query_as::<_, AccountRow>(
            r#"
            INSERT INTO accounts (id, name, email, password_hash, created_at)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING id, name, email, password_hash, refresh_token_hash, refresh_token_expires_at, created_at
            "#,
        )
        .bind(new.id)
        .bind(&new.name)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(map_insert_error)?;

        Ok(into_account(row))
    }

    async fn set_refresh_session(&self, id: Uuid, session: RefreshSession) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET refresh_token_hash = $1, refresh_token_expires_at = $2
            WHERE id = $3
            "#,
        )
        .bind(&session.token_hash)
        .bind(session.expires_at)
        .bind(id)
        .execute(&self.pool)
        .await?;

        require_row(id, result.rows_affected())
    }

    async fn rotate_refresh_session(
        &self,
        id: Uuid,
        expected_hash: &str,
        next: RefreshSession,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET refresh_token_hash = $1, refresh_token_expires_at = $2
            WHERE id = $3
              AND refresh_token_hash = $4
              AND refresh_token_expires_at > $5
            "#,
        )
        .bind(&next.token_hash)
        .bind(next.expires_at)
        .bind(id)
        .bind(expected_hash)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() == 1)
    }

    async fn clear_refresh_session(&self, id: Uuid) -> StoreResult<()> {
        let result = sqlx::query(
            r#"
            UPDATE accounts
            SET refresh_token_hash = NULL, refresh_token_expires_at = NULL
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        require_row(id, result.rows_affected())
    }
}
