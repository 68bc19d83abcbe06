use async_trait::async_trait;
use sqlx::{PgPool, Postgres, QueryBuilder};
use uuid::Uuid;

use super::error::AccountResult;
use super::repo_types::{Account, ColumnChanges, Lookup};

/// Storage handle behind [`AccountService`](super::services::AccountService).
/// Each call is one atomic statement against the backing store.
#[async_trait]
pub trait AccountStore: Send + Sync {
    /// Writes a new record and returns it with its assigned id.
    async fn insert(&self, account: &Account) -> AccountResult<Account>;

    async fn find(&self, lookup: Lookup) -> AccountResult<Option<Account>>;

    async fn find_all(&self, limit: i64) -> AccountResult<Vec<Account>>;

    /// Returns the number of rows changed.
    async fn update_columns(&self, lookup: Lookup, changes: ColumnChanges) -> AccountResult<u64>;

    /// Returns the number of rows removed.
    async fn delete(&self, id: Uuid) -> AccountResult<u64>;
}

const RETURNING: &str =
    "id, username, email, password, COALESCE(avatar, '') AS avatar, created_at, updated_at";

/// PostgreSQL store over the `accounts` table:
///
/// ```sql
/// CREATE TABLE accounts (
///     id UUID PRIMARY KEY DEFAULT gen_random_uuid(),
///     username VARCHAR(255) NOT NULL UNIQUE,
///     email VARCHAR(100) NOT NULL UNIQUE,
///     password VARCHAR(255) NOT NULL,
///     avatar VARCHAR(255),
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
/// ```
#[derive(Clone)]
pub struct PgAccountStore {
    db: PgPool,
}

impl PgAccountStore {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl AccountStore for PgAccountStore {
    async fn insert(&self, account: &Account) -> AccountResult<Account> {
        let row = sqlx::query_as::<_, Account>(&format!(
            r#"
            INSERT INTO accounts (username, email, password, avatar, created_at, updated_at)
            VALUES ($1, $2, $3, NULLIF($4, ''), $5, $6)
            RETURNING {RETURNING}
            "#
        ))
        .bind(&account.username)
        .bind(&account.email)
        .bind(&account.password)
        .bind(&account.avatar)
        .bind(account.created_at)
        .bind(account.updated_at)
        .fetch_one(&self.db)
        .await?;
        Ok(row)
    }

    async fn find(&self, lookup: Lookup) -> AccountResult<Option<Account>> {
        let mut qb = QueryBuilder::<Postgres>::new(format!("SELECT {RETURNING} FROM accounts"));
        push_where(&mut qb, lookup);
        let row = qb
            .build_query_as::<Account>()
            .fetch_optional(&self.db)
            .await?;
        Ok(row)
    }

    async fn find_all(&self, limit: i64) -> AccountResult<Vec<Account>> {
        let rows = sqlx::query_as::<_, Account>(&format!(
            r#"
            SELECT {RETURNING}
            FROM accounts
            ORDER BY created_at, id
            LIMIT $1
            "#
        ))
        .bind(limit)
        .fetch_all(&self.db)
        .await?;
        Ok(rows)
    }

    async fn update_columns(&self, lookup: Lookup, changes: ColumnChanges) -> AccountResult<u64> {
        let mut qb = QueryBuilder::<Postgres>::new("UPDATE accounts SET updated_at = ");
        qb.push_bind(changes.updated_at);
        if let Some(email) = changes.email {
            qb.push(", email = ").push_bind(email);
        }
        if let Some(password) = changes.password {
            qb.push(", password = ").push_bind(password);
        }
        if let Some(avatar) = changes.avatar {
            qb.push(", avatar = NULLIF(").push_bind(avatar).push(", '')");
        }
        push_where(&mut qb, lookup);
        let result = qb.build().execute(&self.db).await?;
        Ok(result.rows_affected())
    }

    async fn delete(&self, id: Uuid) -> AccountResult<u64> {
        let result = sqlx::query("DELETE FROM accounts WHERE id = $1")
            .bind(id)
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }
}

fn push_where(qb: &mut QueryBuilder<'_, Postgres>, lookup: Lookup) {
    match lookup {
        Lookup::Id(id) => qb.push(" WHERE id = ").push_bind(id),
        Lookup::Email(email) => qb.push(" WHERE email = ").push_bind(email),
    };
}
