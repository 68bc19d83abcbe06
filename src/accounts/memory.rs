use async_trait::async_trait;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::error::{AccountError, AccountResult};
use super::repo::AccountStore;
use super::repo_types::{Account, ColumnChanges, Lookup};

/// In-process store with the same uniqueness rules as the `accounts` table.
/// Records are kept in insertion order.
#[derive(Default)]
pub struct MemoryAccountStore {
    rows: RwLock<Vec<Account>>,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn selects(row: &Account, lookup: &Lookup) -> bool {
    match lookup {
        Lookup::Id(id) => row.id == *id,
        Lookup::Email(email) => row.email == *email,
    }
}

fn duplicate(constraint: &str) -> AccountError {
    AccountError::ConstraintViolation {
        constraint: constraint.to_string(),
    }
}

#[async_trait]
impl AccountStore for MemoryAccountStore {
    async fn insert(&self, account: &Account) -> AccountResult<Account> {
        let mut rows = self.rows.write().await;
        if rows.iter().any(|r| r.username == account.username) {
            return Err(duplicate("accounts_username_key"));
        }
        if rows.iter().any(|r| r.email == account.email) {
            return Err(duplicate("accounts_email_key"));
        }
        let stored = Account {
            id: Uuid::new_v4(),
            ..account.clone()
        };
        rows.push(stored.clone());
        Ok(stored)
    }

    async fn find(&self, lookup: Lookup) -> AccountResult<Option<Account>> {
        let rows = self.rows.read().await;
        Ok(rows.iter().find(|r| selects(r, &lookup)).cloned())
    }

    async fn find_all(&self, limit: i64) -> AccountResult<Vec<Account>> {
        let rows = self.rows.read().await;
        let limit = usize::try_from(limit).unwrap_or(0);
        Ok(rows.iter().take(limit).cloned().collect())
    }

    async fn update_columns(&self, lookup: Lookup, changes: ColumnChanges) -> AccountResult<u64> {
        let mut rows = self.rows.write().await;
        let Some(idx) = rows.iter().position(|r| selects(r, &lookup)) else {
            return Ok(0);
        };
        if let Some(email) = &changes.email {
            let taken = rows
                .iter()
                .enumerate()
                .any(|(i, r)| i != idx && r.email == *email);
            if taken {
                return Err(duplicate("accounts_email_key"));
            }
        }
        let row = &mut rows[idx];
        if let Some(email) = changes.email {
            row.email = email;
        }
        if let Some(password) = changes.password {
            row.password = password;
        }
        if let Some(avatar) = changes.avatar {
            row.avatar = avatar;
        }
        row.updated_at = changes.updated_at;
        Ok(1)
    }

    async fn delete(&self, id: Uuid) -> AccountResult<u64> {
        let mut rows = self.rows.write().await;
        let before = rows.len();
        rows.retain(|r| r.id != id);
        Ok((before - rows.len()) as u64)
    }
}
