use std::sync::Arc;

use tracing::{error, info, instrument, warn};
use uuid::Uuid;

use super::error::{AccountError, AccountResult};
use super::password::{CredentialHasher, PasswordError};
use super::repo::AccountStore;
use super::repo_types::{Account, ColumnChanges, Lookup};
use super::validation::ValidationAction;

pub const FIND_ALL_LIMIT: i64 = 100;

/// Account operations over an injected store. Passwords are hashed before
/// any write, and every record handed back carries the public avatar URL.
#[derive(Clone)]
pub struct AccountService {
    store: Arc<dyn AccountStore>,
    hasher: CredentialHasher,
    avatar_base_url: String,
}

impl AccountService {
    pub fn new(
        store: Arc<dyn AccountStore>,
        hasher: CredentialHasher,
        avatar_base_url: impl Into<String>,
    ) -> Self {
        Self {
            store,
            hasher,
            avatar_base_url: avatar_base_url.into(),
        }
    }

    pub fn hasher(&self) -> &CredentialHasher {
        &self.hasher
    }

    fn present(&self, account: Account) -> Account {
        account.expand_avatar(&self.avatar_base_url)
    }

    /// Validates with the signup rules, sanitizes, then creates.
    #[instrument(skip(self, account))]
    pub async fn signup(&self, mut account: Account) -> AccountResult<Account> {
        account
            .validate(ValidationAction::Signup)
            .into_result()
            .map_err(|errors| {
                warn!(codes = ?errors.codes().collect::<Vec<_>>(), "signup rejected");
                AccountError::Validation(errors)
            })?;
        account.prepare();
        self.create(account).await
    }

    /// Stores a prepared account. The plaintext password is replaced by its
    /// hash before the write.
    #[instrument(skip(self, account), fields(username = %account.username))]
    pub async fn create(&self, mut account: Account) -> AccountResult<Account> {
        account.password = self.hasher.hash(&account.password).map_err(hashing_failed)?;
        let stored = self
            .store
            .insert(&account)
            .await
            .map_err(|e| report(e, "create"))?;
        info!(account_id = %stored.id, "account created");
        Ok(self.present(stored))
    }

    #[instrument(skip(self))]
    pub async fn find_all(&self) -> AccountResult<Vec<Account>> {
        let rows = self
            .store
            .find_all(FIND_ALL_LIMIT)
            .await
            .map_err(|e| report(e, "find_all"))?;
        Ok(rows.into_iter().map(|a| self.present(a)).collect())
    }

    #[instrument(skip(self))]
    pub async fn find_by_id(&self, id: Uuid) -> AccountResult<Account> {
        self.find_one(Lookup::Id(id), "find_by_id").await
    }

    #[instrument(skip(self))]
    pub async fn find_by_email(&self, email: &str) -> AccountResult<Account> {
        self.find_one(Lookup::Email(email.to_string()), "find_by_email")
            .await
    }

    async fn find_one(&self, lookup: Lookup, op: &'static str) -> AccountResult<Account> {
        match self.store.find(lookup).await {
            Ok(Some(account)) => Ok(self.present(account)),
            Ok(None) => Err(report(AccountError::NotFound, op)),
            Err(e) => Err(report(e, op)),
        }
    }

    /// Writes the email, plus the password when one is supplied, and returns
    /// the record as stored afterwards.
    #[instrument(skip(self, account))]
    pub async fn update(&self, id: Uuid, account: Account) -> AccountResult<Account> {
        let mut changes = ColumnChanges {
            email: Some(account.email),
            ..ColumnChanges::touch()
        };
        if !account.password.is_empty() {
            let hash = self.hasher.hash(&account.password).map_err(hashing_failed)?;
            changes.password = Some(hash);
        }
        self.update_by(Lookup::Id(id), changes, "update").await?;
        info!(account_id = %id, "account updated");
        self.find_by_id(id).await
    }

    #[instrument(skip(self, account))]
    pub async fn update_avatar(&self, id: Uuid, account: Account) -> AccountResult<Account> {
        let avatar = self.stored_avatar_key(account.avatar);
        let changes = ColumnChanges {
            avatar: Some(avatar),
            ..ColumnChanges::touch()
        };
        self.update_by(Lookup::Id(id), changes, "update_avatar").await?;
        info!(account_id = %id, "avatar updated");
        self.find_by_id(id).await
    }

    /// Replaces the password of the account matching `account.email`.
    #[instrument(skip(self, account))]
    pub async fn update_password(&self, account: Account) -> AccountResult<()> {
        let hash = self.hasher.hash(&account.password).map_err(hashing_failed)?;
        let changes = ColumnChanges {
            password: Some(hash),
            ..ColumnChanges::touch()
        };
        self.update_by(Lookup::Email(account.email), changes, "update_password")
            .await?;
        info!("password updated");
        Ok(())
    }

    async fn update_by(
        &self,
        lookup: Lookup,
        changes: ColumnChanges,
        op: &'static str,
    ) -> AccountResult<()> {
        let affected = self
            .store
            .update_columns(lookup, changes)
            .await
            .map_err(|e| report(e, op))?;
        if affected == 0 {
            return Err(report(AccountError::NotFound, op));
        }
        Ok(())
    }

    /// Hard delete. Returns the number of rows removed; 0 is not an error.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: Uuid) -> AccountResult<u64> {
        let removed = self
            .store
            .delete(id)
            .await
            .map_err(|e| report(e, "delete"))?;
        info!(account_id = %id, removed, "account delete");
        Ok(removed)
    }

    /// Checks an email/password pair. Unknown emails and wrong passwords
    /// both come back as `InvalidCredentials`, after the same hashing work.
    #[instrument(skip(self, password))]
    pub async fn authenticate(&self, email: &str, password: &str) -> AccountResult<Account> {
        let account = match self.store.find(Lookup::Email(email.to_string())).await {
            Ok(Some(a)) => a,
            Ok(None) => {
                self.hasher.verify_dummy(password);
                return Err(report(AccountError::InvalidCredentials, "authenticate"));
            }
            Err(e) => return Err(report(e, "authenticate")),
        };
        match self.hasher.verify(&account.password, password) {
            Ok(()) => {
                info!(account_id = %account.id, "account authenticated");
                Ok(self.present(account))
            }
            Err(PasswordError::Mismatch) => {
                Err(report(AccountError::InvalidCredentials, "authenticate"))
            }
            Err(e) => Err(hashing_failed(e)),
        }
    }

    // Records read back through the service carry the full URL; store the key.
    fn stored_avatar_key(&self, avatar: String) -> String {
        if self.avatar_base_url.is_empty() {
            return avatar;
        }
        match avatar.strip_prefix(&self.avatar_base_url) {
            Some(key) => key.to_string(),
            None => avatar,
        }
    }
}

fn hashing_failed(e: PasswordError) -> AccountError {
    error!(error = %e, "password hashing failed");
    AccountError::Hashing(e)
}

fn report(e: AccountError, op: &'static str) -> AccountError {
    match &e {
        AccountError::NotFound
        | AccountError::InvalidCredentials
        | AccountError::ConstraintViolation { .. }
        | AccountError::Validation(_) => warn!(error = %e, op, "account operation rejected"),
        AccountError::Hashing(_) | AccountError::Storage(_) => {
            error!(error = %e, op, "account operation failed")
        }
    }
    e
}
