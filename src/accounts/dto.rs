use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

use super::repo_types::Account;

/// Account as it may leave the process: no password field.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PublicAccount {
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub avatar: String,
    #[serde(with = "time::serde::rfc3339")]
    pub created_at: OffsetDateTime,
    #[serde(with = "time::serde::rfc3339")]
    pub updated_at: OffsetDateTime,
}

impl From<Account> for PublicAccount {
    fn from(a: Account) -> Self {
        Self {
            id: a.id,
            username: a.username,
            email: a.email,
            avatar: a.avatar,
            created_at: a.created_at,
            updated_at: a.updated_at,
        }
    }
}

impl Account {
    pub fn into_public(self) -> PublicAccount {
        self.into()
    }
}
