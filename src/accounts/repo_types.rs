use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use time::OffsetDateTime;
use uuid::Uuid;

/// Account record. `password` holds the plaintext on the way in and the
/// Argon2 hash once stored; strip it with [`Account::into_public`] before
/// sending a record anywhere.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, FromRow)]
#[serde(default)]
pub struct Account {
    #[serde(skip_deserializing)]
    pub id: Uuid,
    pub username: String,
    pub email: String,
    pub password: String,
    pub avatar: String, // object key; empty means no avatar
    #[serde(serialize_with = "time::serde::rfc3339::serialize", skip_deserializing)]
    pub created_at: OffsetDateTime,
    #[serde(serialize_with = "time::serde::rfc3339::serialize", skip_deserializing)]
    pub updated_at: OffsetDateTime,
}

impl Default for Account {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            username: String::new(),
            email: String::new(),
            password: String::new(),
            avatar: String::new(),
            created_at: OffsetDateTime::UNIX_EPOCH,
            updated_at: OffsetDateTime::UNIX_EPOCH,
        }
    }
}

impl Account {
    /// Trims and HTML-escapes `username` and `email`, then stamps both
    /// timestamps with the current time. Call before every write.
    pub fn prepare(&mut self) {
        self.username = sanitize(&self.username);
        self.email = sanitize(&self.email);
        let now = OffsetDateTime::now_utc();
        self.created_at = now;
        self.updated_at = now;
    }

    /// Prefixes a non-empty avatar key with the public base URL.
    pub(crate) fn expand_avatar(mut self, base_url: &str) -> Self {
        if !self.avatar.is_empty() {
            self.avatar = format!("{}{}", base_url, self.avatar);
        }
        self
    }
}

fn sanitize(field: &str) -> String {
    html_escape::encode_quoted_attribute(field.trim()).into_owned()
}

/// Row selector for store reads and column updates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Id(Uuid),
    Email(String),
}

/// Columns to overwrite. `None` leaves the column alone; `updated_at` is
/// always written.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnChanges {
    pub email: Option<String>,
    pub password: Option<String>,
    pub avatar: Option<String>,
    pub updated_at: OffsetDateTime,
}

impl ColumnChanges {
    pub fn touch() -> Self {
        Self {
            email: None,
            password: None,
            avatar: None,
            updated_at: OffsetDateTime::now_utc(),
        }
    }
}
