use thiserror::Error;

use super::password::PasswordError;
use super::validation::ValidationErrors;

pub type AccountResult<T> = Result<T, AccountError>;

/// Errors returned by account operations.
#[derive(Debug, Error)]
pub enum AccountError {
    #[error("validation failed: {0}")]
    Validation(ValidationErrors),

    #[error(transparent)]
    Hashing(#[from] PasswordError),

    #[error("account not found")]
    NotFound,

    /// Duplicate username or email.
    #[error("account already exists ({constraint})")]
    ConstraintViolation { constraint: String },

    #[error("invalid credentials")]
    InvalidCredentials,

    #[error("storage error: {0}")]
    Storage(#[source] sqlx::Error),
}

impl From<sqlx::Error> for AccountError {
    fn from(e: sqlx::Error) -> Self {
        match &e {
            sqlx::Error::RowNotFound => AccountError::NotFound,
            sqlx::Error::Database(db) if db.is_unique_violation() => {
                AccountError::ConstraintViolation {
                    constraint: db.constraint().unwrap_or("unique").to_string(),
                }
            }
            _ => AccountError::Storage(e),
        }
    }
}

impl From<ValidationErrors> for AccountError {
    fn from(errors: ValidationErrors) -> Self {
        AccountError::Validation(errors)
    }
}
