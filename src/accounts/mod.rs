pub mod dto;
pub mod error;
pub mod memory;
pub mod password;
pub mod repo;
pub mod repo_types;
pub mod services;
pub mod validation;

pub use dto::PublicAccount;
pub use error::{AccountError, AccountResult};
pub use memory::MemoryAccountStore;
pub use password::{CredentialHasher, HashingConfig, PasswordError};
pub use repo::{AccountStore, PgAccountStore};
pub use repo_types::{Account, ColumnChanges, Lookup};
pub use services::AccountService;
pub use validation::{is_valid_email, ValidationAction, ValidationErrors};
