pub mod accounts;
pub mod config;
pub mod state;
pub mod telemetry;

pub use accounts::{Account, AccountError, AccountResult, AccountService, ValidationAction};
pub use state::AppState;
