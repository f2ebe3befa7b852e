// Authentication module
// IAM token lifecycle: exchange, caching and proactive refresh

mod manager;
mod refresh;
mod types;

pub use manager::CredentialManager;
pub use types::{AccessToken, Credential, APIKEY_GRANT_TYPE, SAFETY_MARGIN_SECS};
