mod app_state;
mod credential_store;
mod refresh_bus;

pub use app_state::{AppState, DebugOverride, OAuthAttempts};
pub use credential_store::{CredentialStore, CredentialStoreError, KEYRING_USER_GITHUB_ACCESS_TOKEN};
pub use refresh_bus::{RefreshBus, RefreshRequest};
