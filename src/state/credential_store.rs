use crate::credential::Credential;
use std::sync::Arc;
use thiserror::Error;
use tokio::sync::Mutex;

const KEYRING_SERVICE: &str = "com.jbw.octoblast";
pub const KEYRING_USER_GITHUB_ACCESS_TOKEN: &str = "github_access_token";

#[derive(Debug, Error)]
pub enum CredentialStoreError {
    #[error("OS keychain/secret service is unavailable")]
    Unavailable(#[source] keyring::Error),
    #[error("failed to write to the OS keychain/secret service")]
    Write(#[source] keyring::Error),
}

/// Keeps the single GitHub credential in the OS secret store, with an in-memory copy
/// so the refresh loop does not hit the keychain every cycle.
#[derive(Clone)]
pub struct CredentialStore {
    user: &'static str,
    cached: Arc<Mutex<Option<Credential>>>,
}

impl CredentialStore {
    pub fn new(user: &'static str) -> Self {
        Self {
            user,
            cached: Arc::new(Mutex::new(None)),
        }
    }

    fn entry(&self) -> Result<keyring::Entry, keyring::Error> {
        keyring::Entry::new(KEYRING_SERVICE, self.user)
    }

    pub fn is_available(&self) -> bool {
        let Ok(entry) = self.entry() else {
            return false;
        };

        match entry.get_password() {
            Ok(_) => true,
            Err(keyring::Error::NoEntry) => true,
            Err(keyring::Error::BadEncoding(_)) => true,
            Err(keyring::Error::Ambiguous(_)) => true,
            Err(keyring::Error::NoStorageAccess(_)) => false,
            Err(keyring::Error::PlatformFailure(_)) => false,
            Err(_) => false,
        }
    }

    pub async fn load(&self) -> Result<Option<Credential>, CredentialStoreError> {
        if let Some(credential) = self.cached.lock().await.clone() {
            return Ok(Some(credential));
        }

        let entry = self.entry().map_err(CredentialStoreError::Unavailable)?;

        match entry.get_password() {
            Ok(raw) => {
                let credential = Credential::decode(&raw);
                *self.cached.lock().await = credential.clone();
                Ok(credential)
            }
            Err(keyring::Error::NoEntry) => Ok(None),
            Err(e @ keyring::Error::NoStorageAccess(_)) => {
                Err(CredentialStoreError::Unavailable(e))
            }
            Err(e @ keyring::Error::PlatformFailure(_)) => {
                Err(CredentialStoreError::Unavailable(e))
            }
            Err(e) => {
                log::warn!("ignoring unreadable keychain entry: {e}");
                Ok(None)
            }
        }
    }

    pub async fn save(&self, credential: &Credential) -> Result<(), CredentialStoreError> {
        let entry = self.entry().map_err(CredentialStoreError::Unavailable)?;
        entry
            .set_password(&credential.encode())
            .map_err(CredentialStoreError::Write)?;
        *self.cached.lock().await = Some(credential.clone());
        log::info!("stored {} credential", credential.kind().label());
        Ok(())
    }

    pub async fn forget(&self) {
        if let Ok(entry) = self.entry() {
            match entry.delete_credential() {
                Ok(()) | Err(keyring::Error::NoEntry) => {}
                Err(e) => log::warn!("failed to delete keychain entry: {e}"),
            }
        }
        *self.cached.lock().await = None;
    }
}
