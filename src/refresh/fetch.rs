use crate::state::{AppState, CredentialStoreError};
use crate::types::NotificationsSnapshot;
use tauri::Runtime;

fn now_iso() -> String {
    time::OffsetDateTime::now_utc()
        .format(&time::format_description::well_known::Rfc3339)
        .unwrap_or_else(|_| "1970-01-01T00:00:00Z".to_string())
}

pub(crate) fn missing_token_snapshot() -> NotificationsSnapshot {
    NotificationsSnapshot::MissingToken {
        last_updated_at: now_iso(),
        error_message: Some("Not signed in to GitHub.".to_string()),
    }
}

pub(crate) struct FetchSnapshot {
    pub(crate) snapshot: NotificationsSnapshot,
    pub(crate) keyring_error: bool,
}

pub(crate) async fn fetch_notifications<R: Runtime>(state: &AppState<R>) -> FetchSnapshot {
    let credential = match state.credential.load().await {
        Ok(Some(credential)) => credential,
        Ok(None) => {
            return FetchSnapshot {
                snapshot: missing_token_snapshot(),
                keyring_error: false,
            };
        }
        Err(CredentialStoreError::Unavailable(e) | CredentialStoreError::Write(e)) => {
            log::warn!("cannot read credential: {e}");
            return FetchSnapshot {
                snapshot: NotificationsSnapshot::MissingToken {
                    last_updated_at: now_iso(),
                    error_message: Some("OS keychain/secret service is unavailable.".to_string()),
                },
                keyring_error: true,
            };
        }
    };

    FetchSnapshot {
        snapshot: state
            .github
            .fetch_notifications_snapshot(credential.token())
            .await,
        keyring_error: false,
    }
}
